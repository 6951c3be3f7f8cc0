//! Protobuf message definitions for the binary encoding.
//!
//! Messages are derived directly so the build needs no protoc; the field
//! tags below are the wire contract and must not be renumbered.

#[derive(Clone, PartialEq, prost::Message)]
pub struct TimeFrame {
    #[prost(double, tag = "1")]
    pub offset: f64,
    #[prost(message, repeated, tag = "2")]
    pub objects: Vec<Object>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Object {
    #[prost(uint32, tag = "1")]
    pub id: u32,
    #[prost(bool, tag = "2")]
    pub delete: bool,
    #[prost(message, optional, tag = "3")]
    pub position: Option<Position>,
    #[prost(message, repeated, tag = "4")]
    pub properties: Vec<Property>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Position {
    #[prost(double, tag = "1")]
    pub longitude: f64,
    #[prost(double, tag = "2")]
    pub latitude: f64,
    #[prost(double, tag = "3")]
    pub altitude: f64,
    #[prost(double, tag = "4")]
    pub u: f64,
    #[prost(double, tag = "5")]
    pub v: f64,
    #[prost(double, tag = "6")]
    pub roll: f64,
    #[prost(double, tag = "7")]
    pub pitch: f64,
    #[prost(double, tag = "8")]
    pub yaw: f64,
    #[prost(float, tag = "9")]
    pub heading: f32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Property {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(string, tag = "2")]
    pub value: String,
}
