//! Writing length-delimited binary frames.

use async_trait::async_trait;
use bytes::BytesMut;
use prost::Message;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use tracklog_core::position::POSITION_PROPERTY;
use tracklog_core::{Error, FrameSink, Header, Object, ObjectPosition, Result, TimeFrame};

use crate::wire;

/// Writer for the binary encoding. The header's initial time frame is
/// written as the first frame on the wire.
pub struct BinaryWriter<W> {
    inner: BufWriter<W>,
}

impl<W: AsyncWrite + Unpin + Send> BinaryWriter<W> {
    pub async fn create(writer: W, header: &Header) -> Result<Self> {
        let mut out = Self {
            inner: BufWriter::new(writer),
        };
        out.write_frame(&header.initial_time_frame).await?;
        out.inner.flush().await?;
        Ok(out)
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> FrameSink for BinaryWriter<W> {
    async fn write_frame(&mut self, frame: &TimeFrame) -> Result<()> {
        let wire_frame = frame_to_wire(frame)?;
        let mut buffer = BytesMut::with_capacity(wire_frame.encoded_len() + 10);
        wire_frame
            .encode_length_delimited(&mut buffer)
            .map_err(|e| Error::FrameParse(format!("failed to encode time frame: {e}")))?;
        self.inner.write_all(&buffer).await?;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.inner.flush().await?;
        self.inner.shutdown().await?;
        Ok(())
    }
}

/// Bridge a model frame onto the wire. A `T` property is parsed back into
/// the structured position record; everything else stays a string pair.
pub(crate) fn frame_to_wire(frame: &TimeFrame) -> Result<wire::TimeFrame> {
    let mut objects = Vec::with_capacity(frame.objects.len());
    for object in &frame.objects {
        objects.push(object_to_wire(object)?);
    }
    Ok(wire::TimeFrame {
        offset: frame.offset,
        objects,
    })
}

fn object_to_wire(object: &Object) -> Result<wire::Object> {
    let mut out = wire::Object {
        id: object.id as u32,
        delete: object.deleted,
        position: None,
        properties: Vec::new(),
    };
    for property in &object.properties {
        if property.key == POSITION_PROPERTY {
            out.position = Some(position_to_wire(ObjectPosition::parse(&property.value)?));
            continue;
        }
        out.properties.push(wire::Property {
            key: property.key.clone(),
            value: property.value.clone(),
        });
    }
    Ok(out)
}

fn position_to_wire(position: ObjectPosition) -> wire::Position {
    wire::Position {
        longitude: position.longitude,
        latitude: position.latitude,
        altitude: position.altitude,
        u: position.u,
        v: position.v,
        roll: position.roll,
        pitch: position.pitch,
        yaw: position.yaw,
        heading: position.heading,
    }
}
