//! The `|`-delimited object position codec.
//!
//! A position string carries one of four arities:
//!
//! | fields | meaning |
//! |---|---|
//! | 3 | lon, lat, alt |
//! | 5 | lon, lat, alt, u, v |
//! | 6 | lon, lat, alt, roll, pitch, yaw |
//! | 9 | lon, lat, alt, roll, pitch, yaw, u, v, heading |
//!
//! An empty field parses to zero ("unchanged from the last known value").
//! Emission picks the smallest arity that encodes every non-zero field;
//! a non-zero heading can only be carried by arity 9.

use crate::error::{Error, Result};

/// Key of the synthetic property that carries an object's position.
pub const POSITION_PROPERTY: &str = "T";

/// An object position decoded from a `T` property value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ObjectPosition {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
    pub u: f64,
    pub v: f64,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub heading: f32,
}

impl ObjectPosition {
    /// Parse a position string. Arities other than 3, 5, 6 or 9 are rejected.
    pub fn parse(data: &str) -> Result<Self> {
        let parts: Vec<&str> = data.split('|').collect();
        let mut position = Self::default();

        match parts.len() {
            3 => {}
            5 => {
                position.u = parse_field(parts[3])?;
                position.v = parse_field(parts[4])?;
            }
            6 => {
                position.roll = parse_field(parts[3])?;
                position.pitch = parse_field(parts[4])?;
                position.yaw = parse_field(parts[5])?;
            }
            9 => {
                position.roll = parse_field(parts[3])?;
                position.pitch = parse_field(parts[4])?;
                position.yaw = parse_field(parts[5])?;
                position.u = parse_field(parts[6])?;
                position.v = parse_field(parts[7])?;
                position.heading = parse_field(parts[8])? as f32;
            }
            n => {
                return Err(Error::FrameParse(format!(
                    "invalid position arity {n}: `{data}`"
                )));
            }
        }

        position.longitude = parse_field(parts[0])?;
        position.latitude = parse_field(parts[1])?;
        position.altitude = parse_field(parts[2])?;

        Ok(position)
    }

    /// Emit the position using the smallest arity that holds every
    /// non-zero field.
    pub fn emit(&self) -> String {
        let angles_zero = self.roll == 0.0 && self.pitch == 0.0 && self.yaw == 0.0;
        let screen_zero = self.u == 0.0 && self.v == 0.0;
        let heading_zero = self.heading == 0.0;

        if angles_zero && screen_zero && heading_zero {
            format!(
                "{:.6}|{:.6}|{:.6}",
                self.longitude, self.latitude, self.altitude
            )
        } else if angles_zero && heading_zero {
            format!(
                "{:.6}|{:.6}|{:.6}|{:.6}|{:.6}",
                self.longitude, self.latitude, self.altitude, self.u, self.v
            )
        } else if screen_zero && heading_zero {
            format!(
                "{:.6}|{:.6}|{:.6}|{:.6}|{:.6}|{:.6}",
                self.longitude, self.latitude, self.altitude, self.roll, self.pitch, self.yaw
            )
        } else {
            format!(
                "{:.6}|{:.6}|{:.6}|{:.6}|{:.6}|{:.6}|{:.6}|{:.6}|{:.6}",
                self.longitude,
                self.latitude,
                self.altitude,
                self.roll,
                self.pitch,
                self.yaw,
                self.u,
                self.v,
                self.heading
            )
        }
    }
}

fn parse_field(field: &str) -> Result<f64> {
    if field.is_empty() {
        return Ok(0.0);
    }
    field
        .parse()
        .map_err(|_| Error::FrameParse(format!("invalid position field `{field}`")))
}
