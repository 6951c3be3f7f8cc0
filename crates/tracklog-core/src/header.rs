//! The ACMI file header.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{Error, Result};
use crate::frame::TimeFrame;

pub const ACMI_FILE_TYPE: &str = "text/acmi/tacview";
pub const ACMI_FILE_VERSION: &str = "2.2";

/// Id of the global object carrying file-level metadata.
pub const GLOBAL_OBJECT_ID: u64 = 0;

/// Property of the global object holding the UTC wall-clock anchor.
pub const REFERENCE_TIME_PROPERTY: &str = "ReferenceTime";

const REFERENCE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// File-level metadata plus the initial time frame embedded in the header
/// region. Shared read-only once parsing starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub file_type: String,
    pub file_version: String,
    pub reference_time: DateTime<Utc>,
    pub initial_time_frame: TimeFrame,
}

impl Header {
    /// Build a header from an initial frame, validating that the global
    /// object exists and carries a parsable `ReferenceTime`.
    pub fn from_initial_frame(
        file_type: String,
        file_version: String,
        initial_time_frame: TimeFrame,
    ) -> Result<Self> {
        let global = initial_time_frame.get(GLOBAL_OBJECT_ID).ok_or_else(|| {
            Error::HeaderParse("no global object found in initial time frame".into())
        })?;
        let reference = global.get(REFERENCE_TIME_PROPERTY).ok_or_else(|| {
            Error::HeaderParse("global object is missing ReferenceTime".into())
        })?;
        let reference_time = parse_reference_time(&reference.value)?;

        Ok(Self {
            file_type,
            file_version,
            reference_time,
            initial_time_frame,
        })
    }
}

/// Parse a `YYYY-MM-DDTHH:MM:SSZ` timestamp.
pub fn parse_reference_time(value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, REFERENCE_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| Error::HeaderParse(format!("failed to parse ReferenceTime: `{value}`")))
}

/// Format a timestamp the way `ReferenceTime` is written on the wire.
pub fn format_reference_time(time: DateTime<Utc>) -> String {
    time.format(REFERENCE_TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Object;

    fn initial_frame_with(reference_time: Option<&str>) -> TimeFrame {
        let mut frame = TimeFrame::new(0.0);
        let mut global = Object::new(GLOBAL_OBJECT_ID);
        if let Some(value) = reference_time {
            global.set(REFERENCE_TIME_PROPERTY, value);
        }
        frame.objects.push(global);
        frame
    }

    #[test]
    fn test_reference_time_roundtrip() {
        let parsed = parse_reference_time("2023-01-01T00:00:30Z").unwrap();
        assert_eq!(format_reference_time(parsed), "2023-01-01T00:00:30Z");
    }

    #[test]
    fn test_reference_time_rejects_offset_format() {
        assert!(parse_reference_time("2023-01-01T00:00:30+02:00").is_err());
        assert!(parse_reference_time("not-a-date").is_err());
    }

    #[test]
    fn test_from_initial_frame() {
        let header = Header::from_initial_frame(
            ACMI_FILE_TYPE.into(),
            ACMI_FILE_VERSION.into(),
            initial_frame_with(Some("2023-01-01T00:00:00Z")),
        )
        .unwrap();
        assert_eq!(
            format_reference_time(header.reference_time),
            "2023-01-01T00:00:00Z"
        );
    }

    #[test]
    fn test_from_initial_frame_requires_global_object() {
        let frame = TimeFrame::new(0.0);
        assert!(matches!(
            Header::from_initial_frame(ACMI_FILE_TYPE.into(), ACMI_FILE_VERSION.into(), frame),
            Err(Error::HeaderParse(_))
        ));
    }

    #[test]
    fn test_from_initial_frame_requires_reference_time() {
        assert!(Header::from_initial_frame(
            ACMI_FILE_TYPE.into(),
            ACMI_FILE_VERSION.into(),
            initial_frame_with(None),
        )
        .is_err());
    }
}
