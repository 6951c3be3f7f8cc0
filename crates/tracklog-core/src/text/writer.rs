//! Emission of the ACMI text format.

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use crate::error::Result;
use crate::frame::{RawTimeFrame, TimeFrame};
use crate::header::Header;
use crate::object::Object;
use crate::property::escape_value;
use crate::traits::{FrameSink, RawFrameSink};

const BOM: [u8; 3] = [0xef, 0xbb, 0xbf];

/// Writer for parsed time frames. The header (BOM, `FileType`,
/// `FileVersion` and the initial frame's object lines) is written at
/// construction.
pub struct TextWriter<W> {
    inner: BufWriter<W>,
}

impl<W: AsyncWrite + Unpin + Send> TextWriter<W> {
    pub async fn create(writer: W, header: &Header) -> Result<Self> {
        let mut out = Self {
            inner: BufWriter::new(writer),
        };
        out.inner.write_all(&BOM).await?;
        out.inner
            .write_all(format_header(header).as_bytes())
            .await?;
        out.inner.flush().await?;
        Ok(out)
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> FrameSink for TextWriter<W> {
    async fn write_frame(&mut self, frame: &TimeFrame) -> Result<()> {
        let mut text = format!("#{:.6}\n", frame.offset);
        for object in &frame.objects {
            format_object(&mut text, object);
        }
        self.inner.write_all(text.as_bytes()).await?;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.inner.flush().await?;
        self.inner.shutdown().await?;
        Ok(())
    }
}

/// Writer that copies raw frames through untouched apart from the
/// rewritten offset line.
pub struct RawTextWriter<W> {
    inner: BufWriter<W>,
}

impl<W: AsyncWrite + Unpin + Send> RawTextWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: BufWriter::new(writer),
        }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> RawFrameSink for RawTextWriter<W> {
    async fn write_header(&mut self, header: &Header) -> Result<()> {
        self.inner.write_all(&BOM).await?;
        self.inner
            .write_all(format_header(header).as_bytes())
            .await?;
        self.inner.flush().await?;
        Ok(())
    }

    async fn write_raw_frame(&mut self, frame: &RawTimeFrame) -> Result<()> {
        self.inner
            .write_all(format!("#{:.6}\n", frame.offset).as_bytes())
            .await?;
        for line in &frame.lines {
            self.inner.write_all(line).await?;
            self.inner.write_all(b"\n").await?;
        }
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.inner.flush().await?;
        self.inner.shutdown().await?;
        Ok(())
    }
}

fn format_header(header: &Header) -> String {
    let mut text = format!(
        "FileType={}\nFileVersion={}\n",
        header.file_type, header.file_version
    );
    // The initial frame is written inline, without an offset line.
    for object in &header.initial_time_frame.objects {
        format_object(&mut text, object);
    }
    text
}

fn format_object(buffer: &mut String, object: &Object) {
    if object.deleted {
        buffer.push_str(&format!("-{:x}\n", object.id));
        return;
    }
    buffer.push_str(&format!("{:x}", object.id));
    if object.properties.is_empty() {
        buffer.push_str(",\n");
        return;
    }
    for property in &object.properties {
        buffer.push(',');
        buffer.push_str(&property.key);
        buffer.push('=');
        buffer.push_str(&escape_value(&property.value));
    }
    buffer.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::Property;

    #[test]
    fn test_format_object_with_properties() {
        let mut object = Object::new(0xa1b2);
        object.set("Pilot", "Alpha");
        object.set("Type", "Air+FixedWing");
        let mut text = String::new();
        format_object(&mut text, &object);
        assert_eq!(text, "a1b2,Pilot=Alpha,Type=Air+FixedWing\n");
    }

    #[test]
    fn test_format_object_escapes_value() {
        let mut object = Object::new(1);
        object.set("Name", "foo,bar\nbaz");
        let mut text = String::new();
        format_object(&mut text, &object);
        assert_eq!(text, "1,Name=foo\\,bar\\\nbaz\n");
    }

    #[test]
    fn test_format_deleted_object() {
        let mut text = String::new();
        format_object(&mut text, &Object::deletion(0xff));
        assert_eq!(text, "-ff\n");
    }

    #[test]
    fn test_format_object_without_properties() {
        let mut text = String::new();
        format_object(&mut text, &Object::new(7));
        assert_eq!(text, "7,\n");
    }

    #[tokio::test]
    async fn test_writer_emits_bom_and_header() {
        let mut frame = TimeFrame::new(0.0);
        let mut global = Object::new(0);
        global.properties.push(Property::new(
            "ReferenceTime",
            "2023-01-01T00:00:00Z",
        ));
        frame.objects.push(global);
        let header =
            Header::from_initial_frame("text/acmi/tacview".into(), "2.2".into(), frame).unwrap();

        let mut sink = Vec::new();
        let mut writer = TextWriter::create(&mut sink, &header).await.unwrap();
        let mut delta = TimeFrame::new(1.0);
        delta.objects.push(Object::deletion(0xa1));
        writer.write_frame(&delta).await.unwrap();
        writer.shutdown().await.unwrap();
        drop(writer);

        let expected = "\u{feff}FileType=text/acmi/tacview\nFileVersion=2.2\n\
                        0,ReferenceTime=2023-01-01T00:00:00Z\n#1.000000\n-a1\n";
        assert_eq!(String::from_utf8(sink).unwrap(), expected);
    }
}
