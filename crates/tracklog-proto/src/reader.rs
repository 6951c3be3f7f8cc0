//! Reading length-delimited binary frames.

use async_trait::async_trait;
use prost::Message;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::mpsc;

use tracklog_core::header::{ACMI_FILE_TYPE, ACMI_FILE_VERSION};
use tracklog_core::position::POSITION_PROPERTY;
use tracklog_core::{Error, FrameSource, Header, Object, ObjectPosition, Result, TimeFrame};

use crate::wire;

/// Upper bound on a single frame payload; anything larger is a corrupt
/// length prefix.
const MAX_FRAME_LEN: u64 = 64 * 1024 * 1024;

/// Reader for a binary ACMI byte stream.
///
/// The first frame on the wire is the initial time frame; it must carry
/// the global object and its `ReferenceTime`. The wire format has no
/// `FileType`/`FileVersion`, so the header gets the standard constants.
pub struct BinaryReader<R> {
    inner: BufReader<R>,
    header: Header,
}

impl<R: AsyncRead + Unpin + Send> BinaryReader<R> {
    pub async fn open(reader: R) -> Result<Self> {
        let mut inner = BufReader::new(reader);
        let initial = match read_wire_frame(&mut inner).await? {
            Some(frame) => frame_from_wire(frame),
            None => {
                return Err(Error::HeaderParse(
                    "binary stream ends before the initial time frame".into(),
                ));
            }
        };
        let header = Header::from_initial_frame(
            ACMI_FILE_TYPE.to_string(),
            ACMI_FILE_VERSION.to_string(),
            initial,
        )?;
        Ok(Self { inner, header })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> FrameSource for BinaryReader<R> {
    fn header(&self) -> &Header {
        &self.header
    }

    /// Binary frames decode in one step, so this source is sequential and
    /// ignores `concurrency`; output is always in input order.
    async fn process_frames(
        &mut self,
        _concurrency: usize,
        out: mpsc::Sender<TimeFrame>,
    ) -> Result<()> {
        while let Some(frame) = read_wire_frame(&mut self.inner).await? {
            if out.send(frame_from_wire(frame)).await.is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Read one length-delimited frame. `None` at a clean end of stream; EOF
/// inside the length prefix or the payload is an error.
async fn read_wire_frame<R>(reader: &mut BufReader<R>) -> Result<Option<wire::TimeFrame>>
where
    R: AsyncRead + Unpin,
{
    let Some(length) = read_length_prefix(reader).await? else {
        return Ok(None);
    };
    if length > MAX_FRAME_LEN {
        return Err(Error::FrameParse(format!(
            "frame length {length} exceeds maximum {MAX_FRAME_LEN}"
        )));
    }

    let mut payload = vec![0u8; length as usize];
    reader.read_exact(&mut payload).await?;

    wire::TimeFrame::decode(payload.as_slice())
        .map(Some)
        .map_err(|e| Error::FrameParse(format!("failed to decode time frame: {e}")))
}

async fn read_length_prefix<R>(reader: &mut BufReader<R>) -> Result<Option<u64>>
where
    R: AsyncRead + Unpin,
{
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = match reader.read_u8().await {
            Ok(byte) => byte,
            // EOF before the first prefix byte is the end of the stream.
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof && shift == 0 => {
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(Some(value));
        }
        shift += 7;
        if shift >= 64 {
            return Err(Error::FrameParse("frame length varint too large".into()));
        }
    }
}

/// Bridge a wire frame into the common model. A present position record
/// becomes a synthetic `T` property holding its canonical text emission.
pub(crate) fn frame_from_wire(frame: wire::TimeFrame) -> TimeFrame {
    let mut out = TimeFrame::new(frame.offset);
    for object in frame.objects {
        let mut model = Object::new(u64::from(object.id));
        model.deleted = object.delete;
        for property in object.properties {
            model.set(&property.key, &property.value);
        }
        if let Some(position) = object.position {
            model.set(POSITION_PROPERTY, &position_from_wire(position).emit());
        }
        out.objects.push(model);
    }
    out
}

fn position_from_wire(position: wire::Position) -> ObjectPosition {
    ObjectPosition {
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
