//! Parse → emit → parse round trips over the text encoding.

use tokio::sync::mpsc;

use tracklog_core::header::format_reference_time;
use tracklog_core::text::{TextReader, TextWriter};
use tracklog_core::{FrameSink, FrameSource, Header, Result, TimeFrame};

const SAMPLE: &str = "\u{feff}FileType=text/acmi/tacview\nFileVersion=2.2\n\
    0,ReferenceTime=2023-01-01T00:00:00Z,Title=Test Flight\n\
    a1b2,Type=Air+FixedWing,Pilot=Alpha,T=41.609150|41.602094|2000.500000\n\
    #1.000000\n\
    a1b2,T=41.610000|41.603000|2001.000000|10.000000|20.000000\n\
    #2.000000\n\
    a1b2,Pilot=Bravo\n\
    c3,Name=foo\\,bar\\\nbaz\n\
    #3.000000\n\
    -c3\n";

async fn read_all(data: &[u8], concurrency: usize) -> Result<(Header, Vec<TimeFrame>)> {
    let mut reader = TextReader::open(data).await?;
    let header = reader.header().clone();
    let (tx, mut rx) = mpsc::channel(16);
    let consumer = async {
        let mut frames = Vec::new();
        while let Some(frame) = rx.recv().await {
            frames.push(frame);
        }
        frames
    };
    let (result, mut frames) = tokio::join!(reader.process_frames(concurrency, tx), consumer);
    result?;
    frames.sort_by(|a, b| a.offset.total_cmp(&b.offset));
    Ok((header, frames))
}

async fn write_all(header: &Header, frames: &[TimeFrame]) -> Vec<u8> {
    let mut sink = Vec::new();
    let mut writer = TextWriter::create(&mut sink, header).await.unwrap();
    for frame in frames {
        writer.write_frame(frame).await.unwrap();
    }
    writer.shutdown().await.unwrap();
    drop(writer);
    sink
}

// ---------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------

#[tokio::test]
async fn test_parse_sample() {
    let (header, frames) = read_all(SAMPLE.as_bytes(), 1).await.unwrap();

    assert_eq!(header.file_type, "text/acmi/tacview");
    assert_eq!(
        format_reference_time(header.reference_time),
        "2023-01-01T00:00:00Z"
    );
    assert_eq!(header.initial_time_frame.objects.len(), 2);

    assert_eq!(frames.len(), 3);

    // A later frame carries only the delta, not the merged state.
    let update = frames[1].get(0xa1b2).unwrap();
    assert_eq!(update.properties.len(), 1);
    assert_eq!(update.get("Pilot").unwrap().value, "Bravo");

    // Escaped comma and newline survive into the value.
    let name = frames[1].get(0xc3).unwrap().get("Name").unwrap();
    assert_eq!(name.value, "foo,bar\nbaz");

    assert!(frames[2].get(0xc3).unwrap().deleted);
}

#[tokio::test]
async fn test_minimal_file_has_empty_frame_stream() {
    let data = "FileType=text/acmi/tacview\nFileVersion=2.2\n\
                0,ReferenceTime=2023-01-01T00:00:00Z\n";
    let (header, frames) = read_all(data.as_bytes(), 1).await.unwrap();
    assert_eq!(format_reference_time(header.reference_time), "2023-01-01T00:00:00Z");
    assert!(frames.is_empty());
}

// ---------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------

#[tokio::test]
async fn test_emit_parse_roundtrip() {
    let (header, frames) = read_all(SAMPLE.as_bytes(), 1).await.unwrap();
    let emitted = write_all(&header, &frames).await;
    let (header2, frames2) = read_all(&emitted, 1).await.unwrap();

    assert_eq!(header2, header);
    assert_eq!(frames2, frames);
}

#[tokio::test]
async fn test_second_emit_is_stable() {
    let (header, frames) = read_all(SAMPLE.as_bytes(), 1).await.unwrap();
    let first = write_all(&header, &frames).await;
    let (header2, frames2) = read_all(&first, 1).await.unwrap();
    let second = write_all(&header2, &frames2).await;
    assert_eq!(first, second);
}

// ---------------------------------------------------------------
// Parallel determinism
// ---------------------------------------------------------------

#[tokio::test]
async fn test_parallel_parse_matches_sequential() {
    let mut data = String::from(
        "FileType=text/acmi/tacview\nFileVersion=2.2\n0,ReferenceTime=2023-01-01T00:00:00Z\n",
    );
    for i in 1..300u32 {
        data.push_str(&format!(
            "#{i}.000000\n{i:x},Pilot=P{i},T={}.000000|{}.000000|1000.000000\n",
            i % 90,
            i % 45
        ));
    }

    let (_, sequential) = read_all(data.as_bytes(), 1).await.unwrap();
    let (_, parallel) = read_all(data.as_bytes(), 8).await.unwrap();
    assert_eq!(sequential.len(), 299);
    assert_eq!(parallel, sequential);
}
