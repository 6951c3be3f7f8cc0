//! The binary ACMI encoding.
//!
//! Each time frame is one protobuf message prefixed by a base-128 varint
//! giving the payload length. The message mirrors the text model, except
//! that an object's `T` (position) property travels as a structured
//! record; reading materializes it back into a synthetic `T` property so
//! both encodings feed the same pipeline.

pub mod reader;
pub mod wire;
pub mod writer;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;
