//! ACMI flight-recording data model, text codec and frame pipeline.
//!
//! An ACMI recording is a time-indexed log of battlefield objects and
//! their evolving properties. The text format is line oriented: a header,
//! an initial time frame, then `#offset`-prefixed delta frames. This crate
//! holds the in-memory model, the streaming text parser and writer, the
//! parallel frame-parsing pipeline, and the trim / search / normalize
//! operations. The binary encoding and the realtime client live in their
//! sibling crates and plug into the same [`traits`].

pub mod error;
pub mod frame;
pub mod header;
pub mod object;
pub mod ops;
pub mod position;
pub mod property;
pub mod text;
pub mod traits;

pub use error::{Error, Result};
pub use frame::{RawTimeFrame, TimeFrame};
pub use header::Header;
pub use object::Object;
pub use position::ObjectPosition;
pub use property::Property;
pub use traits::{FrameSink, FrameSource, RawFrameSink, RawFrameSource};
