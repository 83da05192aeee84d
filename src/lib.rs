pub mod config;
pub mod error;
pub mod merge;
pub mod output;
pub mod segment;
pub mod subtitle;
pub mod transcribe;

pub use error::{Error, Result};
pub use merge::{MergeMode, merge};
pub use segment::{AlternativeTranscript, CueCounter, Segmenter, TimedWord};
pub use subtitle::{SubtitleCue, compose, parse, sanitize};
