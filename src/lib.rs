//! Compiling plain-text note sketches into multi-track MIDI files,
//! with automatic scale and mood detection.

pub mod channel;
pub mod midi;
pub mod note;
pub mod report;
pub mod rhythm;
pub mod scale;
pub mod song;
pub mod track;

// Utility modules
pub mod rational;
