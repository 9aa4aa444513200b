//! # air_guitar
//!
//! Play guitar in the air. Hand landmarks from a detector drive the
//! [`gesture_core`] pipeline; accepted strums become chords on a MIDI port
//! and, optionally, a recorded Standard MIDI file.
//!
//! ## Gesture → sound
//!
//! | Gesture | Hand | Sound |
//! |---|---|---|
//! | Wrist flick down | Strumming | Chord strummed low E → high E |
//! | Wrist flick up | Strumming | Chord strummed high E → low E |
//! | Faster flick | Strumming | Louder |
//! | Index / middle / ring on thumb | Fretting | C / G / D major shape |
//! | Hands closer together | Both | Shape moves up the neck |
//!
//! ## Frame sources
//!
//! * `sim` (default) — synthetic hands, no camera or hardware needed.
//! * `replay` — a JSON-lines detector log (`DetectedFrame` per line, or
//!   `{"error": "..."}` for a failed frame).
//! * `leap` — a LeapMotion controller; build with `--features leap`.
//!
//! ## Logging
//!
//! Set `RUST_LOG` (default `info`); `RUST_LOG=debug` shows every strum and
//! suppressed signal.

pub mod app;
pub mod player;
pub mod source;
