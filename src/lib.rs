//! MIDI Letters - type text by playing a MIDI keyboard
//!
//! Every Note On is spelled (C, C#, Db, ...) according to the configured
//! enharmonic mode, looked up in the mapping table and injected as a
//! keystroke. The configuration file is hot-reloaded while playing.

pub mod config;
pub mod injector;
pub mod input;
pub mod mapping;
pub mod midi;
pub mod paths;
pub mod pipeline;
pub mod spelling;

pub use config::{AppConfig, TapMode};
pub use pipeline::Pipeline;
pub use spelling::{NoteName, Resolver, SpellingPolicy};
