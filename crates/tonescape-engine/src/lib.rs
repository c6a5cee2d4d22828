//! Audio-reactive scene engine for tonescape
//!
//! Turns a spectrum of the playing track into per-frame updates of one of
//! several visualization modes. Nothing here opens a window or an audio
//! device: hosts feed samples through [`AnalysisTap`] and draw the
//! [`SceneObjectSet`] the engine keeps up to date.

pub mod color;
pub mod deformer;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod modes;
pub mod scene;
pub mod settings;
pub mod signal;
pub mod source;
pub mod spectrum;

pub use color::{Hsl, Rgb};
pub use engine::{Engine, MachineState, TickHandle, TickOutcome, Transition};
pub use error::{EngineError, ModeError, SignalError};
pub use modes::{ModeKind, Viewport, Visualization};
pub use scene::{Camera, SceneObject, SceneObjectSet};
pub use settings::{EngineSettings, FALLBACK_MODE};
pub use source::check_track_name;
pub use spectrum::{AnalysisTap, SpectrumFrame, SpectrumSampler};
