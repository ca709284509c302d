//! Primus - a minimal Vulkan bootstrap layer.
//!
//! Window, instance, surface, first-match physical device selection and a
//! logical device, each owned by an RAII wrapper.

pub mod backend;
pub mod config;
pub mod engine;

pub use config::{Config, ConfigSource};
pub use engine::Engine;
