//! # Ripples
//!
//! Real-time GPU water-ripple distortion over a background image, built with wgpu.
//!
//! ## How it works
//!
//! The effect keeps a `resolution × resolution` height field on the GPU:
//! channel R stores the surface height, channel G its velocity. Two textures
//! are ping-ponged so every pass reads the previous state and writes a fresh
//! one. Three fullscreen passes drive the effect:
//!
//! - **Drop injection**: adds a smooth cosine-profiled bump to the height
//!   channel under the pointer
//! - **Wave propagation**: a damped discrete wave update (4-neighbor average,
//!   0.995 damping) advancing the field one step per frame
//! - **Compositing**: samples the height-field gradient to refract the
//!   background image and adds a fixed-direction specular glint
//!
//! ## Example
//!
//! ```no_run
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     ripples::core::Runner::run()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: effect lifecycle, frame scheduling and the demo runner
//! - [`render`]: simulation buffers and the three GPU passes
//! - [`input`]: pointer-to-simulation-space coordinate mapping
//! - [`config`]: effect configuration (TOML/JSON/env)

/// Effect lifecycle, frame scheduling and the windowed demo runner
pub mod core;
/// Configuration system
pub mod config;
/// GPU simulation buffers and render passes
pub mod render;
/// Pointer coordinate mapping
pub mod input;
