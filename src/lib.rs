//! # Galaxy Generator
//!
//! Procedural spiral-galaxy point-cloud generator.
//!
//! ## Features
//!
//! - **Generation**: spiral arms with radius-scaled power-law jitter and an inside-to-outside color gradient
//! - **Live Field Contract**: every parameter change replaces the single live field (validate, generate, upload, swap, release)
//! - **Parameter Store**: staged edits, commit notifications, latest-commit-wins debounce
//! - **Background Generation**: optional worker thread, stale results discarded
//! - **Rendering**: additive, depth-write-disabled point sprites through wgpu, plus a headless backend
//!
//! ## Architecture Design
//!
//! - **Parameters (State)**: `GalaxyParameters` is plain validated data
//! - **Generator (Service)**: `generate_with_rng` is a pure function from parameters to a `ParticleField`
//! - **Controller**: `GalaxyGenerator` owns the live field and talks to a `RenderBackend`
//!
//! ### Example
//!
//! ```ignore
//! use galaxy_generator::galaxy::{GalaxyGenerator, GalaxyParameters, ParameterKey};
//! use galaxy_generator::config::GenerationConfig;
//! use galaxy_generator::render::HeadlessBackend;
//!
//! let mut generator = GalaxyGenerator::new(
//!     GalaxyParameters::default(),
//!     GenerationConfig::default(),
//!     HeadlessBackend::new(),
//! )?;
//! generator.set_parameter(ParameterKey::Spin, (-1.0f32).into())?;
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Errors, logging and shared macros
//! - [`config`]: Configuration files and environment overrides
//! - [`galaxy`]: Parameters, generation, parameter store and controller
//! - [`render`]: Points, scene, camera, backends and frame loop

/// Errors, logging initialization and shared macros
pub mod core;
/// Configuration system
pub mod config;
/// Galaxy parameters, generation and regeneration control
pub mod galaxy;
/// Rendering backends, scene and frame loop
pub mod render;
/// WebAssembly bindings
#[cfg(target_arch = "wasm32")]
pub mod web;

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}
