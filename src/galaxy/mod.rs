//! 星系粒子场生成模块
//!
//! ## 架构设计
//!
//! ```text
//! ┌──────────────────┐ commit ┌───────────────────┐ request ┌──────────────────┐
//! │  ParameterStore  │ ─────► │  GalaxyGenerator  │ ──────► │ GenerationWorker │
//! │  (暂存 / 校验)    │        │  (参数 + 活动场)   │ ◄────── │  (后台, 可选)     │
//! └──────────────────┘        └─────────┬─────────┘ field   └──────────────────┘
//!                                       │ upload / swap / release
//!                                       ▼
//!                             ┌───────────────────┐
//!                             │   RenderBackend   │
//!                             └───────────────────┘
//! ```
//!
//! ## 使用示例
//!
//! ```ignore
//! let mut generator = GalaxyGenerator::new(
//!     GalaxyParameters::default(),
//!     GenerationConfig::default(),
//!     HeadlessBackend::new(),
//! )?;
//! generator.set_parameter(ParameterKey::BranchCount, 5u32.into())?;
//! ```

pub mod color;
pub mod controller;
pub mod field;
pub mod generator;
pub mod parameters;
pub mod store;
pub mod worker;

pub use color::Color;
pub use controller::{GalaxyGenerator, GenerationStats};
pub use field::{ParticleField, PointVertex};
pub use generator::{branch_angle, generate, generate_seeded, generate_with_rng};
pub use parameters::{GalaxyParameters, ParameterKey, ParameterValue, MAX_PARTICLE_COUNT};
pub use store::{latest_commit, ParameterCommit, ParameterStore};
pub use worker::{GenerationResult, GenerationWorker};
