//! 渲染模块
//!
//! - [`points`]: 点云几何与材质描述
//! - [`scene`]: 持有唯一活动点云的场景
//! - [`backend`]: 渲染后端边界与无 GPU 实现
//! - [`wgpu_backend`]: wgpu 实现
//! - [`camera`]: 透视相机与视口
//! - [`frame_loop`]: 帧循环

pub mod backend;
pub mod camera;
pub mod frame_loop;
pub mod points;
pub mod scene;
pub mod wgpu_backend;

pub use backend::{BackendStats, BufferHandle, HeadlessBackend, RenderBackend};
pub use camera::{PerspectiveCamera, Viewport, MAX_PIXEL_RATIO};
pub use frame_loop::{AutoRotate, CancelHandle, FrameLoop, FrameTime, FrameUpdater, Timer};
pub use points::{Blending, BufferAttribute, Points, PointsGeometry, PointsMaterial};
pub use scene::{LivePoints, Scene, Transform};
pub use wgpu_backend::{PointsUniforms, WgpuBackend};
