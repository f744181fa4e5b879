//! 渲染后端边界
//!
//! 后端只做三件事：上传点云、释放点云、绘制场景。它从不回调生成器。

use super::camera::PerspectiveCamera;
use super::points::Points;
use super::scene::Scene;
use crate::core::error::{RenderError, RenderResult};
use std::collections::HashMap;

/// 后端缓冲区句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u64);

/// 渲染后端
pub trait RenderBackend {
    /// 上传点云数据，返回缓冲区句柄
    fn upload_points(&mut self, points: &Points) -> RenderResult<BufferHandle>;

    /// 释放缓冲区
    fn release_points(&mut self, handle: BufferHandle) -> RenderResult<()>;

    /// 同步绘制一帧
    fn draw(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> RenderResult<()>;

    /// 输出尺寸变化（物理像素）
    fn resize(&mut self, _width: u32, _height: u32) {}
}

/// 后端统计
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct BackendStats {
    /// 已绘制帧数
    pub frames_drawn: u64,
    /// 最近一帧绘制的点数
    pub last_draw_count: usize,
    /// 累计上传次数
    pub uploads: u64,
    /// 累计释放次数
    pub releases: u64,
}

/// 无 GPU 的后端
///
/// 记录缓冲区占用并校验绘制时引用的缓冲区仍然驻留。可设置显存预算，
/// 超出预算的上传失败。
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    resident: HashMap<BufferHandle, usize>,
    next_handle: u64,
    memory_budget: Option<usize>,
    surface_size: (u32, u32),
    stats: BackendStats,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 限制驻留缓冲区的总字节数
    pub fn with_memory_budget(mut self, bytes: usize) -> Self {
        self.memory_budget = Some(bytes);
        self
    }

    pub fn resident_buffers(&self) -> usize {
        self.resident.len()
    }

    pub fn resident_bytes(&self) -> usize {
        self.resident.values().sum()
    }

    pub fn is_resident(&self, handle: BufferHandle) -> bool {
        self.resident.contains_key(&handle)
    }

    pub fn stats(&self) -> BackendStats {
        self.stats
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.surface_size
    }
}

impl RenderBackend for HeadlessBackend {
    fn upload_points(&mut self, points: &Points) -> RenderResult<BufferHandle> {
        let bytes = points.field().byte_size();
        if let Some(budget) = self.memory_budget {
            if self.resident_bytes() + bytes > budget {
                return Err(RenderError::BufferCreation(format!(
                    "{} bytes exceeds memory budget of {} bytes ({} in use)",
                    bytes,
                    budget,
                    self.resident_bytes()
                )));
            }
        }

        self.next_handle += 1;
        let handle = BufferHandle(self.next_handle);
        self.resident.insert(handle, bytes);
        self.stats.uploads += 1;
        tracing::debug!(target: "render", "Uploaded {:?} ({} bytes)", handle, bytes);
        Ok(handle)
    }

    fn release_points(&mut self, handle: BufferHandle) -> RenderResult<()> {
        self.resident
            .remove(&handle)
            .ok_or(RenderError::UnknownHandle(handle.0))?;
        self.stats.releases += 1;
        tracing::debug!(target: "render", "Released {:?}", handle);
        Ok(())
    }

    fn draw(&mut self, scene: &Scene, _camera: &PerspectiveCamera) -> RenderResult<()> {
        let count = match scene.live() {
            Some(live) => {
                if !self.is_resident(live.handle) {
                    return Err(RenderError::InvalidState(format!(
                        "scene references released buffer {:?}",
                        live.handle
                    )));
                }
                live.points.len()
            }
            None => 0,
        };
        self.stats.frames_drawn += 1;
        self.stats.last_draw_count = count;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.surface_size = (width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::generator::generate_seeded;
    use crate::galaxy::parameters::GalaxyParameters;

    fn points(count: u32) -> Points {
        let params = GalaxyParameters {
            particle_count: count,
            ..GalaxyParameters::default()
        };
        Points::galaxy(generate_seeded(&params, 0).unwrap(), &params)
    }

    #[test]
    fn test_upload_and_release() {
        let mut backend = HeadlessBackend::new();
        let handle = backend.upload_points(&points(100)).unwrap();
        assert!(backend.is_resident(handle));
        assert_eq!(backend.resident_bytes(), 100 * 24);

        backend.release_points(handle).unwrap();
        assert_eq!(backend.resident_buffers(), 0);
        assert_eq!(
            backend.release_points(handle),
            Err(RenderError::UnknownHandle(handle.0))
        );
    }

    #[test]
    fn test_memory_budget() {
        let mut backend = HeadlessBackend::new().with_memory_budget(24 * 150);
        let first = backend.upload_points(&points(100)).unwrap();
        assert!(matches!(
            backend.upload_points(&points(100)),
            Err(RenderError::BufferCreation(_))
        ));
        backend.release_points(first).unwrap();
        assert!(backend.upload_points(&points(100)).is_ok());
    }

    #[test]
    fn test_draw_rejects_released_buffer() {
        let mut backend = HeadlessBackend::new();
        let camera = PerspectiveCamera::default();
        let mut scene = Scene::new();

        backend.draw(&scene, &camera).unwrap();
        assert_eq!(backend.stats().last_draw_count, 0);

        let pts = points(10);
        let handle = backend.upload_points(&pts).unwrap();
        scene.replace_points(pts, handle);
        backend.draw(&scene, &camera).unwrap();
        assert_eq!(backend.stats().last_draw_count, 10);

        backend.release_points(handle).unwrap();
        assert!(matches!(
            backend.draw(&scene, &camera),
            Err(RenderError::InvalidState(_))
        ));
    }
}
