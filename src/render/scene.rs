//! 场景
//!
//! 场景只持有一个活动点云以及它的变换。替换是一次赋值：旧点云从场景
//! 摘下后才交还给调用方释放，场景不会引用已释放的缓冲区。

use super::backend::BufferHandle;
use super::points::Points;
use glam::{Mat4, Quat, Vec3};

/// 变换组件
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub pos: Vec3,
    pub rot: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            pos: Vec3::ZERO,
            rot: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rot, self.pos)
    }
}

/// 已上传到渲染后端的点云
#[derive(Debug)]
pub struct LivePoints {
    pub points: Points,
    pub handle: BufferHandle,
}

/// 场景
#[derive(Debug, Default)]
pub struct Scene {
    live: Option<LivePoints>,
    /// 点云变换
    pub transform: Transform,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// 换入新点云，返回被替换的旧点云（由调用方释放其缓冲区）
    pub fn replace_points(&mut self, points: Points, handle: BufferHandle) -> Option<LivePoints> {
        self.live.replace(LivePoints { points, handle })
    }

    /// 摘下当前点云
    pub fn take_points(&mut self) -> Option<LivePoints> {
        self.live.take()
    }

    pub fn points(&self) -> Option<&Points> {
        self.live.as_ref().map(|live| &live.points)
    }

    pub fn live(&self) -> Option<&LivePoints> {
        self.live.as_ref()
    }

    pub fn live_handle(&self) -> Option<BufferHandle> {
        self.live.as_ref().map(|live| live.handle)
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
    fn test_replace_returns_previous() {
        let mut scene = Scene::new();
        assert!(scene.replace_points(points(10), BufferHandle(1)).is_none());

        let previous = scene.replace_points(points(20), BufferHandle(2)).unwrap();
        assert_eq!(previous.handle, BufferHandle(1));
        assert_eq!(previous.points.len(), 10);
        assert_eq!(scene.points().unwrap().len(), 20);
        assert_eq!(scene.live_handle(), Some(BufferHandle(2)));

        assert!(scene.take_points().is_some());
        assert!(scene.points().is_none());
    }

    #[test]
    fn test_transform_matrix() {
        let transform = Transform {
            pos: Vec3::new(1.0, 2.0, 3.0),
            ..Transform::default()
        };
        let moved = transform.matrix().transform_point3(Vec3::ZERO);
        assert_eq!(moved, Vec3::new(1.0, 2.0, 3.0));
    }
}
