//! 透视相机与视口
//!
//! 窗口尺寸变化只修改相机和视口状态，不触碰粒子场。

use crate::config::ViewportConfig;
use glam::{Mat4, Vec3};

/// 像素比上限
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// 透视相机
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    /// 垂直视场角（度）
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            fov: 75.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::new(3.0, 3.0, 3.0),
            target: Vec3::ZERO,
        }
    }
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov,
            aspect,
            near,
            far,
            ..Default::default()
        }
    }

    pub fn from_config(config: &ViewportConfig) -> Self {
        Self {
            fov: config.fov,
            aspect: config.width as f32 / config.height.max(1) as f32,
            near: config.near,
            far: config.far,
            position: Vec3::from_array(config.camera_position),
            target: Vec3::ZERO,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// 视口状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// 逻辑宽度
    pub width: u32,
    /// 逻辑高度
    pub height: u32,
    /// 实际使用的像素比（≤ 2）
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: clamp_pixel_ratio(device_pixel_ratio),
        }
    }

    pub fn from_config(config: &ViewportConfig) -> Self {
        Self::new(config.width, config.height, config.device_pixel_ratio)
    }

    /// 处理尺寸变化，更新相机宽高比
    ///
    /// 宽或高为 0（窗口最小化）时忽略本次变化，返回 `None`。
    /// 否则返回渲染输出的物理像素尺寸。
    pub fn resize(
        &mut self,
        width: u32,
        height: u32,
        device_pixel_ratio: f32,
        camera: &mut PerspectiveCamera,
    ) -> Option<(u32, u32)> {
        if width == 0 || height == 0 {
            return None;
        }
        self.width = width;
        self.height = height;
        self.pixel_ratio = clamp_pixel_ratio(device_pixel_ratio);
        camera.aspect = width as f32 / height as f32;
        Some(self.physical_size())
    }

    pub fn physical_size(&self) -> (u32, u32) {
        (
            (self.width as f32 * self.pixel_ratio).round() as u32,
            (self.height as f32 * self.pixel_ratio).round() as u32,
        )
    }
}

fn clamp_pixel_ratio(ratio: f32) -> f32 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio.min(MAX_PIXEL_RATIO)
    } else {
        1.0
    }
}
