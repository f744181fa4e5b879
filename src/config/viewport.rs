use super::{ConfigError, ConfigResult};
use crate::impl_default;
use serde::{Deserialize, Serialize};

/// 视口与相机配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// 宽度（逻辑像素）
    pub width: u32,

    /// 高度（逻辑像素）
    pub height: u32,

    /// 设备像素比，实际使用时上限为 2
    pub device_pixel_ratio: f32,

    /// 垂直视场角（度）
    pub fov: f32,

    /// 近裁剪面
    pub near: f32,

    /// 远裁剪面
    pub far: f32,

    /// 相机位置
    pub camera_position: [f32; 3],

    /// 星系绕 Y 轴自转速度（弧度/秒），0 表示静止
    pub auto_rotate_speed: f32,

    /// 目标帧率
    pub target_fps: u32,
}

impl_default!(ViewportConfig {
    width: 1280,
    height: 720,
    device_pixel_ratio: 1.0,
    fov: 75.0,
    near: 0.1,
    far: 100.0,
    camera_position: [3.0, 3.0, 3.0],
    auto_rotate_speed: 0.0,
    target_fps: 60,
});

impl ViewportConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ValidationError(
                "Invalid viewport size".to_string(),
            ));
        }
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(ConfigError::ValidationError(format!(
                "fov must lie in (0, 180), got {}",
                self.fov
            )));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(ConfigError::ValidationError(
                "Clipping planes must satisfy 0 < near < far".to_string(),
            ));
        }
        if self.target_fps == 0 || self.target_fps > 1000 {
            return Err(ConfigError::ValidationError(
                "Invalid target FPS".to_string(),
            ));
        }
        Ok(())
    }
}
