use super::{ConfigError, ConfigResult};
use crate::galaxy::parameters::MAX_PARTICLE_COUNT;
use crate::impl_default;
use serde::{Deserialize, Serialize};

/// 生成配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// 随机种子（None = 使用系统熵，每次结果不同）
    pub seed: Option<u64>,

    /// 是否在后台线程生成
    pub background: bool,

    /// 粒子数量上限
    pub max_particle_count: u32,
}

impl_default!(GenerationConfig {
    seed: None,
    background: false,
    max_particle_count: MAX_PARTICLE_COUNT,
});

impl GenerationConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_particle_count == 0 {
            return Err(ConfigError::ValidationError(
                "max_particle_count must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
