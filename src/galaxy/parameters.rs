//! 星系生成参数
//!
//! `GalaxyParameters` 是可变的配置快照，`ParameterKey` / `ParameterValue`
//! 提供按键写入的扁平接口（调试面板、wasm 绑定使用）。所有写入都先在副本上
//! 校验，失败时原参数保持不变。

use super::color::Color;
use crate::core::error::{GalaxyError, GalaxyResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 粒子数量的默认上限
pub const MAX_PARTICLE_COUNT: u32 = 1_000_000;

/// 星系生成参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GalaxyParameters {
    /// 粒子数量
    pub particle_count: u32,
    /// 渲染时的点大小
    pub particle_size: f32,
    /// 螺旋最大半径
    pub radius: f32,
    /// 旋臂数量
    pub branch_count: u32,
    /// 旋臂弯曲系数，符号决定缠绕方向
    pub spin: f32,
    /// 抖动幅度
    pub randomness: f32,
    /// 抖动衰减指数，越大越贴近旋臂中心线
    pub randomness_power: f32,
    /// 中心颜色
    pub inside_color: Color,
    /// 边缘颜色
    pub outside_color: Color,
}

impl Default for GalaxyParameters {
    fn default() -> Self {
        Self {
            particle_count: 1000,
            particle_size: 0.02,
            radius: 5.0,
            branch_count: 3,
            spin: 1.0,
            randomness: 0.2,
            randomness_power: 3.0,
            inside_color: Color::from_hex(0xff6030),
            outside_color: Color::from_hex(0x1b3984),
        }
    }
}

impl GalaxyParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在结构校验之外检查粒子数量上限
    pub fn validate_with_limit(&self, max_particle_count: u32) -> GalaxyResult<()> {
        self.validate()?;
        if self.particle_count > max_particle_count {
            return Err(GalaxyError::invalid(
                "particleCount",
                format!(
                    "must be <= {}, got {}",
                    max_particle_count, self.particle_count
                ),
            ));
        }
        Ok(())
    }

    /// 结构校验：不含粒子数量上限，上限由调用方按自己的配置检查
    ///
    /// `radius == 0` 是允许的退化情况：所有粒子落在原点附近，颜色取 `insideColor`。
    pub fn validate(&self) -> GalaxyResult<()> {
        if self.particle_count == 0 {
            return Err(GalaxyError::invalid("particleCount", "must be >= 1"));
        }
        if !self.particle_size.is_finite() || self.particle_size <= 0.0 {
            return Err(GalaxyError::invalid(
                "particleSize",
                format!("must be a finite value > 0, got {}", self.particle_size),
            ));
        }
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(GalaxyError::invalid(
                "radius",
                format!("must be a finite value >= 0, got {}", self.radius),
            ));
        }
        if self.branch_count == 0 {
            return Err(GalaxyError::invalid("branchCount", "must be >= 1"));
        }
        if !self.spin.is_finite() {
            return Err(GalaxyError::invalid("spin", "must be finite"));
        }
        if !self.randomness.is_finite() || self.randomness < 0.0 {
            return Err(GalaxyError::invalid(
                "randomness",
                format!("must be a finite value >= 0, got {}", self.randomness),
            ));
        }
        if !self.randomness_power.is_finite() || self.randomness_power <= 0.0 {
            return Err(GalaxyError::invalid(
                "randomnessPower",
                format!("must be a finite value > 0, got {}", self.randomness_power),
            ));
        }
        if !self.inside_color.is_valid() {
            return Err(GalaxyError::invalid(
                "insideColor",
                "channels must lie in [0, 1]",
            ));
        }
        if !self.outside_color.is_valid() {
            return Err(GalaxyError::invalid(
                "outsideColor",
                "channels must lie in [0, 1]",
            ));
        }
        Ok(())
    }

    /// 读取单个参数
    pub fn get(&self, key: ParameterKey) -> ParameterValue {
        match key {
            ParameterKey::ParticleCount => ParameterValue::Integer(self.particle_count as i64),
            ParameterKey::ParticleSize => ParameterValue::Float(self.particle_size),
            ParameterKey::Radius => ParameterValue::Float(self.radius),
            ParameterKey::BranchCount => ParameterValue::Integer(self.branch_count as i64),
            ParameterKey::Spin => ParameterValue::Float(self.spin),
            ParameterKey::Randomness => ParameterValue::Float(self.randomness),
            ParameterKey::RandomnessPower => ParameterValue::Float(self.randomness_power),
            ParameterKey::InsideColor => ParameterValue::Color(self.inside_color),
            ParameterKey::OutsideColor => ParameterValue::Color(self.outside_color),
        }
    }

    /// 写入单个参数
    ///
    /// 在副本上写入并做结构校验，成功后才替换自身。粒子数量上限不在这里检查。
    pub fn set(&mut self, key: ParameterKey, value: ParameterValue) -> GalaxyResult<()> {
        let mut candidate = self.clone();
        candidate.write(key, value)?;
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    fn write(&mut self, key: ParameterKey, value: ParameterValue) -> GalaxyResult<()> {
        let field = key.as_str();
        match key {
            ParameterKey::ParticleCount => self.particle_count = value.as_count(field)?,
            ParameterKey::ParticleSize => self.particle_size = value.as_float(field)?,
            ParameterKey::Radius => self.radius = value.as_float(field)?,
            ParameterKey::BranchCount => self.branch_count = value.as_count(field)?,
            ParameterKey::Spin => self.spin = value.as_float(field)?,
            ParameterKey::Randomness => self.randomness = value.as_float(field)?,
            ParameterKey::RandomnessPower => self.randomness_power = value.as_float(field)?,
            ParameterKey::InsideColor => self.inside_color = value.as_color(field)?,
            ParameterKey::OutsideColor => self.outside_color = value.as_color(field)?,
        }
        Ok(())
    }
}

/// 可在运行时写入的参数键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKey {
    ParticleCount,
    ParticleSize,
    Radius,
    BranchCount,
    Spin,
    Randomness,
    RandomnessPower,
    InsideColor,
    OutsideColor,
}

impl ParameterKey {
    pub const ALL: [ParameterKey; 9] = [
        ParameterKey::ParticleCount,
        ParameterKey::ParticleSize,
        ParameterKey::Radius,
        ParameterKey::BranchCount,
        ParameterKey::Spin,
        ParameterKey::Randomness,
        ParameterKey::RandomnessPower,
        ParameterKey::InsideColor,
        ParameterKey::OutsideColor,
    ];

    /// 驼峰形式的键名
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterKey::ParticleCount => "particleCount",
            ParameterKey::ParticleSize => "particleSize",
            ParameterKey::Radius => "radius",
            ParameterKey::BranchCount => "branchCount",
            ParameterKey::Spin => "spin",
            ParameterKey::Randomness => "randomness",
            ParameterKey::RandomnessPower => "randomnessPower",
            ParameterKey::InsideColor => "insideColor",
            ParameterKey::OutsideColor => "outsideColor",
        }
    }
}

impl FromStr for ParameterKey {
    type Err = GalaxyError;

    /// 同时接受 `particleCount` 和 `particle_count` 两种写法
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        ParameterKey::ALL
            .into_iter()
            .find(|key| key.as_str().to_lowercase() == normalized)
            .ok_or_else(|| GalaxyError::UnknownParameter(s.to_string()))
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 按键写入时的参数值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    Integer(i64),
    Float(f32),
    Color(Color),
}

impl ParameterValue {
    /// 按参数键的类型解析文本值（环境变量、命令行、调试面板）
    pub fn parse_for(key: ParameterKey, raw: &str) -> GalaxyResult<Self> {
        let raw = raw.trim();
        let field = key.as_str();
        match key {
            ParameterKey::InsideColor | ParameterKey::OutsideColor => raw
                .parse::<Color>()
                .map(ParameterValue::Color)
                .map_err(|reason| GalaxyError::invalid(field, reason)),
            ParameterKey::ParticleCount | ParameterKey::BranchCount => raw
                .parse::<i64>()
                .map(ParameterValue::Integer)
                .map_err(|e| GalaxyError::invalid(field, format!("`{}`: {}", raw, e))),
            _ => raw
                .parse::<f32>()
                .map(ParameterValue::Float)
                .map_err(|e| GalaxyError::invalid(field, format!("`{}`: {}", raw, e))),
        }
    }

    /// 计数类参数：必须是 >= 1 的整数（允许整数值的浮点数，滑块常见）
    fn as_count(self, field: &'static str) -> GalaxyResult<u32> {
        let raw = match self {
            ParameterValue::Integer(v) => v,
            ParameterValue::Float(v) if v.is_finite() && v.fract() == 0.0 => v as i64,
            ParameterValue::Float(v) => {
                return Err(GalaxyError::invalid(
                    field,
                    format!("must be a whole number, got {}", v),
                ))
            }
            ParameterValue::Color(_) => {
                return Err(GalaxyError::TypeMismatch {
                    field,
                    expected: "integer",
                })
            }
        };
        if raw <= 0 {
            return Err(GalaxyError::invalid(
                field,
                format!("must be >= 1, got {}", raw),
            ));
        }
        u32::try_from(raw)
            .map_err(|_| GalaxyError::invalid(field, format!("out of range: {}", raw)))
    }

    fn as_float(self, field: &'static str) -> GalaxyResult<f32> {
        match self {
            ParameterValue::Float(v) => Ok(v),
            ParameterValue::Integer(v) => Ok(v as f32),
            ParameterValue::Color(_) => Err(GalaxyError::TypeMismatch {
                field,
                expected: "number",
            }),
        }
    }

    fn as_color(self, field: &'static str) -> GalaxyResult<Color> {
        match self {
            ParameterValue::Color(c) => Ok(c),
            _ => Err(GalaxyError::TypeMismatch {
                field,
                expected: "color",
            }),
        }
    }
}

impl From<i64> for ParameterValue {
    fn from(v: i64) -> Self {
        ParameterValue::Integer(v)
    }
}

impl From<u32> for ParameterValue {
    fn from(v: u32) -> Self {
        ParameterValue::Integer(v as i64)
    }
}

impl From<f32> for ParameterValue {
    fn from(v: f32) -> Self {
        ParameterValue::Float(v)
    }
}

impl From<Color> for ParameterValue {
    fn from(c: Color) -> Self {
        ParameterValue::Color(c)
    }
}
