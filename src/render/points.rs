//! 点图元对象
//!
//! 渲染器看到的只有 `Points`：一份几何（`position` / `color` 两个属性）
//! 加一份材质描述。几何属性直接借用 `ParticleField` 的数据，不复制。

use crate::galaxy::field::ParticleField;
use crate::galaxy::parameters::GalaxyParameters;

/// 位置属性名
pub const POSITION_ATTRIBUTE: &str = "position";
/// 颜色属性名
pub const COLOR_ATTRIBUTE: &str = "color";

/// 几何属性（扁平 float 数组 + 每项分量数）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferAttribute<'a> {
    pub name: &'static str,
    pub item_size: usize,
    pub data: &'a [f32],
}

impl BufferAttribute<'_> {
    /// 元素个数
    pub fn count(&self) -> usize {
        self.data.len() / self.item_size
    }
}

/// 点云几何
#[derive(Debug, Clone, Copy)]
pub struct PointsGeometry<'a> {
    attributes: [BufferAttribute<'a>; 2],
}

impl<'a> PointsGeometry<'a> {
    pub fn from_field(field: &'a ParticleField) -> Self {
        Self {
            attributes: [
                BufferAttribute {
                    name: POSITION_ATTRIBUTE,
                    item_size: 3,
                    data: field.position_data(),
                },
                BufferAttribute {
                    name: COLOR_ATTRIBUTE,
                    item_size: 3,
                    data: field.color_data(),
                },
            ],
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&BufferAttribute<'a>> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attributes(&self) -> &[BufferAttribute<'a>] {
        &self.attributes
    }

    pub fn vertex_count(&self) -> usize {
        self.attributes[0].count()
    }
}

/// 混合模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Blending {
    /// 普通 alpha 混合
    Normal,
    /// 叠加混合（发光效果）
    Additive,
}

impl Blending {
    pub fn blend_state(self) -> wgpu::BlendState {
        match self {
            Blending::Normal => wgpu::BlendState::ALPHA_BLENDING,
            Blending::Additive => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            },
        }
    }
}

/// 点材质描述
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointsMaterial {
    /// 点大小
    pub size: f32,
    /// 是否随距离缩放
    pub size_attenuation: bool,
    /// 是否写入深度
    pub depth_write: bool,
    /// 混合模式
    pub blending: Blending,
    /// 是否使用顶点颜色
    pub vertex_colors: bool,
}

impl PointsMaterial {
    /// 星系使用的材质：叠加混合、关闭深度写入、距离衰减、顶点颜色
    pub fn galaxy(size: f32) -> Self {
        Self {
            size,
            size_attenuation: true,
            depth_write: false,
            blending: Blending::Additive,
            vertex_colors: true,
        }
    }
}

impl Default for PointsMaterial {
    fn default() -> Self {
        Self {
            size: 1.0,
            size_attenuation: true,
            depth_write: true,
            blending: Blending::Normal,
            vertex_colors: false,
        }
    }
}

/// 可渲染的点云对象
#[derive(Debug, Clone)]
pub struct Points {
    field: ParticleField,
    material: PointsMaterial,
}

impl Points {
    pub fn new(field: ParticleField, material: PointsMaterial) -> Self {
        Self { field, material }
    }

    /// 由生成结果和参数组装星系点云
    pub fn galaxy(field: ParticleField, params: &GalaxyParameters) -> Self {
        Self::new(field, PointsMaterial::galaxy(params.particle_size))
    }

    pub fn geometry(&self) -> PointsGeometry<'_> {
        PointsGeometry::from_field(&self.field)
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn material(&self) -> &PointsMaterial {
        &self.material
    }

    pub fn len(&self) -> usize {
        self.field.len()
    }

    pub fn is_empty(&self) -> bool {
        self.field.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::generator::generate_seeded;

    #[test]
    fn test_galaxy_points_layout() {
        let params = GalaxyParameters::default();
        let points = Points::galaxy(generate_seeded(&params, 1).unwrap(), &params);
        let geometry = points.geometry();

        let position = geometry.attribute(POSITION_ATTRIBUTE).unwrap();
        let color = geometry.attribute(COLOR_ATTRIBUTE).unwrap();
        assert_eq!(position.item_size, 3);
        assert_eq!(position.count(), 1000);
        assert_eq!(color.count(), 1000);
        assert_eq!(geometry.vertex_count(), points.len());
        assert!(geometry.attribute("normal").is_none());
    }

    #[test]
    fn test_galaxy_material_flags() {
        let material = PointsMaterial::galaxy(0.02);
        assert_eq!(material.blending, Blending::Additive);
        assert!(!material.depth_write);
        assert!(material.size_attenuation);
        assert!(material.vertex_colors);
        assert_eq!(
            material.blending.blend_state().color.dst_factor,
            wgpu::BlendFactor::One
        );
    }
}
