//! 粒子场数据
//!
//! 一次生成的结果：位置和颜色两组按下标对齐的数据。生成后不可变，
//! 参数变化时整体被新实例替换。

use super::color::Color;
use glam::Vec3;

/// 粒子场（点云）
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleField {
    positions: Vec<Vec3>,
    colors: Vec<Vec3>,
}

impl ParticleField {
    /// 由两组等长数据构造
    ///
    /// 长度不一致属于生成器内部错误，这里只做调试断言。
    pub(crate) fn from_parts(positions: Vec<Vec3>, colors: Vec<Vec3>) -> Self {
        debug_assert_eq!(positions.len(), colors.len());
        Self { positions, colors }
    }

    /// 粒子数量
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    pub fn color(&self, index: usize) -> Option<Color> {
        self.colors.get(index).map(|c| Color::new(c.x, c.y, c.z))
    }

    /// 扁平的位置数组（每个粒子 3 个 float）
    pub fn position_data(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions[..])
    }

    /// 扁平的颜色数组（每个粒子 3 个 float）
    pub fn color_data(&self) -> &[f32] {
        bytemuck::cast_slice(&self.colors[..])
    }

    /// 交错排列的顶点数据，供 GPU 上传
    pub fn to_vertices(&self) -> Vec<PointVertex> {
        self.positions
            .iter()
            .zip(&self.colors)
            .map(|(p, c)| PointVertex {
                position: p.to_array(),
                color: c.to_array(),
            })
            .collect()
    }

    /// XZ 平面上离中心最远的距离
    pub fn max_planar_radius(&self) -> f32 {
        self.positions
            .iter()
            .map(|p| (p.x * p.x + p.z * p.z).sqrt())
            .fold(0.0, f32::max)
    }

    /// 占用的字节数（位置 + 颜色）
    pub fn byte_size(&self) -> usize {
        std::mem::size_of::<PointVertex>() * self.len()
    }
}

/// GPU 顶点结构（对应 WGSL 中的 position / color 两个属性）
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointVertex {
    /// 位置
    pub position: [f32; 3],
    /// 颜色
    pub color: [f32; 3],
}

impl PointVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    /// 顶点缓冲区布局
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}
