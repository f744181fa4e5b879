//! wgpu 渲染后端
//!
//! 每个点云是一个实例顶点缓冲区，每个粒子展开成屏幕空间的方形（6 个顶点），
//! 尺寸可随深度衰减。绘制目标为离屏颜色纹理加深度纹理。

use super::backend::{BackendStats, BufferHandle, RenderBackend};
use super::camera::PerspectiveCamera;
use super::points::{Blending, Points, PointsMaterial};
use super::scene::Scene;
use crate::core::error::{RenderError, RenderResult};
use crate::galaxy::field::PointVertex;
use std::collections::HashMap;
use std::sync::Arc;
use wgpu::util::DeviceExt;

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const POINTS_SHADER: &str = r#"
struct Uniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    // xy: 物理像素尺寸
    viewport: vec4<f32>,
    // x: size, y: size_attenuation, z: vertex_colors
    params: vec4<f32>,
};
@group(0) @binding(0) var<uniform> u: Uniforms;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs(
    @builtin(vertex_index) vi: u32,
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
) -> VsOut {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
    );

    let view_pos = u.view * u.model * vec4<f32>(position, 1.0);
    var clip = u.proj * view_pos;

    var size = u.params.x;
    if (u.params.y > 0.5) {
        size = size * (u.viewport.y * 0.5) / max(-view_pos.z, 0.0001);
    }
    let offset = corners[vi] * size / u.viewport.xy * clip.w;
    clip = vec4<f32>(clip.xy + offset, clip.zw);

    var out: VsOut;
    out.pos = clip;
    if (u.params.z > 0.5) {
        out.color = color;
    } else {
        out.color = vec3<f32>(1.0, 1.0, 1.0);
    }
    return out;
}

@fragment
fn fs(in: VsOut) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#;

/// 着色器 uniform
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointsUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub viewport: [f32; 4],
    pub params: [f32; 4],
}

impl PointsUniforms {
    pub fn new(
        scene: &Scene,
        camera: &PerspectiveCamera,
        material: &PointsMaterial,
        size: (u32, u32),
    ) -> Self {
        let flag = |on: bool| if on { 1.0 } else { 0.0 };
        Self {
            model: scene.transform.matrix().to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            proj: camera.projection_matrix().to_cols_array_2d(),
            viewport: [size.0.max(1) as f32, size.1.max(1) as f32, 0.0, 0.0],
            params: [
                material.size,
                flag(material.size_attenuation),
                flag(material.vertex_colors),
                0.0,
            ],
        }
    }
}

/// 点云顶点缓冲区布局（按实例步进）
pub fn instance_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        step_mode: wgpu::VertexStepMode::Instance,
        ..PointVertex::layout()
    }
}

struct GpuPoints {
    buffer: wgpu::Buffer,
    count: u32,
    bytes: usize,
}

struct RenderTarget {
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl RenderTarget {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Galaxy Color Target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Galaxy Depth Target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        Self {
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            color,
            width: size.width,
            height: size.height,
        }
    }
}

/// wgpu 后端
pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    target: RenderTarget,
    shader: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<(Blending, bool), wgpu::RenderPipeline>,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    buffers: HashMap<BufferHandle, GpuPoints>,
    next_handle: u64,
    clear_color: wgpu::Color,
    stats: BackendStats,
}

impl WgpuBackend {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        width: u32,
        height: u32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Galaxy Points Shader"),
            source: wgpu::ShaderSource::Wgsl(POINTS_SHADER.into()),
        });

        let uniform_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Galaxy Uniform BGL"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Galaxy Uniforms"),
            size: std::mem::size_of::<PointsUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Galaxy Uniform BG"),
            layout: &uniform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Galaxy Pipeline Layout"),
            bind_group_layouts: &[&uniform_bgl],
            push_constant_ranges: &[],
        });

        let target = RenderTarget::new(&device, width, height);

        Self {
            device,
            queue,
            target,
            shader,
            pipeline_layout,
            pipelines: HashMap::new(),
            uniform_buffer,
            uniform_bind_group,
            buffers: HashMap::new(),
            next_handle: 0,
            clear_color: wgpu::Color::BLACK,
            stats: BackendStats::default(),
        }
    }

    /// 请求不带窗口表面的设备并创建后端
    pub async fn request_headless(width: u32, height: u32) -> RenderResult<Self> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| RenderError::InvalidState("no suitable GPU adapter".to_string()))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Galaxy Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                },
                None,
            )
            .await
            .map_err(|e| RenderError::InvalidState(format!("device request failed: {}", e)))?;

        tracing::info!(target: "render", "Using adapter: {}", adapter.get_info().name);
        Ok(Self::new(Arc::new(device), Arc::new(queue), width, height))
    }

    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    /// 离屏颜色纹理
    pub fn color_texture(&self) -> &wgpu::Texture {
        &self.target.color
    }

    pub fn color_view(&self) -> &wgpu::TextureView {
        &self.target.color_view
    }

    pub fn size(&self) -> (u32, u32) {
        (self.target.width, self.target.height)
    }

    pub fn stats(&self) -> BackendStats {
        self.stats
    }

    pub fn resident_bytes(&self) -> usize {
        self.buffers.values().map(|b| b.bytes).sum()
    }

    fn ensure_pipeline(&mut self, material: &PointsMaterial) -> (Blending, bool) {
        let key = (material.blending, material.depth_write);
        if !self.pipelines.contains_key(&key) {
            let pipeline = self.create_pipeline(material);
            tracing::debug!(target: "render", "Created points pipeline {:?}", key);
            self.pipelines.insert(key, pipeline);
        }
        key
    }

    fn create_pipeline(&self, material: &PointsMaterial) -> wgpu::RenderPipeline {
        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Galaxy Points Pipeline"),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &self.shader,
                    entry_point: "vs",
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    buffers: &[instance_layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &self.shader,
                    entry_point: "fs",
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: COLOR_FORMAT,
                        blend: Some(material.blending.blend_state()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: material.depth_write,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            })
    }
}

impl RenderBackend for WgpuBackend {
    fn upload_points(&mut self, points: &Points) -> RenderResult<BufferHandle> {
        let vertices = points.field().to_vertices();
        let contents: &[u8] = bytemuck::cast_slice(&vertices);

        let max = self.device.limits().max_buffer_size;
        if contents.len() as u64 > max {
            return Err(RenderError::BufferCreation(format!(
                "{} bytes exceeds device buffer limit of {} bytes",
                contents.len(),
                max
            )));
        }
        let count = u32::try_from(vertices.len())
            .map_err(|_| RenderError::BufferCreation("too many vertices".to_string()))?;

        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Galaxy Points"),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            });

        self.ensure_pipeline(points.material());

        self.next_handle += 1;
        let handle = BufferHandle(self.next_handle);
        self.buffers.insert(
            handle,
            GpuPoints {
                buffer,
                count,
                bytes: contents.len(),
            },
        );
        self.stats.uploads += 1;
        tracing::debug!(target: "render", "Uploaded {:?} ({} bytes)", handle, contents.len());
        Ok(handle)
    }

    fn release_points(&mut self, handle: BufferHandle) -> RenderResult<()> {
        let gpu = self
            .buffers
            .remove(&handle)
            .ok_or(RenderError::UnknownHandle(handle.0))?;
        gpu.buffer.destroy();
        self.stats.releases += 1;
        tracing::debug!(target: "render", "Released {:?}", handle);
        Ok(())
    }

    fn draw(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> RenderResult<()> {
        let key = match scene.live() {
            Some(live) => {
                if !self.buffers.contains_key(&live.handle) {
                    return Err(RenderError::InvalidState(format!(
                        "scene references released buffer {:?}",
                        live.handle
                    )));
                }
                let material = *live.points.material();
                let uniforms = PointsUniforms::new(scene, camera, &material, self.size());
                self.queue
                    .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
                Some(self.ensure_pipeline(&material))
            }
            None => None,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Galaxy Frame"),
            });

        let mut drawn = 0;
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Galaxy Points Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let (Some(key), Some(live)) = (key, scene.live()) {
                if let (Some(pipeline), Some(gpu)) =
                    (self.pipelines.get(&key), self.buffers.get(&live.handle))
                {
                    pass.set_pipeline(pipeline);
                    pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                    pass.set_vertex_buffer(0, gpu.buffer.slice(..));
                    pass.draw(0..6, 0..gpu.count);
                    drawn = gpu.count as usize;
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.stats.frames_drawn += 1;
        self.stats.last_draw_count = drawn;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || (width, height) == self.size() {
            return;
        }
        self.target = RenderTarget::new(&self.device, width, height);
        tracing::debug!(target: "render", "Render target resized to {}x{}", width, height);
    }
}

impl Drop for WgpuBackend {
    fn drop(&mut self) {
        for (_, gpu) in self.buffers.drain() {
            gpu.buffer.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::generator::generate_seeded;
    use crate::galaxy::parameters::GalaxyParameters;

    #[test]
    fn test_uniform_layout() {
        // 5 个 16 字节对齐的成员
        assert_eq!(std::mem::size_of::<PointsUniforms>(), 64 * 3 + 16 * 2);
        assert_eq!(std::mem::size_of::<PointsUniforms>() % 16, 0);
    }

    #[test]
    fn test_uniform_flags() {
        let params = GalaxyParameters {
            particle_count: 10,
            ..GalaxyParameters::default()
        };
        let points = Points::galaxy(generate_seeded(&params, 1).unwrap(), &params);
        let uniforms = PointsUniforms::new(
            &Scene::new(),
            &PerspectiveCamera::default(),
            points.material(),
            (1280, 720),
        );
        assert_eq!(uniforms.params, [0.02, 1.0, 1.0, 0.0]);
        assert_eq!(uniforms.viewport[..2], [1280.0, 720.0]);
        assert_eq!(uniforms.model, glam::Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn test_instance_layout() {
        let layout = instance_layout();
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Instance);
        assert_eq!(layout.array_stride, 24);
        assert_eq!(layout.attributes.len(), 2);
        assert_eq!(layout.attributes[1].offset, 12);
    }

    #[test]
    fn test_shader_entry_points() {
        assert!(POINTS_SHADER.contains("fn vs("));
        assert!(POINTS_SHADER.contains("fn fs("));
    }
}
