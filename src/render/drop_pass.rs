//! 水滴注入通道
//!
//! 在给定的模拟空间坐标处向高度通道加入一个局部扰动。
//! 余弦轮廓在中心恰好是 `strength`，在 `d = 1` 处恰好衰减到 0，
//! 并且在边界处连续可微 —— 梯度直接喂给合成通道的折射，
//! 线性或阶跃衰减会在视觉上留下一圈硬边。
//!
//! 指针层用两组参数调用同一个通道：持续移动的小扰动（强度 0.015）
//! 和一次性按压的大扰动（1.5 倍半径，强度 0.15）。

use glam::Vec2;

use crate::core::error::RenderResult;
use crate::render::capability::TextureConfig;
use crate::render::{create_validated_shader, simulation_bind_group_layout, simulation_sampler};

/// 水滴通道 Uniform 数据
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DropUniforms {
    /// 扰动中心（归一化模拟空间）
    pub center: [f32; 2],
    /// 扰动半径（归一化模拟空间）
    pub radius: f32,
    /// 扰动强度
    pub strength: f32,
}

/// 水滴注入渲染通道
pub struct DropPass {
    /// 渲染管线
    pipeline: wgpu::RenderPipeline,
    /// 绑定组布局
    bind_group_layout: wgpu::BindGroupLayout,
    /// 采样器
    sampler: wgpu::Sampler,
    /// Uniform 缓冲区
    uniform_buffer: wgpu::Buffer,
}

impl DropPass {
    /// 创建水滴通道
    pub fn new(device: &wgpu::Device, config: &TextureConfig) -> RenderResult<Self> {
        let sampler = simulation_sampler(device, config);
        let bind_group_layout =
            simulation_bind_group_layout(device, "Drop BGL", config, wgpu::ShaderStages::FRAGMENT);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Drop Uniform Buffer"),
            size: std::mem::size_of::<DropUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shader = create_validated_shader(device, "Drop Shader", DROP_SHADER)?;

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Drop Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Drop Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_fullscreen",
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_drop",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Ok(Self {
            pipeline,
            bind_group_layout,
            sampler,
            uniform_buffer,
        })
    }

    /// 执行一次注入
    ///
    /// 读 `input_view`，写 `output_view`；调用方在提交后交换缓冲。
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        input_view: &wgpu::TextureView,
        output_view: &wgpu::TextureView,
        center: Vec2,
        radius: f32,
        strength: f32,
    ) {
        let uniforms = DropUniforms {
            center: center.to_array(),
            radius,
            strength,
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Drop BG"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Drop Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }
}

/// 水滴着色器
const DROP_SHADER: &str = r#"
struct DropUniforms {
    center: vec2<f32>,
    radius: f32,
    strength: f32,
};

@group(0) @binding(0) var sim_texture: texture_2d<f32>;
@group(0) @binding(1) var sim_sampler: sampler;
@group(0) @binding(2) var<uniform> uniforms: DropUniforms;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) coord: vec2<f32>,
};

const PI: f32 = 3.141592653589793;

// 全屏三角形顶点着色器
@vertex
fn vs_fullscreen(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var out: VertexOutput;

    let x = f32((vertex_index << 1u) & 2u);
    let y = f32(vertex_index & 2u);

    out.position = vec4<f32>(x * 2.0 - 1.0, y * 2.0 - 1.0, 0.0, 1.0);
    out.coord = vec2<f32>(x, 1.0 - y);

    return out;
}

@fragment
fn fs_drop(in: VertexOutput) -> @location(0) vec4<f32> {
    var info = textureSample(sim_texture, sim_sampler, in.coord);

    let d = min(distance(uniforms.center, in.coord) / uniforms.radius, 1.0);
    info.r += (cos(d * PI) * 0.5 + 0.5) * uniforms.strength;

    return info;
}
"#;

#[cfg(test)]
mod tests {
    // 余弦衰减轮廓的 CPU 参照，与 fs_drop 保持一致
    fn cosine_profile(d: f32, strength: f32) -> f32 {
        let d = (d).min(1.0);
        (f32::cos(d * std::f32::consts::PI) * 0.5 + 0.5) * strength
    }

    #[test]
    fn test_profile_is_strength_at_center() {
        assert_eq!(cosine_profile(0.0, 0.15), 0.15);
        assert_eq!(cosine_profile(0.0, 0.015), 0.015);
    }

    #[test]
    fn test_profile_is_zero_at_boundary() {
        // d = 1 处贡献精确为 0（cos(PI) = -1）
        assert!(cosine_profile(1.0, 0.15).abs() < 1e-7);
        // 半径之外被钳制到 d = 1，同样为 0
        assert!(cosine_profile(3.0, 0.15).abs() < 1e-7);
    }

    #[test]
    fn test_zero_strength_is_identity() {
        for d in [0.0, 0.25, 0.5, 1.0, 2.0] {
            assert_eq!(cosine_profile(d, 0.0), 0.0);
        }
    }

    #[test]
    fn test_profile_is_monotonic_within_radius() {
        let mut prev = cosine_profile(0.0, 1.0);
        for i in 1..=20 {
            let next = cosine_profile(i as f32 / 20.0, 1.0);
            assert!(next <= prev);
            prev = next;
        }
    }
}
