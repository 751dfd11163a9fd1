//! 波传播通道
//!
//! 每帧把高度场推进一步的显式离散波动更新：
//!
//! ```text
//! avg       = mean(height(x±1, y), height(x, y±1))   // 4 邻域，边缘钳制
//! velocity' = (velocity + (avg - height)) * 0.995
//! height'   = height + velocity'
//! ```
//!
//! 阻尼系数 0.995 严格小于 1：每步速度幅值单调收缩，任意有限初始场
//! 在没有新水滴时都衰减回平面，不会发散。越界邻居通过采样器的
//! 边缘钳制取值，没有环绕。

use crate::core::error::RenderResult;
use crate::render::capability::TextureConfig;
use crate::render::{create_validated_shader, simulation_bind_group_layout, simulation_sampler};

/// 传播通道 Uniform 数据
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UpdateUniforms {
    /// 单个纹素在模拟空间里的尺寸 (1/resolution, 1/resolution)
    pub delta: [f32; 2],
    /// 填充对齐
    pub _pad: [f32; 2],
}

/// 波传播渲染通道
pub struct UpdatePass {
    /// 渲染管线
    pipeline: wgpu::RenderPipeline,
    /// 绑定组布局
    bind_group_layout: wgpu::BindGroupLayout,
    /// 采样器
    sampler: wgpu::Sampler,
    /// Uniform 缓冲区
    uniform_buffer: wgpu::Buffer,
}

impl UpdatePass {
    /// 创建传播通道
    pub fn new(device: &wgpu::Device, config: &TextureConfig) -> RenderResult<Self> {
        let sampler = simulation_sampler(device, config);
        let bind_group_layout = simulation_bind_group_layout(
            device,
            "Update BGL",
            config,
            wgpu::ShaderStages::FRAGMENT,
        );

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Update Uniform Buffer"),
            size: std::mem::size_of::<UpdateUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shader = create_validated_shader(device, "Update Shader", UPDATE_SHADER)?;

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Update Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Update Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_fullscreen",
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_update",
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

    /// 推进一个模拟步
    ///
    /// 读 `input_view`，写 `output_view`；调用方在提交后交换缓冲。
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        input_view: &wgpu::TextureView,
        output_view: &wgpu::TextureView,
        texel_delta: [f32; 2],
    ) {
        let uniforms = UpdateUniforms {
            delta: texel_delta,
            _pad: [0.0; 2],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Update BG"),
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
            label: Some("Update Pass"),
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

/// 传播着色器
const UPDATE_SHADER: &str = r#"
struct UpdateUniforms {
    delta: vec2<f32>,
    _pad: vec2<f32>,
};

@group(0) @binding(0) var sim_texture: texture_2d<f32>;
@group(0) @binding(1) var sim_sampler: sampler;
@group(0) @binding(2) var<uniform> uniforms: UpdateUniforms;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) coord: vec2<f32>,
};

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
fn fs_update(in: VertexOutput) -> @location(0) vec4<f32> {
    var info = textureSample(sim_texture, sim_sampler, in.coord);

    let dx = vec2<f32>(uniforms.delta.x, 0.0);
    let dy = vec2<f32>(0.0, uniforms.delta.y);

    let avg = (
        textureSample(sim_texture, sim_sampler, in.coord - dx).r +
        textureSample(sim_texture, sim_sampler, in.coord + dx).r +
        textureSample(sim_texture, sim_sampler, in.coord - dy).r +
        textureSample(sim_texture, sim_sampler, in.coord + dy).r
    ) / 4.0;

    info.g += avg - info.r;
    info.g *= 0.995;
    info.r += info.g;

    return info;
}
"#;

#[cfg(test)]
mod tests {
    // fs_update 的 CPU 参照：同样的 4 邻域平均 + 0.995 阻尼，边缘钳制
    const DAMPING: f32 = 0.995;

    #[derive(Clone)]
    struct Field {
        n: usize,
        height: Vec<f32>,
        velocity: Vec<f32>,
    }

    impl Field {
        fn new(n: usize) -> Self {
            Self {
                n,
                height: vec![0.0; n * n],
                velocity: vec![0.0; n * n],
            }
        }

        fn at(&self, x: isize, y: isize) -> f32 {
            // 边缘钳制寻址
            let x = x.clamp(0, self.n as isize - 1) as usize;
            let y = y.clamp(0, self.n as isize - 1) as usize;
            self.height[y * self.n + x]
        }

        fn step(&self) -> Field {
            let mut next = self.clone();
            for y in 0..self.n {
                for x in 0..self.n {
                    let i = y * self.n + x;
                    let (xi, yi) = (x as isize, y as isize);
                    let avg = (self.at(xi - 1, yi)
                        + self.at(xi + 1, yi)
                        + self.at(xi, yi - 1)
                        + self.at(xi, yi + 1))
                        / 4.0;
                    let v = (self.velocity[i] + (avg - self.height[i])) * DAMPING;
                    next.velocity[i] = v;
                    next.height[i] = self.height[i] + v;
                }
            }
            next
        }

        fn peak(&self) -> f32 {
            self.height.iter().fold(0.0f32, |m, h| m.max(h.abs()))
        }
    }

    #[test]
    fn test_flat_field_is_fixed_point() {
        let field = Field::new(8);
        let next = field.step();
        assert!(next.peak() == 0.0);
        assert!(next.velocity.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_damping_decays_toward_flat() {
        let mut field = Field::new(16);
        field.height[8 * 16 + 8] = 1.0;

        let initial_peak = field.peak();
        for _ in 0..400 {
            field = field.step();
        }
        // 没有新水滴时场衰减回平面
        assert!(field.peak() < initial_peak * 0.1);
    }

    #[test]
    fn test_no_divergence_for_finite_input() {
        let mut field = Field::new(12);
        for (i, h) in field.height.iter_mut().enumerate() {
            *h = if i % 3 == 0 { 5.0 } else { -5.0 };
        }

        for _ in 0..200 {
            field = field.step();
            assert!(field.height.iter().all(|h| h.is_finite()));
            assert!(field.peak() < 100.0);
        }
    }

    #[test]
    fn test_perturbation_spreads_to_neighbors() {
        let mut field = Field::new(8);
        field.height[4 * 8 + 4] = 1.0;
        field = field.step();
        // 一步之后邻居产生速度响应
        assert!(field.velocity[4 * 8 + 3] != 0.0);
        assert!(field.velocity[3 * 8 + 4] != 0.0);
    }
}
