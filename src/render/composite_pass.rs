//! 合成通道
//!
//! 把高度场变成可见画面的唯一通道：采样高度场梯度折射背景图，
//! 再叠加一个固定方向的镜面高光，直接写入可见表面。
//!
//! 背景纹理在构建时上传一次（RGBA8、线性过滤、边缘钳制），随后只读。
//! 非正方形视口通过 `ripples_ratio = (w, h) / max(w, h)` 把正方形
//! 模拟网格映射到屏幕而不拉伸 —— 恰好一个轴被缩到 min/max。

use crate::core::error::RenderResult;
use crate::render::capability::TextureConfig;
use crate::render::{create_validated_shader, simulation_sampler};

/// 非正方形视口的纵横比修正
///
/// 正方形表面返回 `(1, 1)`；2:1 的表面返回 `(1, 0.5)`。
pub fn ripples_ratio(width: u32, height: u32) -> [f32; 2] {
    let longest = width.max(height).max(1) as f32;
    [width as f32 / longest, height as f32 / longest]
}

/// 合成通道 Uniform 数据
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CompositeUniforms {
    /// 单个纹素在模拟空间里的尺寸
    pub delta: [f32; 2],
    /// 纵横比修正
    pub ripples_ratio: [f32; 2],
    /// 视觉扰动强度
    pub perturbance: f32,
    /// 填充对齐
    pub _pad: [f32; 3],
}

/// 合成渲染通道
///
/// 对模拟缓冲和背景纹理都是只读的。
pub struct CompositePass {
    /// 渲染管线
    pipeline: wgpu::RenderPipeline,
    /// 绑定组布局
    bind_group_layout: wgpu::BindGroupLayout,
    /// 背景纹理
    background_texture: wgpu::Texture,
    /// 背景纹理视图
    background_view: wgpu::TextureView,
    /// 背景采样器（始终线性）
    background_sampler: wgpu::Sampler,
    /// 模拟纹理采样器（跟随能力探测结果）
    sim_sampler: wgpu::Sampler,
    /// Uniform 缓冲区
    uniform_buffer: wgpu::Buffer,
}

impl CompositePass {
    /// 创建合成通道并上传背景纹理
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        config: &TextureConfig,
        background: &image::DynamicImage,
    ) -> RenderResult<Self> {
        let (background_texture, background_view) =
            Self::create_background_texture(device, queue, background);

        let background_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Background Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });
        let sim_sampler = simulation_sampler(device, config);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Composite BGL"),
            entries: &[
                // 背景纹理
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // 背景采样器
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // 高度场纹理
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float {
                            filterable: config.linear_filtering,
                        },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // 高度场采样器
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(if config.linear_filtering {
                        wgpu::SamplerBindingType::Filtering
                    } else {
                        wgpu::SamplerBindingType::NonFiltering
                    }),
                    count: None,
                },
                // Uniforms（顶点阶段要用 ripples_ratio）
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Composite Uniform Buffer"),
            size: std::mem::size_of::<CompositeUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shader = create_validated_shader(device, "Composite Shader", COMPOSITE_SHADER)?;

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Composite Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Composite Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_composite",
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_composite",
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    // 只有写可见表面的通道启用混合
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
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
            background_texture,
            background_view,
            background_sampler,
            sim_sampler,
            uniform_buffer,
        })
    }

    /// 上传背景纹理
    ///
    /// 一次性上传，之后不可变。图像按行上传，第一行在顶部，
    /// 与全屏通道的左上角 uv 原点一致。
    fn create_background_texture(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &image::DynamicImage,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Background Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    /// 执行合成渲染
    ///
    /// 读交换后的读缓冲和背景纹理，写可见表面。
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        ripples_view: &wgpu::TextureView,
        output_view: &wgpu::TextureView,
        surface_size: (u32, u32),
        texel_delta: [f32; 2],
        perturbance: f32,
    ) {
        let uniforms = CompositeUniforms {
            delta: texel_delta,
            ripples_ratio: ripples_ratio(surface_size.0, surface_size.1),
            perturbance,
            _pad: [0.0; 3],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Composite BG"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&self.background_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.background_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(ripples_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sim_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Composite Pass"),
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

    /// 背景纹理尺寸
    pub fn background_size(&self) -> (u32, u32) {
        (
            self.background_texture.width(),
            self.background_texture.height(),
        )
    }
}

/// 合成着色器
const COMPOSITE_SHADER: &str = r#"
struct CompositeUniforms {
    delta: vec2<f32>,
    ripples_ratio: vec2<f32>,
    perturbance: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
};

@group(0) @binding(0) var background_texture: texture_2d<f32>;
@group(0) @binding(1) var background_sampler: sampler;
@group(0) @binding(2) var ripples_texture: texture_2d<f32>;
@group(0) @binding(3) var ripples_sampler: sampler;
@group(0) @binding(4) var<uniform> uniforms: CompositeUniforms;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) background_coord: vec2<f32>,
    @location(1) ripples_coord: vec2<f32>,
};

// 全屏三角形，把纵横比修正后的模拟坐标传给片元
@vertex
fn vs_composite(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var out: VertexOutput;

    let x = f32((vertex_index << 1u) & 2u);
    let y = f32(vertex_index & 2u);

    out.position = vec4<f32>(x * 2.0 - 1.0, y * 2.0 - 1.0, 0.0, 1.0);
    out.background_coord = vec2<f32>(x, 1.0 - y);
    out.ripples_coord = out.background_coord * uniforms.ripples_ratio;

    return out;
}

@fragment
fn fs_composite(in: VertexOutput) -> @location(0) vec4<f32> {
    let height = textureSample(ripples_texture, ripples_sampler, in.ripples_coord).r;
    let height_x = textureSample(
        ripples_texture,
        ripples_sampler,
        vec2<f32>(in.ripples_coord.x + uniforms.delta.x, in.ripples_coord.y)
    ).r;
    let height_y = textureSample(
        ripples_texture,
        ripples_sampler,
        vec2<f32>(in.ripples_coord.x, in.ripples_coord.y + uniforms.delta.y)
    ).r;

    // 前向差分构造坡度向量
    let dx = vec3<f32>(uniforms.delta.x, height_x - height, 0.0);
    let dy = vec3<f32>(0.0, height_y - height, uniforms.delta.y);
    let r = -normalize(cross(dy, dx)).xz;

    // 固定单方向镜面高光（光源方向不可配置）
    let v = normalize(vec2<f32>(1.0, 1.0));
    let specular = vec4<f32>(0.8, 0.8, 0.8, 1.0) * pow(max(0.0, dot(v, r)), 5.0);

    let refracted = textureSample(
        background_texture,
        background_sampler,
        in.background_coord + r * uniforms.perturbance
    );

    return refracted + specular;
}
"#;
