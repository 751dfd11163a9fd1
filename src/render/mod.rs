//! 渲染模块
//!
//! 模拟缓冲与三个全屏渲染通道（水滴注入、波传播、合成）。
//! 所有通道都用全屏三角形绘制（`draw(0..3)`），不需要顶点缓冲。

pub mod capability;
pub mod composite_pass;
pub mod drop_pass;
pub mod simulation;
pub mod update_pass;

pub use capability::TextureConfig;
pub use composite_pass::CompositePass;
pub use drop_pass::DropPass;
pub use simulation::{PingPong, SimulationBuffers};
pub use update_pass::UpdatePass;

use crate::core::error::{RenderError, RenderResult};

/// 创建着色器模块并立即校验
///
/// 三个程序都在构建期急切编译；WGSL 校验失败通过错误作用域
/// 同步上浮为 [`RenderError::ShaderCompilation`]，不产生部分初始化的实例。
pub fn create_validated_shader(
    device: &wgpu::Device,
    label: &str,
    source: &str,
) -> RenderResult<wgpu::ShaderModule> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(RenderError::ShaderCompilation(format!("{}: {}", label, err)));
    }
    Ok(module)
}

/// 模拟纹理的绑定组布局
///
/// binding 0 = 高度场纹理，binding 1 = 采样器，binding 2 = uniform 缓冲。
/// 采样类型跟随能力探测结果：线性过滤不可用时退化为不可过滤浮点 + 非过滤采样器。
pub(crate) fn simulation_bind_group_layout(
    device: &wgpu::Device,
    label: &str,
    config: &TextureConfig,
    uniform_visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
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
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(if config.linear_filtering {
                    wgpu::SamplerBindingType::Filtering
                } else {
                    wgpu::SamplerBindingType::NonFiltering
                }),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: uniform_visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    })
}

/// 模拟纹理采样器（边缘钳制，过滤模式跟随能力探测结果）
pub(crate) fn simulation_sampler(device: &wgpu::Device, config: &TextureConfig) -> wgpu::Sampler {
    let filter = if config.linear_filtering {
        wgpu::FilterMode::Linear
    } else {
        wgpu::FilterMode::Nearest
    };
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Simulation Sampler"),
        mag_filter: filter,
        min_filter: filter,
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        ..Default::default()
    })
}
