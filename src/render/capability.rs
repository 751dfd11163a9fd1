//! GPU 纹理能力探测
//!
//! 高度场需要可作为渲染目标的浮点纹理。wgpu 核心规范保证
//! `Rgba16Float` 可渲染、可线性过滤；`Rgba32Float` 始终可渲染，
//! 但线性过滤需要 `FLOAT32_FILTERABLE` 特性。
//!
//! 探测结果按进程缓存（`OnceLock`）：首次成功或失败之后不再重新探测。

use std::sync::OnceLock;

use crate::core::error::{RenderError, RenderResult};

/// 纹理能力描述
///
/// 模拟纹理的像素格式和过滤模式，由平台能力决定，每进程解析一次。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureConfig {
    /// 高度场像素格式
    pub format: wgpu::TextureFormat,
    /// 是否支持线性过滤
    pub linear_filtering: bool,
}

static TEXTURE_CONFIG: OnceLock<TextureConfig> = OnceLock::new();

impl TextureConfig {
    /// 按偏好顺序选择格式（纯函数，便于测试）
    ///
    /// 1. `Rgba32Float` + 线性过滤（需要 `FLOAT32_FILTERABLE`）
    /// 2. `Rgba16Float` + 线性过滤（核心规范保证）
    /// 3. `Rgba32Float` + 最近邻采样（兜底，核心规范保证可渲染）
    ///
    /// 原始实现优先选择全精度浮点；这里在全精度过滤缺失时偏向可过滤的
    /// 半精度，因为合成通道的折射对线性采样更敏感。
    pub fn select(float32_filterable: bool, half_float_renderable: bool) -> Self {
        if float32_filterable {
            Self {
                format: wgpu::TextureFormat::Rgba32Float,
                linear_filtering: true,
            }
        } else if half_float_renderable {
            Self {
                format: wgpu::TextureFormat::Rgba16Float,
                linear_filtering: true,
            }
        } else {
            Self {
                format: wgpu::TextureFormat::Rgba32Float,
                linear_filtering: false,
            }
        }
    }

    /// 解析进程级纹理能力
    ///
    /// 首次调用根据设备特性解析并缓存；之后的调用返回缓存值，
    /// 即使设备不同也不再重新探测。
    pub fn global(device: &wgpu::Device) -> Self {
        *TEXTURE_CONFIG.get_or_init(|| {
            let config = Self::select(
                device
                    .features()
                    .contains(wgpu::Features::FLOAT32_FILTERABLE),
                true,
            );
            tracing::info!(
                target: "render",
                format = ?config.format,
                linear = config.linear_filtering,
                "Resolved simulation texture capability"
            );
            config
        })
    }

    /// 每纹素字节数（4 通道）
    pub fn bytes_per_texel(&self) -> u32 {
        match self.format {
            wgpu::TextureFormat::Rgba32Float => 16,
            wgpu::TextureFormat::Rgba16Float => 8,
            // 构造上只会出现上面两种格式
            _ => 16,
        }
    }

    /// 校验模拟网格尺寸不超出设备上限
    pub fn ensure_grid_supported(&self, resolution: u32, max_dimension: u32) -> RenderResult<()> {
        if resolution == 0 {
            return Err(RenderError::Capability(
                "simulation resolution must be greater than 0".to_string(),
            ));
        }
        if resolution > max_dimension {
            return Err(RenderError::Capability(format!(
                "simulation resolution {} exceeds device limit {}",
                resolution, max_dimension
            )));
        }
        Ok(())
    }
}
