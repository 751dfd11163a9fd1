//! 统一错误处理模块
//!
//! 提供特效范围内的统一错误类型定义。
//!
//! ## 错误类型分层
//!
//! - **顶层错误** (`EffectError`): 特效实例构建、窗口和事件循环的错误
//! - **渲染层错误** (`RenderError`): GPU 能力探测、着色器和管线创建的错误
//!
//! 所有构建期错误都会中止整个实例，不会产生部分初始化的特效。
//! 帧内的瞬时 GPU 故障不做捕获，由驱动层面处理。

use thiserror::Error;

/// 特效顶层错误类型
#[derive(Error, Debug)]
pub enum EffectError {
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Window creation failed: {0}")]
    Window(String),

    #[error("Event loop error: {0}")]
    EventLoop(String),
}

/// 渲染系统错误
///
/// 注意：原始 WebGL 实现里的 "invalid uniform name" 警告在这里没有对应物。
/// wgpu 通过类型化的绑定组布局绑定 uniform，名字查找失败这种错误
/// 在类型层面不可表达。
#[derive(Error, Debug, Clone)]
pub enum RenderError {
    #[error("Required texture capability unsupported: {0}")]
    Capability(String),

    #[error("Failed to request adapter: no compatible GPU found")]
    NoAdapter,

    #[error("Failed to request device: {0}")]
    DeviceRequest(String),

    #[error("Failed to create shader: {0}")]
    ShaderCompilation(String),

    #[error("Failed to create pipeline: {0}")]
    PipelineCreation(String),

    #[error("Failed to create texture: {0}")]
    TextureCreation(String),

    #[error("Surface error: {0}")]
    Surface(String),
}

/// 特效结果类型别名
pub type EffectResult<T> = Result<T, EffectError>;
pub type RenderResult<T> = Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let render_err = RenderError::Capability("grid 70000 exceeds limit 16384".to_string());
        let effect_err: EffectError = render_err.into();
        assert!(matches!(effect_err, EffectError::Render(_)));
    }

    #[test]
    fn test_error_display() {
        let err = RenderError::NoAdapter;
        assert_eq!(
            err.to_string(),
            "Failed to request adapter: no compatible GPU found"
        );
    }

    #[test]
    fn test_capability_error_display() {
        let err = RenderError::Capability("no float texture support".to_string());
        assert!(err.to_string().contains("no float texture support"));
    }
}
