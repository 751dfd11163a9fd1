//! 特效实例
//!
//! `RippleEffect` 是水波特效的根对象，负责：
//! - 初始化 GPU（表面、适配器、设备、队列）和三个渲染通道
//! - 编排每帧的通道顺序：传播 → 交换 → 合成
//! - 把指针事件换算成水滴注入：注入 → 交换
//!
//! 并发模型是单线程协作式的：水滴注入在事件上下文同步执行，
//! 帧循环由宿主的重绘回调驱动，两者在同一执行上下文交错，
//! 顺序完全由调用序列保证，不存在并行修改。

use std::sync::Arc;

use winit::window::Window;

use crate::config::RipplesConfig;
use crate::core::error::{EffectResult, RenderError, RenderResult};
use crate::core::scheduler::FrameScheduler;
use crate::input::ElementGeometry;
use crate::render::{
    CompositePass, DropPass, SimulationBuffers, TextureConfig, UpdatePass,
};

/// 指针移动时的持续小扰动强度
const MOVE_STRENGTH: f32 = 0.015;
/// 按压时的一次性大扰动强度
const PRESS_STRENGTH: f32 = 0.15;
/// 按压扰动的半径放大倍数
const PRESS_RADIUS_SCALE: f32 = 1.5;

/// 非有限强度会随阻尼更新扩散并永久污染高度场，注入前拒绝
fn finite_strength(strength: f32) -> Option<f32> {
    strength.is_finite().then_some(strength)
}

/// 从表面能力列表里选首选的格式、呈现模式和混合模式
///
/// 任何一个列表为空都说明适配器不支持该表面，作为构建错误上浮。
fn select_surface_mode(
    formats: &[wgpu::TextureFormat],
    present_modes: &[wgpu::PresentMode],
    alpha_modes: &[wgpu::CompositeAlphaMode],
) -> RenderResult<(
    wgpu::TextureFormat,
    wgpu::PresentMode,
    wgpu::CompositeAlphaMode,
)> {
    let format = formats
        .first()
        .copied()
        .ok_or_else(|| RenderError::Surface("adapter reports no surface formats".to_string()))?;
    let present_mode = present_modes
        .first()
        .copied()
        .ok_or_else(|| RenderError::Surface("adapter reports no present modes".to_string()))?;
    let alpha_mode = alpha_modes
        .first()
        .copied()
        .ok_or_else(|| RenderError::Surface("adapter reports no alpha modes".to_string()))?;
    Ok((format, present_mode, alpha_mode))
}

/// 水波特效实例
///
/// 所有 GPU 资源（两张模拟纹理、背景纹理、三条管线）在构建时一次性
/// 分配，实例销毁时释放。构建期的任何错误都会中止整个实例。
pub struct RippleEffect {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    config: RipplesConfig,
    geometry: ElementGeometry,
    buffers: SimulationBuffers,
    drop_pass: DropPass,
    update_pass: UpdatePass,
    composite_pass: CompositePass,
    scheduler: FrameScheduler,
}

impl RippleEffect {
    /// 创建特效实例
    ///
    /// 三个着色器程序都急切编译，编译或管线校验错误立即上浮；
    /// 要求的浮点纹理能力缺失时返回 [`RenderError::Capability`]，
    /// 不会产生部分初始化的实例。
    pub async fn new(
        window: Arc<Window>,
        config: RipplesConfig,
        background: &image::DynamicImage,
    ) -> EffectResult<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| RenderError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        // 只在适配器支持时申请全精度浮点过滤
        let mut required_features = wgpu::Features::empty();
        if adapter
            .features()
            .contains(wgpu::Features::FLOAT32_FILTERABLE)
        {
            required_features |= wgpu::Features::FLOAT32_FILTERABLE;
        }

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features,
                    required_limits: wgpu::Limits::default(),
                    label: None,
                },
                None,
            )
            .await
            .map_err(|e| RenderError::DeviceRequest(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let (format, present_mode, alpha_mode) =
            select_surface_mode(&caps.formats, &caps.present_modes, &caps.alpha_modes)?;
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let texture_config = TextureConfig::global(&device);
        let buffers =
            SimulationBuffers::new(&device, &queue, config.resolution, &texture_config)?;

        // 管线校验错误通过错误作用域同步上浮
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let drop_pass = DropPass::new(&device, &texture_config)?;
        let update_pass = UpdatePass::new(&device, &texture_config)?;
        let composite_pass =
            CompositePass::new(&device, &queue, format, &texture_config, background)?;
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::PipelineCreation(err.to_string()).into());
        }

        let geometry = ElementGeometry::window(surface_config.width, surface_config.height);

        tracing::info!(
            target: "effect",
            resolution = config.resolution,
            surface = ?(surface_config.width, surface_config.height),
            "Ripple effect created"
        );

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            config,
            geometry,
            buffers,
            drop_pass,
            update_pass,
            composite_pass,
            scheduler: FrameScheduler::new(),
        })
    }

    /// 在给定的宿主像素坐标处注入一个水滴
    ///
    /// 坐标经指针映射换算到模拟空间；注入通道执行后立即交换缓冲。
    /// 销毁后调用是无副作用的 no-op。
    pub fn drop_at(&mut self, x: f32, y: f32, radius_px: f32, strength: f32) {
        if !self.scheduler.is_running() {
            tracing::warn!(target: "effect", "Drop ignored: effect already destroyed");
            return;
        }

        let Some(point) = self.geometry.map_drop(x, y, radius_px) else {
            tracing::warn!(
                target: "effect",
                x, y, radius_px,
                "Drop ignored: non-finite pointer input"
            );
            return;
        };
        let Some(strength) = finite_strength(strength) else {
            tracing::warn!(target: "effect", strength, "Drop ignored: non-finite strength");
            return;
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Drop Encoder"),
            });
        self.drop_pass.render(
            &mut encoder,
            &self.device,
            &self.queue,
            self.buffers.read_view(),
            self.buffers.write_view(),
            point.center,
            point.radius,
            strength,
        );
        self.queue.submit(Some(encoder.finish()));
        self.buffers.swap();
    }

    /// 指针移动：持续的小扰动
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if !self.config.interactive {
            return;
        }
        self.drop_at(x, y, self.config.drop_radius, MOVE_STRENGTH);
    }

    /// 指针按压：更大的一次性扰动
    pub fn pointer_press(&mut self, x: f32, y: f32) {
        if !self.config.interactive {
            return;
        }
        self.drop_at(
            x,
            y,
            self.config.drop_radius * PRESS_RADIUS_SCALE,
            PRESS_STRENGTH,
        );
    }

    /// 执行一个视觉帧：恰好一次传播 + 交换，然后恰好一次合成
    ///
    /// 销毁后调用不提交任何 GPU 工作。表面丢失/过期时重新配置并跳过本帧。
    pub fn frame(&mut self) -> EffectResult<()> {
        if !self.scheduler.begin_frame() {
            return Ok(());
        }

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                tracing::warn!(target: "render", "Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                return Ok(());
            }
            Err(e) => return Err(RenderError::Surface(e.to_string()).into()),
        };
        let output_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        let delta = self.buffers.texel_delta();
        self.update_pass.render(
            &mut encoder,
            &self.device,
            &self.queue,
            self.buffers.read_view(),
            self.buffers.write_view(),
            delta,
        );
        self.buffers.swap();

        // 合成读的是交换后的读缓冲，即刚写完的那一步
        self.composite_pass.render(
            &mut encoder,
            &self.device,
            &self.queue,
            self.buffers.read_view(),
            &output_view,
            (self.surface_config.width, self.surface_config.height),
            delta,
            self.config.perturbance,
        );

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// 宿主表面尺寸变化
    ///
    /// 只重新配置表面和指针几何；模拟网格固定不变，不做重采样。
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
        self.geometry = ElementGeometry::window(width, height);
    }

    /// 停止帧循环
    ///
    /// 幂等；唯一的取消途径。之后的 `drop_at`/`frame` 都是 no-op，
    /// GPU 资源随实例析构释放，在途的 GPU 工作不做等待。
    pub fn destroy(&mut self) {
        self.scheduler.destroy();
    }

    /// 是否仍在运行
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// 已渲染的帧数
    pub fn frames(&self) -> u64 {
        self.scheduler.frames()
    }

    /// 实例配置
    pub fn config(&self) -> &RipplesConfig {
        &self.config
    }

    /// 指针几何
    pub fn geometry(&self) -> &ElementGeometry {
        &self.geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_strength_rejects_nonfinite() {
        assert!(finite_strength(f32::NAN).is_none());
        assert!(finite_strength(f32::INFINITY).is_none());
        assert!(finite_strength(f32::NEG_INFINITY).is_none());
        assert_eq!(finite_strength(MOVE_STRENGTH), Some(MOVE_STRENGTH));
        assert_eq!(finite_strength(-0.5), Some(-0.5));
    }

    #[test]
    fn test_surface_mode_picks_first_entries() {
        let formats = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        let present_modes = [wgpu::PresentMode::Fifo, wgpu::PresentMode::Mailbox];
        let alpha_modes = [wgpu::CompositeAlphaMode::Opaque];
        let (format, present_mode, alpha_mode) =
            select_surface_mode(&formats, &present_modes, &alpha_modes).unwrap();
        assert_eq!(format, wgpu::TextureFormat::Bgra8UnormSrgb);
        assert_eq!(present_mode, wgpu::PresentMode::Fifo);
        assert_eq!(alpha_mode, wgpu::CompositeAlphaMode::Opaque);
    }

    #[test]
    fn test_surface_mode_rejects_empty_capabilities() {
        // 任何一个能力列表为空都是构建错误，不允许下标越界
        let formats = [wgpu::TextureFormat::Bgra8UnormSrgb];
        let present_modes = [wgpu::PresentMode::Fifo];
        let alpha_modes = [wgpu::CompositeAlphaMode::Opaque];
        assert!(matches!(
            select_surface_mode(&[], &present_modes, &alpha_modes),
            Err(RenderError::Surface(_))
        ));
        assert!(matches!(
            select_surface_mode(&formats, &[], &alpha_modes),
            Err(RenderError::Surface(_))
        ));
        assert!(matches!(
            select_surface_mode(&formats, &present_modes, &[]),
            Err(RenderError::Surface(_))
        ));
    }
}
