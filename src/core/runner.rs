//! 窗口化演示宿主
//!
//! 把特效实例接到 winit：加载配置和背景图，打开窗口，
//! 把指针/触摸事件转成水滴注入，用重绘回调当帧节奏 ——
//! 每个视觉帧恰好一次模拟步加一次合成。

use std::path::Path;
use std::sync::Arc;

use winit::event::{ElementState, Event, MouseButton, TouchPhase, WindowEvent};
use winit::event_loop::EventLoop;
use winit::window::WindowBuilder;

use crate::config::RipplesConfig;
use crate::core::effect::RippleEffect;
use crate::core::error::{EffectError, EffectResult};

/// 演示运行器
pub struct Runner;

impl Runner {
    /// 运行演示主循环
    pub fn run() -> EffectResult<()> {
        Self::initialize_logging();

        let config = RipplesConfig::load()?;
        let background = Self::load_background(&config);

        let event_loop = EventLoop::new()
            .map_err(|e| EffectError::EventLoop(format!("Event loop creation failed: {}", e)))?;
        let window = WindowBuilder::new()
            .with_title(&config.window.title)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                config.window.width,
                config.window.height,
            ))
            .build(&event_loop)
            .map_err(|e| EffectError::Window(e.to_string()))?;
        let window = Arc::new(window);

        let mut effect =
            pollster::block_on(RippleEffect::new(window.clone(), config, &background))?;

        let mut cursor = (0.0f32, 0.0f32);

        let result = event_loop.run(move |event, elwt| match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    effect.destroy();
                    elwt.exit();
                }
                WindowEvent::Resized(size) => {
                    effect.resize(size.width, size.height);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    cursor = (position.x as f32, position.y as f32);
                    effect.pointer_move(cursor.0, cursor.1);
                }
                WindowEvent::MouseInput {
                    state: ElementState::Pressed,
                    button: MouseButton::Left,
                    ..
                } => {
                    effect.pointer_press(cursor.0, cursor.1);
                }
                WindowEvent::Touch(touch) => match touch.phase {
                    TouchPhase::Started | TouchPhase::Moved => {
                        effect.pointer_move(touch.location.x as f32, touch.location.y as f32);
                    }
                    _ => {}
                },
                WindowEvent::RedrawRequested => {
                    if let Err(e) = effect.frame() {
                        tracing::error!(target: "render", "Frame failed: {}", e);
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        });

        result.map_err(|e| EffectError::EventLoop(format!("Event loop error: {}", e)))?;

        tracing::info!(target: "effect", "Runner shutting down");
        Ok(())
    }

    /// 初始化日志系统
    ///
    /// 日志级别通过 `RUST_LOG` 环境变量控制。
    fn initialize_logging() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
        tracing::info!(target: "effect", "Ripples starting");
    }

    /// 加载背景图
    ///
    /// 路径不存在或解码失败时退回到内置棋盘纹理，演示无需外部素材也能跑。
    fn load_background(config: &RipplesConfig) -> image::DynamicImage {
        let path = &config.background_image;
        if path.as_os_str().is_empty() || !Path::new(path).exists() {
            tracing::info!(target: "effect", "No background image, using checkerboard");
            return Self::checkerboard();
        }
        match image::open(path) {
            Ok(img) => img,
            Err(e) => {
                tracing::warn!(
                    target: "effect",
                    path = %path.display(),
                    "Failed to load background ({}), using checkerboard",
                    e
                );
                Self::checkerboard()
            }
        }
    }

    /// 内置棋盘背景
    fn checkerboard() -> image::DynamicImage {
        let tex_size = 512u32;
        let mut img = image::RgbaImage::new(tex_size, tex_size);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let c = if ((x / 64) % 2) ^ ((y / 64) % 2) == 0 {
                220
            } else {
                60
            };
            *pixel = image::Rgba([c, c, c, 255]);
        }
        image::DynamicImage::ImageRgba8(img)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkerboard_dimensions() {
        let img = Runner::checkerboard();
        assert_eq!(img.width(), 512);
        assert_eq!(img.height(), 512);
    }

    #[test]
    fn test_checkerboard_has_two_tones() {
        let img = Runner::checkerboard().to_rgba8();
        let light = img.get_pixel(0, 0);
        let dark = img.get_pixel(64, 0);
        assert_ne!(light, dark);
        assert_eq!(light.0[3], 255);
    }
}
