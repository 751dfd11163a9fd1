//! 模拟缓冲
//!
//! 高度场的双缓冲存储：两张 `resolution × resolution` 的浮点纹理，
//! R 通道存高度，G 通道存速度，B/A 通道保留不用。
//!
//! 任意时刻恰好一张是"读"（上一步的结果），另一张是"写"（本步的目标）。
//! 通道完成后调用 [`SimulationBuffers::swap`] 原子地交换角色 ——
//! 只翻转索引位，O(1)，不拷贝数据，也不做任何重采样。

use crate::core::error::RenderResult;
use crate::render::capability::TextureConfig;

/// 双缓冲读写索引对
///
/// "arena-of-two" 模式：两个命名槽位加一个角色位，交换只翻转这个位，
/// 不需要重新绑定任何引用。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingPong {
    read: usize,
    write: usize,
}

impl PingPong {
    /// 创建初始索引对（写 0 读 1）
    pub fn new() -> Self {
        Self { read: 1, write: 0 }
    }

    /// 当前读槽位
    pub fn read(&self) -> usize {
        self.read
    }

    /// 当前写槽位
    pub fn write(&self) -> usize {
        self.write
    }

    /// 交换读写角色
    pub fn swap(&mut self) {
        self.read = 1 - self.read;
        self.write = 1 - self.write;
    }
}

impl Default for PingPong {
    fn default() -> Self {
        Self::new()
    }
}

/// 模拟缓冲
///
/// 拥有两张高度场纹理及其视图。构建时一次性分配并清零，
/// 生命周期内不缩放，实例销毁时随之释放。
pub struct SimulationBuffers {
    textures: [wgpu::Texture; 2],
    views: [wgpu::TextureView; 2],
    indices: PingPong,
    resolution: u32,
}

impl SimulationBuffers {
    /// 分配两张预清零的高度场纹理
    ///
    /// 两种受支持的浮点格式全零字节模式都解码为 0.0，
    /// 所以统一用 CPU 端零填充上传，不需要单独的 GPU 清除通道。
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        resolution: u32,
        config: &TextureConfig,
    ) -> RenderResult<Self> {
        config.ensure_grid_supported(resolution, device.limits().max_texture_dimension_2d)?;

        let bytes_per_texel = config.bytes_per_texel();
        let zeroes =
            vec![0u8; resolution as usize * resolution as usize * bytes_per_texel as usize];
        let size = wgpu::Extent3d {
            width: resolution,
            height: resolution,
            depth_or_array_layers: 1,
        };

        let make_texture = |label: &str| {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: config.format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });

            queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &zeroes,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_texel * resolution),
                    rows_per_image: Some(resolution),
                },
                size,
            );

            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            (texture, view)
        };

        let (texture_a, view_a) = make_texture("Simulation Texture A");
        let (texture_b, view_b) = make_texture("Simulation Texture B");

        tracing::debug!(
            target: "render",
            resolution,
            format = ?config.format,
            "Allocated simulation buffers"
        );

        Ok(Self {
            textures: [texture_a, texture_b],
            views: [view_a, view_b],
            indices: PingPong::new(),
            resolution,
        })
    }

    /// 读缓冲视图（上一步的结果）
    pub fn read_view(&self) -> &wgpu::TextureView {
        &self.views[self.indices.read()]
    }

    /// 写缓冲视图（本步的目标）
    pub fn write_view(&self) -> &wgpu::TextureView {
        &self.views[self.indices.write()]
    }

    /// 交换读写角色
    ///
    /// 在传播或注入通道完成后由调用方执行；通道本身绝不读写同一张纹理。
    pub fn swap(&mut self) {
        self.indices.swap();
    }

    /// 模拟网格边长
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// 单个纹素在归一化模拟空间里的尺寸
    pub fn texel_delta(&self) -> [f32; 2] {
        let d = 1.0 / self.resolution as f32;
        [d, d]
    }

    /// 底层纹理（测试和诊断用）
    pub fn texture(&self, slot: usize) -> &wgpu::Texture {
        &self.textures[slot]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_pong_initial_roles() {
        let indices = PingPong::new();
        assert_eq!(indices.write(), 0);
        assert_eq!(indices.read(), 1);
    }

    #[test]
    fn test_swap_exchanges_roles() {
        let mut indices = PingPong::new();
        indices.swap();
        assert_eq!(indices.write(), 1);
        assert_eq!(indices.read(), 0);
    }

    #[test]
    fn test_swap_is_involution() {
        let mut indices = PingPong::new();
        let original = indices;
        indices.swap();
        indices.swap();
        assert_eq!(indices, original);
    }

    #[test]
    fn test_roles_never_alias() {
        let mut indices = PingPong::new();
        for _ in 0..7 {
            assert_ne!(indices.read(), indices.write());
            indices.swap();
        }
    }
}
