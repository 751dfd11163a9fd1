use glam::Vec2;
use proptest::prelude::*;
use ripples::config::RipplesConfig;
use ripples::core::{EffectState, FrameScheduler};
use ripples::input::ElementGeometry;
use ripples::render::capability::TextureConfig;
use ripples::render::composite_pass::ripples_ratio;
use ripples::render::PingPong;

#[test]
fn test_config_integration() {
    // 默认配置直接可用
    let config = RipplesConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.resolution, 256);

    // TOML 覆盖后仍验证
    let config = RipplesConfig::from_toml_str("resolution = 128\ndrop_radius = 8.0").unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.resolution, 128);
}

#[test]
fn test_scheduler_lifecycle_integration() {
    // 运行 → 销毁是唯一的状态路径
    let mut scheduler = FrameScheduler::new();
    assert!(scheduler.begin_frame());
    assert!(scheduler.begin_frame());

    scheduler.destroy();
    assert_eq!(scheduler.state(), EffectState::Destroyed);

    // 销毁后不再产生帧，重复销毁安全
    assert!(!scheduler.begin_frame());
    scheduler.destroy();
    assert_eq!(scheduler.frames(), 2);
}

#[test]
fn test_pointer_to_compositor_coordinate_agreement() {
    // 指针映射与合成通道使用同一套最长边归一化：
    // 元素中心必须落在 0.5 * ripples_ratio
    for (w, h) in [(400, 400), (800, 400), (400, 800), (1920, 1080)] {
        let geometry = ElementGeometry::window(w, h);
        let drop = geometry
            .map_drop(w as f32 / 2.0, h as f32 / 2.0, 20.0)
            .unwrap();
        let ratio = ripples_ratio(w, h);
        assert_eq!(drop.center, Vec2::new(0.5 * ratio[0], 0.5 * ratio[1]));
    }
}

#[test]
fn test_capability_chain() {
    // 能力探测在任何特性组合下都给出可渲染的浮点格式
    for (f32_filterable, half) in [(true, true), (false, true), (false, false)] {
        let config = TextureConfig::select(f32_filterable, half);
        assert!(matches!(
            config.format,
            wgpu::TextureFormat::Rgba32Float | wgpu::TextureFormat::Rgba16Float
        ));
    }
    // 全精度过滤可用时必须选择全精度
    assert_eq!(
        TextureConfig::select(true, true).format,
        wgpu::TextureFormat::Rgba32Float
    );
}

#[test]
fn test_drop_scenario_radius_mapping() {
    // 端到端水滴场景的坐标部分：256 像素窗口、20px 水滴，
    // 落点和半径都按最长边归一化
    let geometry = ElementGeometry::window(256, 256);
    let drop = geometry.map_drop(128.0, 128.0, 20.0).unwrap();
    assert_eq!(drop.center, Vec2::new(0.5, 0.5));
    assert_eq!(drop.radius, 20.0 / 256.0);
}

proptest! {
    #[test]
    fn prop_swap_twice_is_identity(swaps in 0usize..64) {
        let mut indices = PingPong::new();
        for _ in 0..swaps {
            indices.swap();
        }
        let before = indices;
        indices.swap();
        indices.swap();
        prop_assert_eq!(before, indices);
    }

    #[test]
    fn prop_read_write_never_alias(swaps in 0usize..64) {
        let mut indices = PingPong::new();
        for _ in 0..swaps {
            indices.swap();
        }
        prop_assert_ne!(indices.read(), indices.write());
    }

    #[test]
    fn prop_mapped_drop_stays_in_unit_square(
        x in -5000.0f32..5000.0,
        y in -5000.0f32..5000.0,
        w in 1u32..4096,
        h in 1u32..4096,
    ) {
        // 越界指针钳制到元素边缘，映射结果永远落在 [0,1]²
        let geometry = ElementGeometry::window(w, h);
        if let Some(drop) = geometry.map_drop(x, y, 20.0) {
            prop_assert!(drop.center.x >= 0.0 && drop.center.x <= 1.0);
            prop_assert!(drop.center.y >= 0.0 && drop.center.y <= 1.0);
        }
    }

    #[test]
    fn prop_ratio_is_min_over_max(w in 1u32..8192, h in 1u32..8192) {
        let [rx, ry] = ripples_ratio(w, h);
        // 恰好一个轴是 1，另一个是 min/max
        prop_assert!((rx - 1.0).abs() < f32::EPSILON || (ry - 1.0).abs() < f32::EPSILON);
        let expected = w.min(h) as f32 / w.max(h) as f32;
        prop_assert!((rx.min(ry) - expected).abs() < 1e-6);
    }
}
