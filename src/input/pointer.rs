//! Pointer-to-simulation-space coordinate mapping.
//!
//! Raw pointer positions arrive in page pixels. A drop needs a center in the
//! normalized simulation space the compositor samples with `ripples_ratio`,
//! so both axes are divided by the longest element side. The drop radius is
//! normalized by the same side, which keeps a drop under the cursor for any
//! element aspect ratio.

use glam::Vec2;

/// Host surface placement in page coordinates.
///
/// `offset` and `border` exist for embedded hosts; a plain window is the
/// whole page, so both are zero there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementGeometry {
    /// Element offset in the page
    pub offset: Vec2,
    /// Border insets (left, top)
    pub border: Vec2,
    /// Inner width in pixels
    pub width: f32,
    /// Inner height in pixels
    pub height: f32,
}

/// A mapped drop: center and radius in normalized simulation space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropPoint {
    pub center: Vec2,
    pub radius: f32,
}

impl ElementGeometry {
    /// Geometry for a plain window surface (no offset, no border).
    pub fn window(width: u32, height: u32) -> Self {
        Self {
            offset: Vec2::ZERO,
            border: Vec2::ZERO,
            width: width as f32,
            height: height as f32,
        }
    }

    /// Longest side, used to normalize both axes into `[0, 1]`.
    pub fn longest_side(&self) -> f32 {
        self.width.max(self.height).max(1.0)
    }

    /// Map a page-pixel pointer position and pixel radius to simulation space.
    ///
    /// Out-of-bounds positions clamp to the element edge. Non-finite input is
    /// rejected with `None` rather than silently coerced to zero.
    ///
    /// wgpu textures have a top-left origin, so local y maps directly; the
    /// bottom-left flip of the WebGL original is absorbed by that convention.
    pub fn map_drop(&self, page_x: f32, page_y: f32, radius_px: f32) -> Option<DropPoint> {
        if !(page_x.is_finite() && page_y.is_finite() && radius_px.is_finite()) {
            return None;
        }
        if radius_px <= 0.0 {
            return None;
        }

        let local_x = (page_x - self.offset.x - self.border.x).clamp(0.0, self.width);
        let local_y = (page_y - self.offset.y - self.border.y).clamp(0.0, self.height);

        let longest = self.longest_side();
        Some(DropPoint {
            center: Vec2::new(local_x / longest, local_y / longest),
            radius: radius_px / longest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_of_square_element_maps_to_half() {
        let geometry = ElementGeometry::window(400, 400);
        let drop = geometry.map_drop(200.0, 200.0, 20.0).unwrap();
        assert_eq!(drop.center, Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_center_matches_ripples_ratio_scaling() {
        // 中心映射到 0.5 * ripples_ratio，与合成通道的坐标系一致
        let geometry = ElementGeometry::window(800, 400);
        let drop = geometry.map_drop(400.0, 200.0, 20.0).unwrap();
        assert_eq!(drop.center, Vec2::new(0.5, 0.25));

        let ratio = crate::render::composite_pass::ripples_ratio(800, 400);
        assert_eq!(drop.center, Vec2::new(0.5 * ratio[0], 0.5 * ratio[1]));
    }

    #[test]
    fn test_radius_normalized_by_longest_side() {
        let geometry = ElementGeometry::window(800, 400);
        let drop = geometry.map_drop(0.0, 0.0, 20.0).unwrap();
        assert_eq!(drop.radius, 20.0 / 800.0);
    }

    #[test]
    fn test_offset_and_border_are_subtracted() {
        let geometry = ElementGeometry {
            offset: Vec2::new(100.0, 50.0),
            border: Vec2::new(2.0, 3.0),
            width: 200.0,
            height: 200.0,
        };
        let drop = geometry.map_drop(202.0, 153.0, 10.0).unwrap();
        assert_eq!(drop.center, Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_out_of_bounds_clamps_to_edge() {
        let geometry = ElementGeometry::window(400, 400);

        let low = geometry.map_drop(-50.0, -50.0, 10.0).unwrap();
        assert_eq!(low.center, Vec2::ZERO);

        let high = geometry.map_drop(900.0, 900.0, 10.0).unwrap();
        assert_eq!(high.center, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        let geometry = ElementGeometry::window(400, 400);
        assert!(geometry.map_drop(f32::NAN, 10.0, 10.0).is_none());
        assert!(geometry.map_drop(10.0, f32::INFINITY, 10.0).is_none());
        assert!(geometry.map_drop(10.0, 10.0, f32::NAN).is_none());
    }

    #[test]
    fn test_zero_radius_is_rejected() {
        let geometry = ElementGeometry::window(400, 400);
        assert!(geometry.map_drop(10.0, 10.0, 0.0).is_none());
    }
}
