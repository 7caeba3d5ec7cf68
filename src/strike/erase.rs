//! Region erasing
//!
//! Fills each detected region, grown by a margin, with a solid color in the
//! source image. Rectangles are clipped against the image before drawing.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use super::types::Region;

impl Region {
    /// Grow by `margin_x` on the left and right and `margin_y` on top and bottom
    pub fn expand(&self, margin_x: u32, margin_y: u32) -> Region {
        let x = self.x as i64 - margin_x as i64;
        let y = self.y as i64 - margin_y as i64;
        let width = self.width as u64 + 2 * margin_x as u64;
        let height = self.height as u64 + 2 * margin_y as u64;
        Region::new(
            x.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
            y.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
            width.min(u32::MAX as u64) as u32,
            height.min(u32::MAX as u64) as u32,
        )
    }

    /// Intersection with a `width` x `height` image, `None` if nothing is left
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Region> {
        let left = (self.x as i64).max(0);
        let top = (self.y as i64).max(0);
        let right = self.right().min(width as i64);
        let bottom = self.bottom().min(height as i64);

        if left >= right || top >= bottom {
            return None;
        }

        Some(Region::new(
            left as i32,
            top as i32,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }
}

/// Fill every region, expanded by the margins and clipped to the image
pub fn erase(
    image: &mut RgbImage,
    regions: &[Region],
    fill: Rgb<u8>,
    margin_x: u32,
    margin_y: u32,
) {
    let (width, height) = image.dimensions();
    for region in regions {
        if let Some(r) = region.expand(margin_x, margin_y).clamp_to(width, height) {
            draw_filled_rect_mut(image, Rect::at(r.x, r.y).of_size(r.width, r.height), fill);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strike::types::FILL_WHITE;

    #[test]
    fn test_expand() {
        let r = Region::new(10, 40, 30, 3).expand(2, 18);
        assert_eq!(r, Region::new(8, 22, 34, 39));
    }

    #[test]
    fn test_clamp_inside() {
        let r = Region::new(5, 5, 10, 10);
        assert_eq!(r.clamp_to(100, 100), Some(r));
    }

    #[test]
    fn test_clamp_negative_origin() {
        let r = Region::new(-2, -18, 34, 39);
        assert_eq!(r.clamp_to(100, 100), Some(Region::new(0, 0, 32, 21)));
    }

    #[test]
    fn test_clamp_oversized() {
        let r = Region::new(90, 95, 40, 40);
        assert_eq!(r.clamp_to(100, 100), Some(Region::new(90, 95, 10, 5)));
    }

    #[test]
    fn test_clamp_outside() {
        assert_eq!(Region::new(100, 0, 5, 5).clamp_to(100, 100), None);
        assert_eq!(Region::new(-10, 0, 10, 5).clamp_to(100, 100), None);
        assert_eq!(Region::new(0, 0, 0, 5).clamp_to(100, 100), None);
    }

    #[test]
    fn test_erase_fills_expanded_rect() {
        let mut image = RgbImage::from_pixel(60, 60, Rgb([10, 10, 10]));
        erase(&mut image, &[Region::new(20, 30, 10, 2)], FILL_WHITE, 2, 5);

        let filled = Region::new(18, 25, 14, 12);
        for (x, y, p) in image.enumerate_pixels() {
            if filled.contains(x as i64, y as i64) {
                assert_eq!(*p, FILL_WHITE, "({}, {}) should be filled", x, y);
            } else {
                assert_eq!(*p, Rgb([10, 10, 10]), "({}, {}) should be untouched", x, y);
            }
        }
    }

    #[test]
    fn test_erase_at_corner_does_not_panic() {
        let mut image = RgbImage::from_pixel(30, 30, Rgb([0, 0, 0]));
        erase(
            &mut image,
            &[Region::new(0, 0, 3, 1), Region::new(28, 29, 2, 1)],
            FILL_WHITE,
            2,
            18,
        );
        assert_eq!(image.dimensions(), (30, 30));
        assert_eq!(*image.get_pixel(0, 0), FILL_WHITE);
        assert_eq!(*image.get_pixel(29, 29), FILL_WHITE);
        assert_eq!(*image.get_pixel(15, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_erase_no_regions_is_noop() {
        let mut image = RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]));
        let before = image.clone();
        erase(&mut image, &[], FILL_WHITE, 2, 18);
        assert_eq!(image, before);
    }
}
