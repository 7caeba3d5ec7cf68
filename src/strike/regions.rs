//! Region extraction
//!
//! Traces the borders of the mark mask and keeps only outermost borders,
//! so a blob sitting inside the hole of another blob is covered by the
//! outer blob's rectangle instead of being reported on its own.

use image::{imageops, GrayImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

use super::segment::MarkMask;
use super::types::Region;

/// One connected mark: compressed outer boundary and its bounding box
#[derive(Debug, Clone, PartialEq)]
pub struct MarkComponent {
    pub boundary: Vec<Point<i32>>,
    pub rect: Region,
}

/// Outer components of `mask` in raster discovery order
pub fn extract_components(mask: &MarkMask) -> Vec<MarkComponent> {
    find_contours::<i32>(&with_border(mask.as_gray()))
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| {
            let points: Vec<Point<i32>> = c
                .points
                .iter()
                .map(|p| Point::new(p.x - 1, p.y - 1))
                .collect();
            let rect = bounding_rect(&points)?;
            Some(MarkComponent {
                boundary: compress_boundary(&points),
                rect,
            })
        })
        .collect()
}

/// Copy of `gray` with a one pixel background frame
///
/// Border following never starts a trace on the image's first column, so
/// blobs touching the left edge would otherwise be skipped.
fn with_border(gray: &GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();
    let mut framed = GrayImage::new(width + 2, height + 2);
    imageops::replace(&mut framed, gray, 1, 1);
    framed
}

/// Bounding rectangles of the outer components of `mask`
pub fn extract_regions(mask: &MarkMask) -> Vec<Region> {
    extract_components(mask).into_iter().map(|c| c.rect).collect()
}

/// Minimal axis-aligned rectangle enclosing `points`
pub fn bounding_rect(points: &[Point<i32>]) -> Option<Region> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Region::new(
        min_x,
        min_y,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}

/// Drop boundary points lying on a straight run, keeping the run endpoints
pub fn compress_boundary(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n <= 2 {
        return points.to_vec();
    }

    let step = |a: Point<i32>, b: Point<i32>| ((b.x - a.x).signum(), (b.y - a.y).signum());

    let kept: Vec<Point<i32>> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            step(prev, cur) != step(cur, next)
        })
        .map(|i| points[i])
        .collect();

    if kept.is_empty() {
        vec![points[0]]
    } else {
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn mask_with(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> MarkMask {
        let mut gray = GrayImage::new(width, height);
        for &(x, y, w, h) in rects {
            for yy in y..y + h {
                for xx in x..x + w {
                    gray.put_pixel(xx, yy, Luma([255]));
                }
            }
        }
        MarkMask::from_gray(gray)
    }

    #[test]
    fn test_empty_mask_has_no_regions() {
        let mask = MarkMask::empty(50, 50);
        assert!(extract_regions(&mask).is_empty());
    }

    #[test]
    fn test_single_bar() {
        let mask = mask_with(100, 60, &[(10, 20, 40, 3)]);
        let regions = extract_regions(&mask);
        assert_eq!(regions, vec![Region::new(10, 20, 40, 3)]);
    }

    #[test]
    fn test_single_pixel() {
        let mask = mask_with(10, 10, &[(4, 5, 1, 1)]);
        assert_eq!(extract_regions(&mask), vec![Region::new(4, 5, 1, 1)]);
    }

    #[test]
    fn test_two_blobs_in_discovery_order() {
        let mask = mask_with(100, 100, &[(60, 10, 20, 2), (5, 50, 30, 4)]);
        let regions = extract_regions(&mask);
        assert_eq!(
            regions,
            vec![Region::new(60, 10, 20, 2), Region::new(5, 50, 30, 4)]
        );
    }

    #[test]
    fn test_diagonal_pixels_are_connected() {
        let mut gray = GrayImage::new(10, 10);
        gray.put_pixel(2, 2, Luma([255]));
        gray.put_pixel(3, 3, Luma([255]));
        gray.put_pixel(4, 4, Luma([255]));
        let regions = extract_regions(&MarkMask::from_gray(gray));
        assert_eq!(regions, vec![Region::new(2, 2, 3, 3)]);
    }

    #[test]
    fn test_nested_blob_is_not_reported() {
        // Ring 20x20 with a 2px wall, plus a dot inside the hole
        let mut mask = mask_with(
            40,
            40,
            &[(5, 5, 20, 2), (5, 23, 20, 2), (5, 5, 2, 20), (23, 5, 2, 20)],
        );
        let mut gray = mask.clone().into_gray();
        for y in 13..16 {
            for x in 13..16 {
                gray.put_pixel(x, y, Luma([255]));
            }
        }
        mask = MarkMask::from_gray(gray);

        let regions = extract_regions(&mask);
        assert_eq!(regions, vec![Region::new(5, 5, 20, 20)]);
    }

    #[test]
    fn test_blob_touching_image_edge() {
        let mask = mask_with(30, 30, &[(0, 0, 30, 2)]);
        assert_eq!(extract_regions(&mask), vec![Region::new(0, 0, 30, 2)]);
    }

    #[test]
    fn test_blob_on_left_edge_only() {
        let mask = mask_with(40, 40, &[(0, 20, 10, 2)]);
        assert_eq!(extract_regions(&mask), vec![Region::new(0, 20, 10, 2)]);
    }

    #[test]
    fn test_blob_in_every_corner() {
        let mask = mask_with(
            40,
            40,
            &[(0, 0, 3, 3), (37, 0, 3, 3), (0, 37, 3, 3), (37, 37, 3, 3)],
        );
        assert_eq!(
            extract_regions(&mask),
            vec![
                Region::new(0, 0, 3, 3),
                Region::new(37, 0, 3, 3),
                Region::new(0, 37, 3, 3),
                Region::new(37, 37, 3, 3),
            ]
        );
    }

    #[test]
    fn test_l_shape_reaching_left_edge_below_first_pixel() {
        // First raster pixel is (5, 10); the leg reaches x = 0 on row 11
        let mask = mask_with(40, 40, &[(5, 10, 10, 2), (0, 11, 6, 5)]);
        assert_eq!(extract_regions(&mask), vec![Region::new(0, 10, 15, 6)]);
    }

    #[test]
    fn test_full_mask_is_one_region() {
        let mask = mask_with(12, 8, &[(0, 0, 12, 8)]);
        let components = extract_components(&mask);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].rect, Region::new(0, 0, 12, 8));
        assert!(components[0].boundary.contains(&Point::new(0, 0)));
        assert!(components[0].boundary.contains(&Point::new(11, 7)));
    }

    #[test]
    fn test_compress_rectangle_boundary() {
        let mask = mask_with(20, 20, &[(2, 2, 8, 5)]);
        let components = extract_components(&mask);
        assert_eq!(components.len(), 1);
        let boundary = &components[0].boundary;
        assert_eq!(boundary.len(), 4);
        assert!(boundary.contains(&Point::new(2, 2)));
        assert!(boundary.contains(&Point::new(9, 6)));
    }

    #[test]
    fn test_compress_short_chains() {
        let pts = vec![Point::new(1, 1), Point::new(2, 1)];
        assert_eq!(compress_boundary(&pts), pts);
        assert!(compress_boundary(&[]).is_empty());
    }

    #[test]
    fn test_bounding_rect() {
        let pts = vec![Point::new(3, 7), Point::new(9, 2), Point::new(5, 5)];
        assert_eq!(bounding_rect(&pts), Some(Region::new(3, 2, 7, 6)));
        assert_eq!(bounding_rect(&[]), None);
    }
}
