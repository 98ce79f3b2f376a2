//! Cropping a quadrilateral region into an upright bitmap.
//!
//! # Algorithm
//!
//! The crop window corners arrive in window order: top-left, top-right,
//! bottom-right, bottom-left as seen on screen, each mapped back into source
//! pixels. Rotation and flips are therefore already encoded in the corner
//! order, and a single inverse mapping covers every case:
//!
//! ```text
//! u = (out_x + 0.5) / out_w,  v = (out_y + 0.5) / out_h
//! src = p0 + u * (p1 - p0) + v * (p3 - p0) - 0.5
//! ```
//!
//! Each output pixel is sampled bilinearly from the four nearest source
//! pixels, clamping at the image edges.

use crate::geometry::Quad;

use super::DecodedImage;

/// Output size for a crop of `points`: the lengths of the top and left edges.
pub fn crop_output_size(points: &Quad) -> (u32, u32) {
    let p = &points.points;
    let width = (p[2] - p[0]).hypot(p[3] - p[1]).round();
    let height = (p[6] - p[0]).hypot(p[7] - p[1]).round();
    (to_dimension(width), to_dimension(height))
}

/// Sample the region under `points`, in `image` pixels, into an upright bitmap.
///
/// # Returns
///
/// An empty image when the region has no area or the source is empty.
pub fn crop_quad(image: &DecodedImage, points: &Quad) -> DecodedImage {
    let (out_w, out_h) = crop_output_size(points);
    if out_w == 0 || out_h == 0 || image.is_empty() {
        return DecodedImage::empty();
    }

    let p = &points.points;
    let (ox, oy) = (p[0], p[1]);
    let (ux, uy) = (p[2] - p[0], p[3] - p[1]);
    let (vx, vy) = (p[6] - p[0], p[7] - p[1]);

    let mut output = vec![0u8; out_w as usize * out_h as usize * 3];
    for (row, line) in output.chunks_exact_mut(out_w as usize * 3).enumerate() {
        let v = (row as f64 + 0.5) / f64::from(out_h);
        for (col, pixel) in line.chunks_exact_mut(3).enumerate() {
            let u = (col as f64 + 0.5) / f64::from(out_w);
            let sx = ox + u * ux + v * vx - 0.5;
            let sy = oy + u * uy + v * vy - 0.5;
            pixel.copy_from_slice(&sample_bilinear(image, sx, sy));
        }
    }

    DecodedImage::new(out_w, out_h, output)
}

fn to_dimension(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

#[inline]
fn get_pixel_f64(image: &DecodedImage, px: usize, py: usize) -> [f64; 3] {
    let idx = (py * image.width as usize + px) * 3;
    [
        f64::from(image.pixels[idx]),
        f64::from(image.pixels[idx + 1]),
        f64::from(image.pixels[idx + 2]),
    ]
}

/// Bilinear sample at `(x, y)` with edge clamping.
fn sample_bilinear(image: &DecodedImage, x: f64, y: f64) -> [u8; 3] {
    let max_x = f64::from(image.width - 1);
    let max_y = f64::from(image.height - 1);
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(image.width as usize - 1);
    let y1 = (y0 + 1).min(image.height as usize - 1);

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = get_pixel_f64(image, x0, y0);
    let p10 = get_pixel_f64(image, x1, y0);
    let p01 = get_pixel_f64(image, x0, y1);
    let p11 = get_pixel_f64(image, x1, y1);

    let mut result = [0u8; 3];
    for i in 0..3 {
        let v = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
        result[i] = v.clamp(0.0, 255.0).round() as u8;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    /// Every pixel encodes its own coordinates: R = x, G = y.
    fn coordinate_image(width: u32, height: u32) -> DecodedImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[x as u8, y as u8, 7]);
            }
        }
        DecodedImage::new(width, height, pixels)
    }

    #[test]
    fn test_straight_crop_copies_pixels() {
        let image = coordinate_image(20, 10);
        let out = crop_quad(&image, &Quad::from_rect(&Rect::new(5.0, 2.0, 15.0, 8.0)));
        assert_eq!((out.width, out.height), (10, 6));
        assert_eq!(out.pixel(0, 0), Some([5, 2, 7]));
        assert_eq!(out.pixel(9, 5), Some([14, 7, 7]));
    }

    #[test]
    fn test_quarter_turn_crop() {
        let image = coordinate_image(4, 4);
        // window top-left shows the source bottom-left
        let points = Quad::new([0.0, 4.0, 0.0, 0.0, 4.0, 0.0, 4.0, 4.0]);
        let out = crop_quad(&image, &points);
        assert_eq!((out.width, out.height), (4, 4));
        assert_eq!(out.pixel(0, 0), Some([0, 3, 7]));
        assert_eq!(out.pixel(3, 0), Some([0, 0, 7]));
        assert_eq!(out.pixel(0, 3), Some([3, 3, 7]));
    }

    #[test]
    fn test_horizontal_flip_crop() {
        let image = DecodedImage::new(2, 1, vec![255, 0, 0, 0, 0, 255]);
        let points = Quad::new([2.0, 0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0]);
        let out = crop_quad(&image, &points);
        assert_eq!(out.pixel(0, 0), Some([0, 0, 255]));
        assert_eq!(out.pixel(1, 0), Some([255, 0, 0]));
    }

    #[test]
    fn test_rotated_crop_size() {
        let image = coordinate_image(100, 100);
        let half = 20.0 * std::f64::consts::FRAC_1_SQRT_2;
        // a 40 x 40 window turned by 45 degrees around (50, 50)
        let points = Quad::new([
            50.0 - 2.0 * half, 50.0,
            50.0, 50.0 - 2.0 * half,
            50.0 + 2.0 * half, 50.0,
            50.0, 50.0 + 2.0 * half,
        ]);
        let out = crop_quad(&image, &points);
        assert_eq!((out.width, out.height), (40, 40));
        let [r, g, _] = out.pixel(20, 20).unwrap();
        assert!((i32::from(r) - 50).abs() <= 1);
        assert!((i32::from(g) - 50).abs() <= 1);
    }

    #[test]
    fn test_empty_region_is_empty_image() {
        let image = coordinate_image(10, 10);
        let out = crop_quad(&image, &Quad::from_rect(&Rect::new(3.0, 3.0, 3.0, 9.0)));
        assert!(out.is_empty());
        assert!(crop_quad(&DecodedImage::empty(), &Quad::from_size(5.0, 5.0)).is_empty());
    }

    #[test]
    fn test_crop_clamps_at_edges() {
        let image = coordinate_image(10, 10);
        let out = crop_quad(&image, &Quad::from_rect(&Rect::new(-2.0, -2.0, 3.0, 3.0)));
        assert_eq!(out.pixel(0, 0), Some([0, 0, 7]));
    }
}
