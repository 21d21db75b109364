//! Raster surface the renderer draws into
//!
//! Wraps an [`RgbImage`] that is only allocated on first use and never
//! reallocated afterwards. Drawing goes through `imageproc`, except for the
//! built-in bitmap font.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut, draw_text_mut};
use imageproc::point::Point;
use tracing::debug;

use crate::font::{draw_bitmap_text, DrawFont};

pub struct Canvas {
    width: u32,
    height: u32,
    background: Rgb<u8>,
    image: Option<RgbImage>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Self {
            width,
            height,
            background,
            image: None,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_allocated(&self) -> bool {
        self.image.is_some()
    }

    /// Change the size of a canvas that has not been drawn on yet.
    /// Once the raster exists the request is ignored and `false` returned.
    pub fn request_size(&mut self, width: u32, height: u32) -> bool {
        if self.image.is_some() {
            debug!(
                "ignoring resize to {}x{}, canvas already allocated at {}x{}",
                width, height, self.width, self.height
            );
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    pub fn image(&mut self) -> &RgbImage {
        self.image_mut()
    }

    pub fn image_mut(&mut self) -> &mut RgbImage {
        let (width, height, background) = (self.width, self.height, self.background);
        self.image
            .get_or_insert_with(|| RgbImage::from_pixel(width, height, background))
    }

    /// Filled polygon without outline. Degenerate input draws nothing.
    pub fn fill_polygon(&mut self, points: &[Point<i32>], color: Rgb<u8>) {
        let mut points = points.to_vec();
        while points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if points.len() < 3 {
            return;
        }
        draw_polygon_mut(self.image_mut(), &points, color);
    }

    /// Straight line of the given pixel width between two points.
    pub fn line(&mut self, from: Point<i32>, to: Point<i32>, color: Rgb<u8>, width: u32) {
        if width <= 1 {
            draw_line_segment_mut(
                self.image_mut(),
                (from.x as f32, from.y as f32),
                (to.x as f32, to.y as f32),
                color,
            );
            return;
        }

        let dx = (to.x - from.x) as f32;
        let dy = (to.y - from.y) as f32;
        let length = (dx * dx + dy * dy).sqrt();
        let (below, above) = spread(width);

        if length < f32::EPSILON {
            let dot = square_around(from, below, above);
            draw_polygon_mut(self.image_mut(), &dot, color);
            return;
        }

        // Unit normal, pointing towards +x (or +y for horizontal lines) so
        // the odd pixel of an even width always sits on the same side
        let (mut nx, mut ny) = (-dy / length, dx / length);
        if nx < -f32::EPSILON || (nx.abs() < f32::EPSILON && ny < 0.0) {
            nx = -nx;
            ny = -ny;
        }
        let offset = |p: Point<i32>, distance: i32| {
            Point::new(
                (p.x as f32 + nx * distance as f32).round() as i32,
                (p.y as f32 + ny * distance as f32).round() as i32,
            )
        };
        let quad = [
            offset(from, above),
            offset(to, above),
            offset(to, -below),
            offset(from, -below),
        ];
        draw_polygon_mut(self.image_mut(), &quad, color);
    }

    pub fn text(&mut self, pos: Point<i32>, text: &str, color: Rgb<u8>, font: &DrawFont) {
        if text.is_empty() {
            return;
        }
        match font {
            DrawFont::Outline { font, scale } => {
                draw_text_mut(self.image_mut(), color, pos.x, pos.y, *scale, font, text);
            }
            DrawFont::Bitmap { scale } => {
                draw_bitmap_text(self.image_mut(), pos.x, pos.y, text, color, *scale);
            }
        }
    }

    /// Hand over the raster, allocating a blank one if nothing was drawn.
    pub fn into_image(self) -> RgbImage {
        let Canvas {
            width,
            height,
            background,
            image,
        } = self;
        image.unwrap_or_else(|| RgbImage::from_pixel(width, height, background))
    }
}

/// Pixels on either side of the centre line for a line `width` pixels wide.
/// Polygon fills include their boundary, so the two add up to `width - 1`.
fn spread(width: u32) -> (i32, i32) {
    let below = (width / 2) as i32;
    let above = (width.saturating_sub(1) / 2) as i32;
    (below, above)
}

fn square_around(center: Point<i32>, below: i32, above: i32) -> [Point<i32>; 4] {
    [
        Point::new(center.x - below, center.y - below),
        Point::new(center.x + above, center.y - below),
        Point::new(center.x + above, center.y + above),
        Point::new(center.x - below, center.y + above),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{FontResolver, DEFAULT_FONT_PATH};
    use std::path::Path;

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    const RED: Rgb<u8> = Rgb([255, 0, 0]);

    #[test]
    fn test_lazy_allocation() {
        let mut canvas = Canvas::new(12, 8, Rgb([1, 2, 3]));
        assert!(!canvas.is_allocated());
        assert_eq!(canvas.image().dimensions(), (12, 8));
        assert!(canvas.is_allocated());
        assert_eq!(*canvas.image().get_pixel(5, 5), Rgb([1, 2, 3]));
    }

    #[test]
    fn test_resize_rejected_after_allocation() {
        let mut canvas = Canvas::new(12, 8, BLACK);
        assert!(canvas.request_size(30, 20));
        canvas.image_mut().put_pixel(0, 0, RED);
        assert!(!canvas.request_size(100, 100));
        assert_eq!(canvas.dimensions(), (30, 20));
        assert_eq!(canvas.image().dimensions(), (30, 20));
        assert_eq!(*canvas.image().get_pixel(0, 0), RED);
    }

    #[test]
    fn test_thin_line() {
        let mut canvas = Canvas::new(10, 10, BLACK);
        canvas.line(Point::new(2, 5), Point::new(8, 5), RED, 1);
        let img = canvas.into_image();
        assert!((3..=7).all(|x| *img.get_pixel(x, 5) == RED));
        assert_eq!(*img.get_pixel(5, 4), BLACK);
        assert_eq!(*img.get_pixel(5, 6), BLACK);
    }

    #[test]
    fn test_wide_line_covers_width() {
        let mut canvas = Canvas::new(20, 20, BLACK);
        canvas.line(Point::new(10, 2), Point::new(10, 17), RED, 4);
        let img = canvas.into_image();
        for x in 8..=11 {
            assert_eq!(*img.get_pixel(x, 10), RED, "x = {}", x);
        }
        assert_eq!(*img.get_pixel(7, 10), BLACK);
        assert_eq!(*img.get_pixel(12, 10), BLACK);
    }

    fn red_run(img: &RgbImage, pixels: impl Iterator<Item = (u32, u32)>) -> Vec<(u32, u32)> {
        pixels.filter(|&(x, y)| *img.get_pixel(x, y) == RED).collect()
    }

    #[test]
    fn test_line_width_is_exact() {
        for width in 1..=6u32 {
            let mut canvas = Canvas::new(40, 40, BLACK);
            canvas.line(Point::new(20, 5), Point::new(20, 35), RED, width);
            canvas.line(Point::new(5, 30), Point::new(15, 30), RED, width);
            let img = canvas.into_image();

            let across = red_run(&img, (0..40).map(|x| (x, 20)));
            assert_eq!(across.len() as u32, width, "vertical line, width {}", width);
            assert!(across.contains(&(20, 20)));

            let down = red_run(&img, (0..40).map(|y| (10, y)));
            assert_eq!(down.len() as u32, width, "horizontal line, width {}", width);
            assert!(down.contains(&(10, 30)));
        }
    }

    #[test]
    fn test_line_direction_does_not_move_pixels() {
        let mut down = Canvas::new(20, 20, BLACK);
        down.line(Point::new(10, 2), Point::new(10, 17), RED, 2);
        let mut up = Canvas::new(20, 20, BLACK);
        up.line(Point::new(10, 17), Point::new(10, 2), RED, 2);
        assert_eq!(down.into_image().as_raw(), up.into_image().as_raw());
    }

    #[test]
    fn test_zero_length_line_draws_dot() {
        let mut canvas = Canvas::new(10, 10, BLACK);
        canvas.line(Point::new(4, 4), Point::new(4, 4), RED, 3);
        let img = canvas.into_image();
        assert_eq!(img.pixels().filter(|p| **p == RED).count(), 9);
        assert_eq!(*img.get_pixel(3, 5), RED);
    }

    #[test]
    fn test_fill_polygon_ignores_degenerate_input() {
        let mut canvas = Canvas::new(10, 10, BLACK);
        canvas.fill_polygon(&[Point::new(1, 1), Point::new(5, 5)], RED);
        canvas.fill_polygon(&[Point::new(1, 1), Point::new(8, 1), Point::new(4, 8), Point::new(1, 1)], RED);
        let img = canvas.into_image();
        assert_eq!(*img.get_pixel(4, 3), RED);
        assert_eq!(*img.get_pixel(0, 9), BLACK);
    }

    #[test]
    fn test_drawing_outside_bounds_is_clipped() {
        let mut canvas = Canvas::new(10, 10, BLACK);
        canvas.line(Point::new(-20, -20), Point::new(30, 30), RED, 3);
        canvas.fill_polygon(&[Point::new(5, 5), Point::new(40, 5), Point::new(40, 40)], RED);
        canvas.text(Point::new(8, 8), "123", RED, &DrawFont::bitmap());
        assert_eq!(canvas.image().dimensions(), (10, 10));
    }

    #[test]
    fn test_outline_text_draws() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_FONT_PATH);
        let font = FontResolver::new(path, 14.0).resolve();
        assert!(font.is_outline());

        let mut canvas = Canvas::new(40, 20, BLACK);
        canvas.text(Point::new(2, 2), "H", RED, &font);
        let img = canvas.into_image();
        // Glyph coverage blends towards red, never other channels
        assert!(img.pixels().any(|p| p[0] > 200));
        assert!(img.pixels().all(|p| p[1] == 0 && p[2] == 0));
        assert_eq!(*img.get_pixel(39, 19), BLACK);
    }
}
