//! Image to tensor conversion

use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Grey used by YOLO exports for letterbox padding
const PAD_VALUE: u8 = 114;

/// Geometry of a letterbox resize, needed to map boxes back to the source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub source_width: u32,
    pub source_height: u32,
}

impl Letterbox {
    pub fn for_image(source_width: u32, source_height: u32, target: u32) -> Self {
        let scale = (target as f32 / source_width as f32).min(target as f32 / source_height as f32);
        let resized_w = (source_width as f32 * scale).round();
        let resized_h = (source_height as f32 * scale).round();

        Self {
            scale,
            pad_x: ((target as f32 - resized_w) / 2.0).floor(),
            pad_y: ((target as f32 - resized_h) / 2.0).floor(),
            source_width,
            source_height,
        }
    }

    /// Map a point from model input space back to source image space.
    pub fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

/// Letterbox an image into a `target`x`target` RGB canvas.
pub fn letterbox(image: &DynamicImage, target: u32) -> (RgbImage, Letterbox) {
    let (width, height) = image.dimensions();
    let geometry = Letterbox::for_image(width, height, target);

    let resized_w = ((width as f32 * geometry.scale).round() as u32).clamp(1, target);
    let resized_h = ((height as f32 * geometry.scale).round() as u32).clamp(1, target);
    let resized = image
        .resize_exact(resized_w, resized_h, FilterType::Triangle)
        .to_rgb8();

    let mut canvas = RgbImage::from_pixel(target, target, Rgb([PAD_VALUE; 3]));
    image::imageops::replace(
        &mut canvas,
        &resized,
        geometry.pad_x as i64,
        geometry.pad_y as i64,
    );

    (canvas, geometry)
}

/// RGB image to a `[1, 3, H, W]` tensor scaled to 0..1.
pub fn to_nchw_tensor(rgb_image: &RgbImage) -> Array4<f32> {
    let (width, height) = rgb_image.dimensions();
    let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

    for (x, y, pixel) in rgb_image.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let (x, y) = (x as usize, y as usize);
        tensor[[0, 0, y, x]] = r as f32 / 255.0;
        tensor[[0, 1, y, x]] = g as f32 / 255.0;
        tensor[[0, 2, y, x]] = b as f32 / 255.0;
    }

    tensor
}
