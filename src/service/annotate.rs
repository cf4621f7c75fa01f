//! Draw detection boxes onto the uploaded image

use std::io::Cursor;

use ab_glyph::{FontRef, PxScale};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::models::Detection;
use crate::{AppError, AppResult};

const BOX_THICKNESS: i32 = 2;
const LABEL_SCALE: f32 = 16.0;
const FONT_BYTES: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

fn color_for(class_key: &str) -> Rgb<u8> {
    match class_key {
        "short-circuit" => Rgb([255, 0, 0]),
        "partial-shading" => Rgb([0, 128, 0]),
        "dust-deposit" => Rgb([0, 0, 255]),
        "bypass-diode" => Rgb([255, 165, 0]),
        _ => Rgb([255, 0, 0]),
    }
}

fn draw_box(image: &mut RgbImage, bbox: [f32; 4], color: Rgb<u8>) {
    let (w, h) = (image.width() as i32, image.height() as i32);

    let x_min = (bbox[0].floor() as i32).clamp(0, w - 1);
    let y_min = (bbox[1].floor() as i32).clamp(0, h - 1);
    let x_max = (bbox[2].ceil() as i32).clamp(0, w - 1);
    let y_max = (bbox[3].ceil() as i32).clamp(0, h - 1);

    for inset in 0..BOX_THICKNESS {
        let width = x_max - x_min - 2 * inset;
        let height = y_max - y_min - 2 * inset;
        if width <= 0 || height <= 0 {
            break;
        }
        let rect = Rect::at(x_min + inset, y_min + inset).of_size(width as u32, height as u32);
        draw_hollow_rect_mut(image, rect, color);
    }
}

fn label_for(detection: &Detection) -> String {
    format!("{}: {:.2}%", detection.class_key, detection.confidence)
}

/// Label sits just above the box, or inside it when the box touches the top edge.
fn draw_label(image: &mut RgbImage, font: &FontRef, bbox: [f32; 4], text: &str, color: Rgb<u8>) {
    let x = (bbox[0].floor() as i32).max(0);
    let y = (bbox[1].floor() as i32 - LABEL_SCALE as i32 - 2).max(0);
    draw_text_mut(image, color, x, y, PxScale::from(LABEL_SCALE), font, text);
}

/// Render every detection box with its label and encode the result as JPEG.
pub fn draw_detections(image: &DynamicImage, detections: &[Detection]) -> AppResult<Vec<u8>> {
    let font = FontRef::try_from_slice(FONT_BYTES)
        .map_err(|e| AppError::Internal(format!("Label font is invalid: {}", e)))?;

    let mut canvas = image.to_rgb8();
    for detection in detections {
        let color = color_for(&detection.class_key);
        draw_box(&mut canvas, detection.bbox, color);
        draw_label(&mut canvas, &font, detection.bbox, &label_for(detection), color);
    }

    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(canvas)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .map_err(|e| AppError::Internal(format!("JPEG encoding failed: {}", e)))?;

    Ok(buffer)
}
