//! YOLO output decoding and non-maximum suppression

use super::preprocess::Letterbox;
use super::{BoundingBox, InferenceError, RawDetection};

/// Check the head shape is `[1, 4 + classes, anchors]` and return the anchor
/// count. Catches transposed exports and class files of the wrong length.
pub fn check_output_shape(shape: &[i64], classes: usize) -> Result<usize, InferenceError> {
    let channels = (4 + classes) as i64;
    match shape {
        [1, c, anchors] if *c == channels && *anchors > 0 => Ok(*anchors as usize),
        _ => Err(InferenceError::Output(format!(
            "expected shape [1, {}, N], got {:?}",
            channels, shape
        ))),
    }
}

/// Decode a YOLOv8 detection head of shape `[1, 4 + classes, anchors]`.
///
/// Each anchor column is `cx, cy, w, h` followed by one score per class.
/// Boxes are mapped back through the letterbox into source image pixels.
pub fn decode_yolo_output(
    data: &[f32],
    class_names: &[String],
    min_confidence: f32,
    letterbox: &Letterbox,
) -> Result<Vec<RawDetection>, InferenceError> {
    let channels = 4 + class_names.len();
    if class_names.is_empty() || data.is_empty() || data.len() % channels != 0 {
        return Err(InferenceError::Output(format!(
            "{} values do not fit {} channels",
            data.len(),
            channels
        )));
    }
    let anchors = data.len() / channels;
    let at = |channel: usize, anchor: usize| data[channel * anchors + anchor];

    let (width, height) = (
        letterbox.source_width as f32,
        letterbox.source_height as f32,
    );

    let mut detections = Vec::new();
    for anchor in 0..anchors {
        let (class_index, confidence) = (0..class_names.len())
            .map(|class| (class, at(4 + class, anchor)))
            .fold((0, f32::MIN), |best, current| {
                if current.1 > best.1 {
                    current
                } else {
                    best
                }
            });

        if confidence < min_confidence {
            continue;
        }

        let in_model_space = BoundingBox::from_center(
            at(0, anchor),
            at(1, anchor),
            at(2, anchor),
            at(3, anchor),
        );
        let (x1, y1) = letterbox.unmap(in_model_space.x1, in_model_space.y1);
        let (x2, y2) = letterbox.unmap(in_model_space.x2, in_model_space.y2);
        let bbox = BoundingBox::new(x1, y1, x2, y2).clamp(width, height);

        if bbox.area() <= 0.0 {
            continue;
        }

        detections.push(RawDetection {
            class_index,
            class_name: class_names[class_index].clone(),
            confidence,
            bbox,
        });
    }

    Ok(detections)
}

/// Non maximum suppression removes duplicate detections of the same class.
///
/// Output is ordered by descending confidence.
pub fn non_maximum_suppression(
    mut detections: Vec<RawDetection>,
    iou_threshold: f32,
) -> Vec<RawDetection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut suppressed = vec![false; detections.len()];
    for current in 0..detections.len() {
        if suppressed[current] {
            continue;
        }
        for other in current + 1..detections.len() {
            if suppressed[other] || detections[current].class_index != detections[other].class_index {
                continue;
            }
            let iou = detections[current]
                .bbox
                .intersection_over_union(&detections[other].bbox);
            if iou > iou_threshold {
                suppressed[other] = true;
            }
        }
    }

    detections
        .into_iter()
        .zip(suppressed)
        .filter_map(|(detection, drop)| (!drop).then_some(detection))
        .collect()
}
