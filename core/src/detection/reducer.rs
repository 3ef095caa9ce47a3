use crate::detection::record::UNKNOWN_LABEL;
use crate::prelude::{ClassNames, ResultGroup};

/// Highest-confidence detection found in one inference call.
#[derive(Debug, Clone, PartialEq)]
pub struct BestDetection {
    pub detected: bool,
    /// Model score widened to `f64` before any comparison.
    pub confidence: f64,
    pub label: String,
    /// Box area as a fraction of the image area.
    pub area: f64,
}

impl Default for BestDetection {
    fn default() -> Self {
        Self {
            detected: false,
            confidence: 0.0,
            label: UNKNOWN_LABEL.to_string(),
            area: 0.0,
        }
    }
}

impl BestDetection {
    pub fn clears(&self, threshold: f64) -> bool {
        self.detected && self.confidence > threshold
    }
}

/// Scans every box of every group and keeps the first box with the strictly
/// highest confidence.
pub fn reduce(groups: &[ResultGroup], names: &ClassNames, image_area: f64) -> BestDetection {
    let mut best = BestDetection::default();

    for bbox in groups.iter().flat_map(|group| group.boxes.iter()) {
        let conf = f64::from(bbox.conf);
        if conf > best.confidence {
            best.detected = true;
            best.confidence = conf;
            best.label = class_label(names, bbox.cls);
            best.area = if image_area > 0.0 {
                bbox.area() / image_area
            } else {
                0.0
            };
        }
    }

    best
}

fn class_label(names: &ClassNames, cls: usize) -> String {
    names
        .get(&cls)
        .cloned()
        .unwrap_or_else(|| format!("class_{}", cls))
}
