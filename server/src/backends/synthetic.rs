use crate::service::config::SyntheticConfig;
use anyhow::ensure;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rashtracore::detection::ImageFrame;
use rashtracore::{BoundingBox, ClassNames, Detector, DetectorError, DetectorResult, ResultGroup};
use std::sync::Mutex;

/// Development backend producing seeded, plausible boxes for any image.
pub struct SyntheticDetector {
    names: ClassNames,
    max_boxes: usize,
    min_confidence: f32,
    max_confidence: f32,
    rng: Mutex<StdRng>,
}

impl SyntheticDetector {
    /// Fails unless `0 <= min_confidence <= max_confidence <= 1`; NaN never
    /// satisfies the range checks.
    pub fn new(config: &SyntheticConfig) -> anyhow::Result<Self> {
        let (min_confidence, max_confidence) = (config.min_confidence, config.max_confidence);
        ensure!(
            (0.0..=1.0).contains(&min_confidence) && (0.0..=1.0).contains(&max_confidence),
            "synthetic confidences must lie in [0, 1] (got {} and {})",
            min_confidence,
            max_confidence
        );
        ensure!(
            min_confidence <= max_confidence,
            "min_confidence {} exceeds max_confidence {}",
            min_confidence,
            max_confidence
        );

        Ok(Self {
            names: config.classes.clone(),
            max_boxes: config.max_boxes,
            min_confidence,
            max_confidence,
            rng: Mutex::new(StdRng::seed_from_u64(config.seed)),
        })
    }

    fn sample_box(&self, rng: &mut StdRng, width: f32, height: f32) -> BoundingBox {
        let x1 = rng.gen_range(0.0..width / 2.0);
        let y1 = rng.gen_range(0.0..height / 2.0);
        let x2 = x1 + rng.gen_range(1.0..=(width - x1).max(1.0));
        let y2 = y1 + rng.gen_range(1.0..=(height - y1).max(1.0));
        let conf = if self.max_confidence > self.min_confidence {
            rng.gen_range(self.min_confidence..self.max_confidence)
        } else {
            self.min_confidence
        };
        let cls = if self.names.is_empty() {
            0
        } else {
            let pick = rng.gen_range(0..self.names.len());
            self.names.keys().nth(pick).copied().unwrap_or(0)
        };

        BoundingBox::new([x1, y1, x2.min(width), y2.min(height)], conf, cls)
    }
}

impl Detector for SyntheticDetector {
    fn class_names(&self) -> &ClassNames {
        &self.names
    }

    fn detect(&self, image: &ImageFrame) -> DetectorResult<Vec<ResultGroup>> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| DetectorError::Internal("synthetic generator poisoned".into()))?;
        let width = (image.width() as f32).max(1.0);
        let height = (image.height() as f32).max(1.0);

        let count = rng.gen_range(0..=self.max_boxes);
        let boxes = (0..count)
            .map(|_| self.sample_box(&mut rng, width, height))
            .collect();

        Ok(vec![ResultGroup::new(boxes)])
    }
}
