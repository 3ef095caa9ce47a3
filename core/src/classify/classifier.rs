use crate::classify::severity::severity_score;
use crate::detection::{reduce, DetectionRecord, ImageFrame, UploadContext};
use crate::prelude::{Detector, DetectorError};
use crate::telemetry::log::LogManager;
use std::sync::Arc;

/// Confidence a detection must strictly exceed to be accepted.
pub const DEFAULT_ACCEPT_THRESHOLD: f64 = 0.6;

#[derive(thiserror::Error, Debug)]
pub enum ClassifyError {
    #[error("detector for stage '{stage}' failed: {source}")]
    Detector {
        stage: String,
        #[source]
        source: DetectorError,
    },
}

pub type ClassifyResult<T> = Result<T, ClassifyError>;

/// One link of the priority chain: a detector plus the tag and threshold used
/// when it accepts.
#[derive(Clone)]
pub struct ClassifierStage {
    pub tag: String,
    pub threshold: f64,
    pub detector: Arc<dyn Detector>,
}

impl ClassifierStage {
    pub fn new(tag: impl Into<String>, threshold: f64, detector: Arc<dyn Detector>) -> Self {
        Self {
            tag: tag.into(),
            threshold,
            detector,
        }
    }
}

/// Short-circuit classifier: the first stage whose best detection clears its
/// threshold decides the record, later stages are never invoked.
pub struct Classifier {
    stages: Vec<ClassifierStage>,
    road_type: String,
    logger: LogManager,
}

impl Classifier {
    pub fn new(stages: Vec<ClassifierStage>, road_type: impl Into<String>) -> Self {
        Self {
            stages,
            road_type: road_type.into(),
            logger: LogManager::scoped("classifier"),
        }
    }

    pub fn stages(&self) -> &[ClassifierStage] {
        &self.stages
    }

    pub fn road_type(&self) -> &str {
        &self.road_type
    }

    pub fn classify(
        &self,
        frame: &ImageFrame,
        upload: UploadContext,
    ) -> ClassifyResult<DetectionRecord> {
        for stage in &self.stages {
            let groups = stage
                .detector
                .detect(frame)
                .map_err(|source| ClassifyError::Detector {
                    stage: stage.tag.clone(),
                    source,
                })?;
            let best = reduce(&groups, stage.detector.class_names(), frame.pixel_area());

            if best.clears(stage.threshold) {
                self.logger.record(&format!(
                    "{} accepted {} by '{}' at {:.3}",
                    upload.id, best.label, stage.tag, best.confidence
                ));
                return Ok(upload.accepted(
                    best.label,
                    best.confidence,
                    stage.tag.clone(),
                    best.area,
                    severity_score(&self.road_type),
                    self.road_type.clone(),
                ));
            }

            self.logger.debug(&format!(
                "{} below threshold for '{}' (best {:.3}, need > {:.2})",
                upload.id, stage.tag, best.confidence, stage.threshold
            ));
        }

        self.logger
            .record(&format!("{} left unclassified by all stages", upload.id));
        Ok(upload.unclassified(self.road_type.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::frame::tests::png_bytes;
    use crate::detection::RecordStatus;
    use crate::prelude::{BoundingBox, ClassNames, DetectorResult, ResultGroup};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Detector returning one fixed box (or none) and counting invocations.
    pub(crate) struct FakeDetector {
        names: ClassNames,
        confidence: Option<f32>,
        fail: bool,
        pub(crate) calls: AtomicUsize,
    }

    impl FakeDetector {
        pub(crate) fn scoring(label: &str, confidence: f32) -> Arc<Self> {
            Arc::new(Self {
                names: ClassNames::from([(0, label.to_string())]),
                confidence: Some(confidence),
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn empty() -> Arc<Self> {
            Arc::new(Self {
                names: ClassNames::new(),
                confidence: None,
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn failing() -> Arc<Self> {
            Arc::new(Self {
                names: ClassNames::new(),
                confidence: None,
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Detector for FakeDetector {
        fn class_names(&self) -> &ClassNames {
            &self.names
        }

        fn detect(&self, _image: &ImageFrame) -> DetectorResult<Vec<ResultGroup>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DetectorError::Transport("connection refused".into()));
            }
            let boxes = self
                .confidence
                .map(|conf| vec![BoundingBox::new([0.0, 0.0, 5.0, 4.0], conf, 0)])
                .unwrap_or_default();
            Ok(vec![ResultGroup::new(boxes)])
        }
    }

    fn frame() -> ImageFrame {
        ImageFrame::from_encoded("uploads/test.png", png_bytes(10, 10)).unwrap()
    }

    fn upload() -> UploadContext {
        UploadContext::new(
            Some("17.385".into()),
            Some("78.486".into()),
            "uploads/test.png".into(),
        )
    }

    fn classifier(first: Arc<FakeDetector>, second: Arc<FakeDetector>) -> Classifier {
        Classifier::new(
            vec![
                ClassifierStage::new("Model 1 (Pothole)", DEFAULT_ACCEPT_THRESHOLD, first),
                ClassifierStage::new("Model 2 (General Damage)", DEFAULT_ACCEPT_THRESHOLD, second),
            ],
            "STREET",
        )
    }

    #[test]
    fn first_stage_acceptance_skips_second_model() {
        let first = FakeDetector::scoring("pothole", 0.75);
        let second = FakeDetector::scoring("crack", 0.99);
        let record = classifier(first.clone(), second.clone())
            .classify(&frame(), upload())
            .unwrap();

        assert_eq!(record.status, RecordStatus::Accepted);
        assert_eq!(record.label, "pothole");
        assert_eq!(record.confidence, 0.75);
        assert_eq!(record.model, "Model 1 (Pothole)");
        assert_eq!(record.area, Some(0.2));
        assert_eq!(record.severity_score, Some(2));
        assert_eq!(first.call_count(), 1);
        assert_eq!(second.call_count(), 0);
    }

    #[test]
    fn second_stage_accepts_when_first_is_weak() {
        let first = FakeDetector::scoring("pothole", 0.55);
        let second = FakeDetector::scoring("crack", 0.61);
        let record = classifier(first.clone(), second.clone())
            .classify(&frame(), upload())
            .unwrap();

        assert_eq!(record.status, RecordStatus::Accepted);
        assert_eq!(record.label, "crack");
        assert_eq!(record.model, "Model 2 (General Damage)");
        assert_eq!(first.call_count(), 1);
        assert_eq!(second.call_count(), 1);
    }

    #[test]
    fn score_of_exactly_point_six_is_accepted_by_first_stage() {
        let first = FakeDetector::scoring("pothole", 0.6);
        let second = FakeDetector::scoring("crack", 0.9);
        let record = classifier(first, second.clone())
            .classify(&frame(), upload())
            .unwrap();

        assert_eq!(record.model, "Model 1 (Pothole)");
        assert_eq!(record.confidence, f64::from(0.6f32));
        assert_eq!(second.call_count(), 0);
    }

    #[test]
    fn neither_stage_accepting_yields_unclassified() {
        let record = classifier(
            FakeDetector::scoring("pothole", 0.3),
            FakeDetector::scoring("crack", 0.2),
        )
        .classify(&frame(), upload())
        .unwrap();

        assert_eq!(record.status, RecordStatus::Unclassified);
        assert_eq!(record.label, "Unknown");
        assert_eq!(record.confidence, 0.0);
        assert_eq!(record.model, "None");
        assert_eq!(record.area, None);
        assert_eq!(record.road_type, "STREET");
    }

    #[test]
    fn empty_detections_fall_through_to_unclassified() {
        let record = classifier(FakeDetector::empty(), FakeDetector::empty())
            .classify(&frame(), upload())
            .unwrap();
        assert!(!record.is_accepted());
    }

    #[test]
    fn record_carries_upload_identity() {
        let context = upload();
        let id = context.id.clone();
        let record = classifier(FakeDetector::scoring("pothole", 0.9), FakeDetector::empty())
            .classify(&frame(), context)
            .unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.lat.as_deref(), Some("17.385"));
        assert_eq!(record.image, "uploads/test.png");
    }

    #[test]
    fn detector_failure_aborts_with_stage_tag() {
        let second = FakeDetector::scoring("crack", 0.9);
        let err = classifier(FakeDetector::failing(), second.clone())
            .classify(&frame(), upload())
            .unwrap_err();

        match err {
            ClassifyError::Detector { stage, .. } => assert_eq!(stage, "Model 1 (Pothole)"),
        }
        assert_eq!(second.call_count(), 0);
    }

    #[test]
    fn per_stage_thresholds_are_honoured() {
        let first = FakeDetector::scoring("pothole", 0.5);
        let classifier = Classifier::new(
            vec![ClassifierStage::new("lenient", 0.4, first)],
            "NH",
        );
        let record = classifier.classify(&frame(), upload()).unwrap();
        assert_eq!(record.model, "lenient");
        assert_eq!(record.severity_score, Some(10));
    }
}
