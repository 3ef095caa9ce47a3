pub mod remote;
pub mod synthetic;

use crate::service::config::{DetectorConfig, ServiceConfig};
use anyhow::Context;
use rashtracore::classify::{Classifier, ClassifierStage};
use rashtracore::Detector;
use std::sync::Arc;

pub use remote::RemoteDetector;
pub use synthetic::SyntheticDetector;

pub fn build_detector(config: &DetectorConfig) -> anyhow::Result<Arc<dyn Detector>> {
    let detector: Arc<dyn Detector> = match config {
        DetectorConfig::Remote(remote) => Arc::new(RemoteDetector::new(remote)?),
        DetectorConfig::Synthetic(synthetic) => Arc::new(SyntheticDetector::new(synthetic)?),
    };
    Ok(detector)
}

/// Builds the classifier chain in the configured priority order.
pub fn build_classifier(config: &ServiceConfig) -> anyhow::Result<Classifier> {
    let stages = config
        .stages
        .iter()
        .map(|stage| {
            let detector = build_detector(&stage.detector)
                .with_context(|| format!("building detector for stage '{}'", stage.tag))?;
            Ok(ClassifierStage::new(stage.tag.clone(), stage.threshold, detector))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(Classifier::new(stages, config.road_type.clone()))
}
