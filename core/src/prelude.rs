use crate::detection::ImageFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Class-index to label mapping published by a detection model.
pub type ClassNames = BTreeMap<usize, String>;

/// One scored bounding box reported by a model, corners in pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xyxy: [f32; 4],
    pub conf: f32,
    pub cls: usize,
}

impl BoundingBox {
    pub fn new(xyxy: [f32; 4], conf: f32, cls: usize) -> Self {
        Self { xyxy, conf, cls }
    }

    pub fn area(&self) -> f64 {
        let [x1, y1, x2, y2] = self.xyxy.map(f64::from);
        ((x2 - x1) * (y2 - y1)).abs()
    }
}

/// Boxes reported for one input image of an inference call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultGroup {
    #[serde(default)]
    pub boxes: Vec<BoundingBox>,
}

impl ResultGroup {
    pub fn new(boxes: Vec<BoundingBox>) -> Self {
        Self { boxes }
    }
}

/// Common error type for detector backends.
#[derive(thiserror::Error, Debug)]
pub enum DetectorError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type DetectorResult<T> = Result<T, DetectorError>;

/// Capability shared by every object-detection backend.
///
/// Implementations are opaque to the classifier: given an image they return the
/// raw result groups, and they publish the mapping used to name class indices.
pub trait Detector: Send + Sync {
    fn class_names(&self) -> &ClassNames;
    fn detect(&self, image: &ImageFrame) -> DetectorResult<Vec<ResultGroup>>;
}
