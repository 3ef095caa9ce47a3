pub mod classifier;
pub mod severity;

pub use classifier::{
    Classifier, ClassifierStage, ClassifyError, ClassifyResult, DEFAULT_ACCEPT_THRESHOLD,
};
pub use severity::{severity_score, RoadType, DEFAULT_SEVERITY};
