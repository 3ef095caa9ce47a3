//! Core of the RASHTRA road-damage service.
//!
//! Uploaded photos are decoded into [`detection::ImageFrame`]s, run through an
//! ordered chain of detectors by [`classify::Classifier`], and the resulting
//! [`detection::DetectionRecord`] is kept in a [`store::RecordStore`].

pub mod classify;
pub mod detection;
pub mod prelude;
pub mod store;
pub mod telemetry;

pub use prelude::{BoundingBox, ClassNames, Detector, DetectorError, DetectorResult, ResultGroup};
