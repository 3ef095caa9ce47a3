use log::{error, info};
use rashtracore::classify::{ClassifyError, Classifier};
use rashtracore::detection::{DetectionRecord, FrameError, ImageFrame, UploadContext};
use rashtracore::store::RecordStore;
use rashtracore::telemetry::{MetricsRecorder, UploadMetrics};
use std::path::PathBuf;
use std::sync::Arc;
use warp::http::StatusCode;

/// Fields extracted from an upload request.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub file: Option<Vec<u8>>,
    pub lat: Option<String>,
    pub lon: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("No file uploaded")]
    MissingFile,
    #[error("malformed upload: {0}")]
    MalformedForm(String),
    #[error("storing upload: {0}")]
    Storage(String),
    #[error("decoding upload: {0}")]
    Decode(String),
    #[error("classification failed: {0}")]
    Classify(String),
    #[error("classification task aborted: {0}")]
    Task(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::MissingFile | ServiceError::MalformedForm(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FrameError> for ServiceError {
    fn from(err: FrameError) -> Self {
        ServiceError::Decode(err.to_string())
    }
}

impl From<ClassifyError> for ServiceError {
    fn from(err: ClassifyError) -> Self {
        ServiceError::Classify(err.to_string())
    }
}

impl warp::reject::Reject for ServiceError {}

/// Takes an upload from raw form fields to a stored record.
pub struct Pipeline {
    classifier: Arc<Classifier>,
    store: Arc<RecordStore>,
    metrics: MetricsRecorder,
    upload_dir: PathBuf,
}

impl Pipeline {
    pub fn new(classifier: Arc<Classifier>, store: Arc<RecordStore>, upload_dir: PathBuf) -> Self {
        Self {
            classifier,
            store,
            metrics: MetricsRecorder::new(),
            upload_dir,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn metrics(&self) -> UploadMetrics {
        self.metrics.snapshot()
    }

    /// Persists the image, classifies it and appends the record to the store.
    ///
    /// Nothing is appended when any step fails.
    pub async fn ingest(&self, form: UploadForm) -> Result<DetectionRecord, ServiceError> {
        let bytes = form.file.ok_or(ServiceError::MissingFile)?;

        let id = uuid::Uuid::new_v4().to_string();
        let path = self.upload_dir.join(format!("{}.jpg", id));
        let result = self.classify_saved(id, form.lat, form.lon, path, bytes).await;

        match result {
            Ok(record) => {
                self.store.append(record.clone());
                self.metrics.record_outcome(record.status);
                info!(
                    "upload {} -> {:?} ({} @ {:.3})",
                    record.id, record.status, record.label, record.confidence
                );
                Ok(record)
            }
            Err(err) => {
                self.metrics.record_error();
                error!("upload failed: {}", err);
                Err(err)
            }
        }
    }

    async fn classify_saved(
        &self,
        id: String,
        lat: Option<String>,
        lon: Option<String>,
        path: PathBuf,
        bytes: Vec<u8>,
    ) -> Result<DetectionRecord, ServiceError> {
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| ServiceError::Storage(format!("{}: {}", path.display(), e)))?;

        let context = UploadContext::with_id(id, lat, lon, path.display().to_string());
        let classifier = self.classifier.clone();
        tokio::task::spawn_blocking(move || -> Result<DetectionRecord, ServiceError> {
            let frame = ImageFrame::from_encoded(path, bytes)?;
            Ok(classifier.classify(&frame, context)?)
        })
        .await
        .map_err(|e| ServiceError::Task(e.to_string()))?
    }
}
