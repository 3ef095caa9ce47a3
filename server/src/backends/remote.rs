use crate::service::config::RemoteConfig;
use anyhow::Context;
use log::debug;
use rashtracore::detection::ImageFrame;
use rashtracore::{ClassNames, Detector, DetectorError, DetectorResult, ResultGroup};
use reqwest::blocking::{multipart, Client};
use serde::Deserialize;
use std::time::Duration;

/// Body returned by an inference server: one group of boxes per input image.
#[derive(Debug, Deserialize)]
struct InferenceResponse {
    #[serde(default)]
    results: Vec<ResultGroup>,
}

/// Detector backed by a model served over HTTP.
///
/// The encoded upload is posted as multipart field `file`; the server answers
/// with `{"results": [{"boxes": [{"xyxy": [..], "conf": .., "cls": ..}]}]}`.
pub struct RemoteDetector {
    client: Client,
    url: String,
    names: ClassNames,
}

impl RemoteDetector {
    pub fn new(config: &RemoteConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("creating inference HTTP client")?;
        Ok(Self {
            client,
            url: config.url.clone(),
            names: config.classes.clone(),
        })
    }
}

impl Detector for RemoteDetector {
    fn class_names(&self) -> &ClassNames {
        &self.names
    }

    fn detect(&self, image: &ImageFrame) -> DetectorResult<Vec<ResultGroup>> {
        let file_name = image
            .path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.jpg".into());
        let part = multipart::Part::bytes(image.encoded().to_vec()).file_name(file_name);
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .map_err(|e| DetectorError::Transport(format!("{}: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(DetectorError::Transport(format!(
                "{} answered {}: {}",
                self.url, status, text
            )));
        }

        let body: InferenceResponse = response
            .json()
            .map_err(|e| DetectorError::MalformedResponse(e.to_string()))?;
        debug!(
            "{} returned {} boxes",
            self.url,
            body.results.iter().map(|g| g.boxes.len()).sum::<usize>()
        );
        Ok(body.results)
    }
}
