use anyhow::Context;
use rashtracore::classify::{RoadType, DEFAULT_ACCEPT_THRESHOLD};
use rashtracore::ClassNames;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

const DEFAULT_MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

/// Top-level service configuration, loaded from YAML or built from defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind: SocketAddr,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
    /// Road category stamped on every record until geo lookup exists.
    pub road_type: String,
    /// Detector chain in priority order.
    pub stages: Vec<StageConfig>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            road_type: RoadType::default().to_string(),
            stages: vec![
                StageConfig {
                    tag: "Model 1 (Pothole)".into(),
                    threshold: DEFAULT_ACCEPT_THRESHOLD,
                    detector: DetectorConfig::Remote(RemoteConfig {
                        url: "http://127.0.0.1:8001/predict".into(),
                        timeout_secs: default_timeout_secs(),
                        classes: ClassNames::from([(0, "pothole".to_string())]),
                    }),
                },
                StageConfig {
                    tag: "Model 2 (General Damage)".into(),
                    threshold: DEFAULT_ACCEPT_THRESHOLD,
                    detector: DetectorConfig::Remote(RemoteConfig {
                        url: "http://127.0.0.1:8002/predict".into(),
                        timeout_secs: default_timeout_secs(),
                        classes: ClassNames::from([
                            (0, "crack".to_string()),
                            (1, "rutting".to_string()),
                            (2, "patch".to_string()),
                        ]),
                    }),
                },
            ],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StageConfig {
    pub tag: String,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    pub detector: DetectorConfig,
}

/// Backend used to run one stage's model.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DetectorConfig {
    Remote(RemoteConfig),
    Synthetic(SyntheticConfig),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub classes: ClassNames,
}

/// Seeded box generator for running the service without model servers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub seed: u64,
    pub max_boxes: usize,
    pub min_confidence: f32,
    pub max_confidence: f32,
    pub classes: ClassNames,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_boxes: 3,
            min_confidence: 0.1,
            max_confidence: 0.95,
            classes: ClassNames::from([(0, "pothole".to_string())]),
        }
    }
}

fn default_threshold() -> f64 {
    DEFAULT_ACCEPT_THRESHOLD
}

fn default_timeout_secs() -> u64 {
    30
}

impl ServiceConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading service config {}", path_ref.display()))?;
        let config: ServiceConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing service config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Applies command-line overrides on top of the loaded values.
    pub fn with_overrides(mut self, bind: Option<SocketAddr>, upload_dir: Option<PathBuf>) -> Self {
        if let Some(bind) = bind {
            self.bind = bind;
        }
        if let Some(upload_dir) = upload_dir {
            self.upload_dir = upload_dir;
        }
        self
    }
}
