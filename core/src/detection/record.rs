use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;

/// Label reported when no stage accepted a detection.
pub const UNKNOWN_LABEL: &str = "Unknown";
/// Model tag reported when no stage accepted a detection.
pub const UNCLASSIFIED_MODEL: &str = "None";

/// Outcome category of an upload; decides which list the record lands in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecordStatus {
    #[serde(rename = "MAIN_LIST")]
    Accepted,
    #[serde(rename = "WAITING_LIST")]
    Unclassified,
}

/// Classification record created once per upload and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub id: String,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub time: String,
    pub label: String,
    pub confidence: f64,
    pub model: String,
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_score: Option<u32>,
    pub road_type: String,
    pub image: String,
}

impl DetectionRecord {
    pub fn is_accepted(&self) -> bool {
        self.status == RecordStatus::Accepted
    }
}

/// Identity and capture context of an upload, shared by every record variant.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadContext {
    pub id: String,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub time: String,
    pub image: String,
}

impl UploadContext {
    /// Stamps a fresh upload with a v4 id and the current capture time.
    pub fn new(lat: Option<String>, lon: Option<String>, image: String) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), lat, lon, image)
    }

    pub fn with_id(id: String, lat: Option<String>, lon: Option<String>, image: String) -> Self {
        Self {
            id,
            lat,
            lon,
            time: capture_timestamp(),
            image,
        }
    }

    pub fn accepted(
        self,
        label: String,
        confidence: f64,
        model: String,
        area: f64,
        severity_score: u32,
        road_type: String,
    ) -> DetectionRecord {
        DetectionRecord {
            id: self.id,
            lat: self.lat,
            lon: self.lon,
            time: self.time,
            label,
            confidence,
            model,
            status: RecordStatus::Accepted,
            area: Some(area),
            severity_score: Some(severity_score),
            road_type,
            image: self.image,
        }
    }

    pub fn unclassified(self, road_type: String) -> DetectionRecord {
        DetectionRecord {
            id: self.id,
            lat: self.lat,
            lon: self.lon,
            time: self.time,
            label: UNKNOWN_LABEL.to_string(),
            confidence: 0.0,
            model: UNCLASSIFIED_MODEL.to_string(),
            status: RecordStatus::Unclassified,
            area: None,
            severity_score: None,
            road_type,
            image: self.image,
        }
    }
}

/// Local wall-clock time as `YYYY-MM-DD HH:MM:SS`, falling back to UTC when the
/// local offset is unavailable.
pub fn capture_timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format_timestamp(now)
}

fn format_timestamp(moment: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    moment.format(&format).unwrap_or_default()
}
