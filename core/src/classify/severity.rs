use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Weight used for road categories outside the lookup table.
pub const DEFAULT_SEVERITY: u32 = 2;

/// Road category of the location a photo was taken at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoadType {
    /// National highway.
    Nh,
    State,
    City,
    #[default]
    Street,
    Village,
}

impl RoadType {
    pub fn severity(self) -> u32 {
        match self {
            RoadType::Nh => 10,
            RoadType::State => 7,
            RoadType::City => 5,
            RoadType::Street => 2,
            RoadType::Village => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoadType::Nh => "NH",
            RoadType::State => "STATE",
            RoadType::City => "CITY",
            RoadType::Street => "STREET",
            RoadType::Village => "VILLAGE",
        }
    }
}

impl fmt::Display for RoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoadType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NH" => Ok(RoadType::Nh),
            "STATE" => Ok(RoadType::State),
            "CITY" => Ok(RoadType::City),
            "STREET" => Ok(RoadType::Street),
            "VILLAGE" => Ok(RoadType::Village),
            other => Err(format!("unknown road type {}", other)),
        }
    }
}

/// Severity weight for a road-category tag; unknown tags weigh as a street.
pub fn severity_score(road_type: &str) -> u32 {
    road_type
        .parse::<RoadType>()
        .map(RoadType::severity)
        .unwrap_or(DEFAULT_SEVERITY)
}
