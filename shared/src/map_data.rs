use serde::{Deserialize, Serialize};

/// Complete map description served at a widget's `data-src`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapData {
    pub map_info: MapInfo,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

impl MapData {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapInfo {
    /// URI of the background raster.
    pub image: String,
    /// Declared pixel size `[w, h]` of the background.
    pub dimensions: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
}

impl MapInfo {
    pub fn width(&self) -> f64 {
        self.dimensions[0]
    }

    pub fn height(&self) -> f64 {
        self.dimensions[1]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Waypoint ids are authored either as numbers or strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WaypointId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for WaypointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaypointId::Number(n) => write!(f, "{n}"),
            WaypointId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: WaypointId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Position in background-image pixels.
    pub coords: [f64; 2],
    pub category: String,
}
