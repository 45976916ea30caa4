use serde::{Deserialize, Serialize};

fn default_schema_version() -> u32 {
    1
}

/// Timing and failure knobs of the simulated media resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub metadata_latency_ms: u64,
    pub data_latency_ms: u64,
    pub time_update_ms: u64,
    pub reject_play: bool,
    pub failing_sources: Vec<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            metadata_latency_ms: 150,
            data_latency_ms: 400,
            time_update_ms: 250,
            reject_play: false,
            failing_sources: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub media_base_url: String,
    pub playlist_path: Option<String>,
    pub initial_volume: f64,
    pub autoplay_on_advance: bool,
    pub log_level: String,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            media_base_url: "http://localhost:8080/media/".to_string(),
            playlist_path: None,
            initial_volume: 0.75,
            autoplay_on_advance: true,
            log_level: "info".to_string(),
            simulation: SimulationConfig::default(),
        }
    }
}
