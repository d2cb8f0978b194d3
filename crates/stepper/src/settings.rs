use serde::{Deserialize, Serialize};
use sssp::{Algorithm, GeneratorParams, GraphType};
use std::path::Path;
use std::time::Duration;

/// Common slider metadata so bounds live in one place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl SliderRange {
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }
}

// Generator ranges
pub const NODE_COUNT_RANGE: SliderRange = SliderRange::new(3.0, 15.0, 1.0);
pub const DENSITY_RANGE: SliderRange = SliderRange::new(0.0, 1.0, 0.05);
pub const WEIGHT_RANGE: SliderRange = SliderRange::new(-50.0, 100.0, 1.0);

// Playback ranges
pub const DELAY_MS_RANGE: SliderRange = SliderRange::new(20.0, 5000.0, 10.0);

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub generator: GeneratorSettings,
    #[serde(default)]
    pub playback: PlaybackSettings,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(text)?;
        Ok(settings.clamped())
    }

    /// Force every tunable into its slider range.
    pub fn clamped(self) -> Self {
        let g = self.generator;
        let (min_weight, max_weight) = {
            let a = WEIGHT_RANGE.clamp(g.min_weight).round();
            let b = WEIGHT_RANGE.clamp(g.max_weight).round();
            (a.min(b), a.max(b))
        };
        Self {
            generator: GeneratorSettings {
                node_count: NODE_COUNT_RANGE.clamp(g.node_count as f64) as usize,
                density: DENSITY_RANGE.clamp(g.density),
                min_weight,
                max_weight,
                ..g
            },
            playback: PlaybackSettings {
                delay_ms: DELAY_MS_RANGE.clamp(self.playback.delay_ms as f64)
                    as u64,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    #[serde(default = "GeneratorSettings::default_node_count")]
    pub node_count: usize,
    #[serde(default = "GeneratorSettings::default_density")]
    pub density: f64,
    #[serde(default = "GeneratorSettings::default_min_weight")]
    pub min_weight: f64,
    #[serde(default = "GeneratorSettings::default_max_weight")]
    pub max_weight: f64,
    #[serde(default)]
    pub allow_negative_edges: bool,
    #[serde(default = "GeneratorSettings::default_directed")]
    pub is_directed: bool,
    #[serde(default)]
    pub graph_type: GraphType,
    #[serde(default)]
    pub algorithm: Algorithm,
    #[serde(default)]
    pub negative_cycle: bool,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            node_count: Self::default_node_count(),
            density: Self::default_density(),
            min_weight: Self::default_min_weight(),
            max_weight: Self::default_max_weight(),
            allow_negative_edges: false,
            is_directed: Self::default_directed(),
            graph_type: GraphType::default(),
            algorithm: Algorithm::default(),
            negative_cycle: false,
        }
    }
}

impl GeneratorSettings {
    pub const fn default_node_count() -> usize {
        8
    }
    pub const fn default_density() -> f64 {
        0.3
    }
    pub const fn default_min_weight() -> f64 {
        1.0
    }
    pub const fn default_max_weight() -> f64 {
        20.0
    }
    pub const fn default_directed() -> bool {
        true
    }

    pub fn to_params(
        &self,
        viewport_width: f64,
        viewport_height: f64,
    ) -> GeneratorParams {
        GeneratorParams {
            node_count: self.node_count,
            density: self.density,
            min_weight: self.min_weight,
            max_weight: self.max_weight,
            allow_negative_edges: self.allow_negative_edges,
            is_directed: self.is_directed,
            graph_type: self.graph_type,
            viewport_width,
            viewport_height,
            algorithm: self.algorithm,
            negative_cycle: self.negative_cycle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    #[serde(default = "PlaybackSettings::default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            delay_ms: Self::default_delay_ms(),
        }
    }
}

impl PlaybackSettings {
    pub const fn default_delay_ms() -> u64 {
        500
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let s = Settings::from_json(r#"{"generator": {"node_count": 5}}"#).unwrap();
        assert_eq!(s.generator.node_count, 5);
        assert_eq!(s.generator.density, 0.3);
        assert!(s.generator.is_directed);
        assert_eq!(s.playback, PlaybackSettings::default());
        assert_eq!(Settings::from_json("{}").unwrap(), Settings::default());
    }

    #[test]
    fn test_enums_parse_from_names() {
        let s = Settings::from_json(
            r#"{"generator": {"algorithm": "bellman-ford", "graph_type": "spatial"}}"#,
        )
        .unwrap();
        assert_eq!(s.generator.algorithm, Algorithm::BellmanFord);
        assert_eq!(s.generator.graph_type, GraphType::Spatial);
    }

    #[test]
    fn test_clamped() {
        let s = Settings {
            generator: GeneratorSettings {
                node_count: 40,
                density: -1.0,
                min_weight: 500.0,
                max_weight: -3.4,
                ..Default::default()
            },
            playback: PlaybackSettings { delay_ms: 1 },
        }
        .clamped();
        assert_eq!(s.generator.node_count, 15);
        assert_eq!(s.generator.density, 0.0);
        assert_eq!((s.generator.min_weight, s.generator.max_weight), (-3.0, 100.0));
        assert_eq!(s.playback.delay_ms, 20);
        assert!(s.generator.to_params(800.0, 600.0).validate().is_ok());
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(matches!(
            Settings::from_json("{"),
            Err(SettingsError::Json(_))
        ));
        assert!(matches!(
            Settings::load(Path::new("/definitely/not/here.json")),
            Err(SettingsError::Io(_))
        ));
    }
}
