//! Configuration of scenes and of mesh building.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{style::builder::StyleKind, tessellation::DEFAULT_TOLERANCE};

/// Defaults used by the built-in builders when a rule does not set a parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TessellationSettings {
    /// Maximum distance between a curve and its approximation, in pixels.
    pub tolerance: f32,
    /// Line width in pixels.
    pub line_width: f32,
    /// Point size in pixels.
    pub point_size: f32,
    pub miter_limit: f32,
}

impl Default for TessellationSettings {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            line_width: 1.0,
            point_size: 16.0,
            miter_limit: 3.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    pub name: String,
    pub base: StyleKind,
}

/// Declarative description of a [`crate::scene::Scene`].
///
/// ```json
/// {
///   "styles": [{"name": "routes", "base": "lines"}],
///   "functions": [["interpolate", ["linear"], ["zoom"], 10, 1, 15, 4]],
///   "tessellation": {"line_width": 2.0}
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub styles: Vec<StyleConfig>,
    /// Style functions compiled when a manager binds the scene.
    pub functions: Vec<Value>,
    pub tessellation: TessellationSettings,
}

#[cfg(test)]
mod tests {
    use crate::{
        settings::{SceneConfig, TessellationSettings},
        style::builder::StyleKind,
    };

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings: TessellationSettings =
            serde_json::from_str(r#"{"line_width": 3.0}"#).unwrap();
        assert_eq!(settings.line_width, 3.0);
        assert_eq!(settings.point_size, TessellationSettings::default().point_size);
    }

    #[test]
    fn test_scene_config() {
        let config: SceneConfig = serde_json::from_str(
            r#"{"styles": [{"name": "routes", "base": "lines"}], "functions": [["zoom"]]}"#,
        )
        .unwrap();
        assert_eq!(config.styles[0].base, StyleKind::Lines);
        assert_eq!(config.functions.len(), 1);
        assert_eq!(config.tessellation, TessellationSettings::default());
    }
}
