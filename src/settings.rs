//! On-disk settings for the visual and threshold knobs.
//!
//! Gesture-to-command mappings are fixed by design and are not part of the
//! settings surface.

use serde::{Deserialize, Serialize};

pub const SETTINGS_FILE: &str = "gesture_settings.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySettings {
    /// Trail and label color as `#rrggbb`.
    pub color: String,
    /// Trail stroke width in pixels.
    pub thickness: f32,
    /// Label text height in pixels.
    pub label_height: i32,
    pub font_face: String,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            color: "#ff0000".to_string(),
            thickness: 5.0,
            label_height: 48,
            font_face: "Segoe UI".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GestureSettings {
    pub enabled: bool,
    /// Per-axis jitter threshold in pixels; both axes must stay strictly
    /// below it for a move to be ignored.
    pub threshold_px: f32,
    pub overlay: OverlaySettings,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_px: crate::engine::DEFAULT_THRESHOLD_PX,
            overlay: OverlaySettings::default(),
        }
    }
}

/// Load settings from `path`. A missing or empty file yields the defaults;
/// malformed JSON is an error so a typo does not silently reset the file.
pub fn load_settings(path: &str) -> anyhow::Result<GestureSettings> {
    let content = std::fs::read_to_string(path).unwrap_or_default();
    if content.trim().is_empty() {
        return Ok(GestureSettings::default());
    }
    Ok(serde_json::from_str(&content)?)
}

pub fn save_settings(path: &str, settings: &GestureSettings) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json)?;
    Ok(())
}
