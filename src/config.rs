//! Render options for the piano-roll SVG output.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ProjectError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Draw the f0 curve behind the notes
    pub display_f0: bool,
    /// Fill color of HEAD units
    pub color_head: String,
    /// Fill color of BODY units
    pub color_body: String,
    pub color_f0: String,
    /// Color of lyric and phoneme labels
    pub color_text: String,
    /// Figure width in inches; the canvas is `width * dpi` pixels wide
    pub width: u32,
    pub dpi: u32,
    /// Height of one semitone relative to the length of one second
    pub aspect: f64,
    pub font_family: String,
    pub font_size: f64,
    /// CSS font style: normal, italic, oblique
    pub font_style: String,
}

impl RenderOptions {
    pub const DEFAULT_WIDTH: u32 = 1280;
    pub const DEFAULT_DPI: u32 = 50;
    pub const DEFAULT_ASPECT: f64 = 0.125;

    /// Load options from a JSON file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| ProjectError::io("reading render options", e))?;
        let options: Self = serde_json::from_str(&data)
            .map_err(|e| ProjectError::json("parsing render options", e))?;
        Ok(options.normalized())
    }

    /// Canvas width in pixels.
    pub fn canvas_width(&self) -> f64 {
        f64::from(self.width.max(1)) * f64::from(self.dpi.max(1))
    }

    /// Return a copy with every color passed through [`normalize_color`].
    pub fn normalized(mut self) -> Self {
        self.color_head = normalize_color(&self.color_head);
        self.color_body = normalize_color(&self.color_body);
        self.color_f0 = normalize_color(&self.color_f0);
        self.color_text = normalize_color(&self.color_text);
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            display_f0: true,
            color_head: "#8c2128".to_string(),
            color_body: "#d34343".to_string(),
            color_f0: "#cc88cc".to_string(),
            color_text: "#000000".to_string(),
            width: Self::DEFAULT_WIDTH,
            dpi: Self::DEFAULT_DPI,
            aspect: Self::DEFAULT_ASPECT,
            font_family: "Noto Sans CJK SC, sans-serif".to_string(),
            font_size: 12.0,
            font_style: "normal".to_string(),
        }
    }
}

/// Accept colors written without the leading `#` (`d34343`), as is common on
/// the command line. Anything that is not six bare alphanumerics is passed
/// through unchanged.
pub fn normalize_color(color: &str) -> String {
    let trimmed = color.trim();
    if trimmed.len() == 6 && trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        format!("#{}", trimmed.to_lowercase())
    } else {
        trimmed.to_string()
    }
}
