//! Block style properties.

use serde::{Deserialize, Serialize};

/// Font weight options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Font style options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Horizontal text alignment inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Smallest font size the inspector accepts.
pub const MIN_FONT_SIZE: f64 = 8.0;
/// Largest font size the inspector accepts.
pub const MAX_FONT_SIZE: f64 = 72.0;

/// Style properties for blocks.
///
/// Every field is optional; a missing field renders with the documented
/// default (see [`BlockStyle::default_style`]). Colors are kept as CSS strings
/// because templates round-trip them verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<f64>,
}

impl BlockStyle {
    /// The fully populated style new blocks start from.
    pub fn default_style() -> Self {
        Self {
            background_color: Some("transparent".to_string()),
            border_color: Some("#000000".to_string()),
            border_width: Some(1.0),
            border_radius: Some(0.0),
            font_family: Some("Arial".to_string()),
            font_size: Some(14.0),
            font_weight: Some(FontWeight::Normal),
            font_style: Some(FontStyle::Normal),
            text_align: Some(TextAlign::Left),
            color: Some("#000000".to_string()),
            padding: Some(8.0),
        }
    }

    /// Return a copy with every unset field filled from the defaults.
    ///
    /// Numeric fields are brought back into their documented ranges: border
    /// width, radius and padding are non-negative and the font size stays
    /// within [`MIN_FONT_SIZE`]..=[`MAX_FONT_SIZE`].
    pub fn resolved(&self) -> Self {
        let defaults = Self::default_style();
        Self {
            background_color: self.background_color.clone().or(defaults.background_color),
            border_color: self.border_color.clone().or(defaults.border_color),
            border_width: self.border_width.or(defaults.border_width).map(|w| w.max(0.0)),
            border_radius: self.border_radius.or(defaults.border_radius).map(|r| r.max(0.0)),
            font_family: self.font_family.clone().or(defaults.font_family),
            font_size: self
                .font_size
                .or(defaults.font_size)
                .map(|s| s.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)),
            font_weight: self.font_weight.or(defaults.font_weight),
            font_style: self.font_style.or(defaults.font_style),
            text_align: self.text_align.or(defaults.text_align),
            color: self.color.clone().or(defaults.color),
            padding: self.padding.or(defaults.padding).map(|p| p.max(0.0)),
        }
    }

    /// Effective background color, `None` when transparent.
    pub fn fill(&self) -> Option<&str> {
        match self.background_color.as_deref() {
            None | Some("transparent") => None,
            Some(color) => Some(color),
        }
    }
}
