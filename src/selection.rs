use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseType {
    Transparent,
    Clear,
    Leather,
    Fabric,
}

const LEATHER_COLORS: [Color; 4] = [
    Color::new(0x1a, 0x1a, 0x1a),
    Color::new(0x8d, 0x6e, 0x63),
    Color::new(0xe6, 0x4a, 0x19),
    Color::new(0x19, 0x76, 0xd2),
];

const FABRIC_COLORS: [Color; 4] = [
    Color::new(0xf5, 0xf5, 0xf5),
    Color::new(0x33, 0x33, 0x33),
    Color::new(0x3f, 0x51, 0xb5),
    Color::new(0x00, 0x96, 0x88),
];

impl CaseType {
    /// Transparent and clear share the transmissive shell.
    pub fn is_transmissive(self) -> bool {
        matches!(self, CaseType::Transparent | CaseType::Clear)
    }

    /// Only the transparent case carries the uploaded photo.
    pub fn shows_photo(self) -> bool {
        self == CaseType::Transparent
    }

    /// Color applied when the case type is picked. The first palette entry, if any.
    pub fn default_color(self) -> Color {
        self.palette().first().copied().unwrap_or(Color::WHITE)
    }

    /// Colors offered for this case type. Transmissive cases are not tinted.
    pub fn palette(self) -> &'static [Color] {
        match self {
            CaseType::Leather => &LEATHER_COLORS,
            CaseType::Fabric => &FABRIC_COLORS,
            CaseType::Transparent | CaseType::Clear => &[],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CaseType::Transparent => "transparent",
            CaseType::Clear => "clear",
            CaseType::Leather => "leather",
            CaseType::Fabric => "fabric",
        }
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color {0:?} is not #rgb, #rrggbb or rgb(r, g, b)")]
    UnrecognizedFormat(String),
    #[error("color {0:?} has an invalid component")]
    InvalidComponent(String),
}

/// An sRGB color as it arrives from the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(0xff, 0xff, 0xff);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear-light RGB, the space material tints are specified in.
    pub fn to_linear(self) -> Vec3 {
        fn decode(channel: u8) -> f32 {
            let c = channel as f32 / 255.0;
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }

        Vec3::new(decode(self.r), decode(self.g), decode(self.b))
    }

    fn parse_hex(hex: &str, original: &str) -> Result<Color, ColorParseError> {
        let invalid = || ColorParseError::InvalidComponent(original.to_string());

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        match hex.len() {
            3 => {
                let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map(|d| d * 17);
                Ok(Color::new(
                    digit(0).map_err(|_| invalid())?,
                    digit(1).map_err(|_| invalid())?,
                    digit(2).map_err(|_| invalid())?,
                ))
            }
            6 => {
                let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
                Ok(Color::new(
                    pair(0).map_err(|_| invalid())?,
                    pair(2).map_err(|_| invalid())?,
                    pair(4).map_err(|_| invalid())?,
                ))
            }
            _ => Err(ColorParseError::UnrecognizedFormat(original.to_string())),
        }
    }

    fn parse_rgb_function(args: &str, original: &str) -> Result<Color, ColorParseError> {
        let components = args
            .split(',')
            .map(|part| part.trim().parse::<u8>())
            .collect::<Result<Vec<u8>, _>>()
            .map_err(|_| ColorParseError::InvalidComponent(original.to_string()))?;

        match components.as_slice() {
            &[r, g, b] => Ok(Color::new(r, g, b)),
            _ => Err(ColorParseError::UnrecognizedFormat(original.to_string())),
        }
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Some(hex) = trimmed.strip_prefix('#') {
            return Color::parse_hex(hex, s);
        }

        let lower = trimmed.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return Color::parse_rgb_function(args, s);
        }

        Err(ColorParseError::UnrecognizedFormat(s.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A sticker placed on a fabric case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub id: f64,
    #[serde(alias = "content")]
    pub glyph: String,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub case_type: CaseType,
    pub color: Color,
    #[serde(default)]
    pub custom_text: String,
    #[serde(default)]
    pub selected_font: Option<String>,
    #[serde(default)]
    pub patches: Vec<Patch>,
}

impl Selection {
    pub fn new(case_type: CaseType, color: Color) -> Self {
        Self {
            case_type,
            color,
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Selection> {
        serde_json::from_str(json)
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            case_type: CaseType::Transparent,
            color: Color::WHITE,
            custom_text: String::new(),
            selected_font: None,
            patches: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!("#8D6E63".parse(), Ok(Color::new(0x8d, 0x6e, 0x63)));
        assert_eq!("#fff".parse(), Ok(Color::WHITE));
        assert_eq!(" rgb(25, 118, 210) ".parse(), Ok(Color::new(25, 118, 210)));
    }

    #[test]
    fn rejects_malformed_colors() {
        assert!(matches!(
            "#12345".parse::<Color>(),
            Err(ColorParseError::UnrecognizedFormat(_))
        ));
        assert!(matches!(
            "#zzzzzz".parse::<Color>(),
            Err(ColorParseError::InvalidComponent(_))
        ));
        assert!(matches!(
            "rgb(300, 0, 0)".parse::<Color>(),
            Err(ColorParseError::InvalidComponent(_))
        ));
        assert!("saddlebrown".parse::<Color>().is_err());
    }

    #[test]
    fn linear_conversion_keeps_extremes() {
        assert_eq!(Color::WHITE.to_linear(), Vec3::ONE);
        assert_eq!(Color::new(0, 0, 0).to_linear(), Vec3::ZERO);
        let mid = Color::new(128, 128, 128).to_linear();
        assert!((mid.x - 0.2158).abs() < 1e-3);
    }

    #[test]
    fn selection_reads_ui_json() {
        let selection = Selection::from_json(
            r##"{
                "caseType": "fabric",
                "color": "#3F51B5",
                "customText": "HI",
                "patches": [{ "id": 0.42, "content": "⭐", "x": 0.1, "y": -0.2, "rotation": 0.3 }]
            }"##,
        )
        .unwrap();

        assert_eq!(selection.case_type, CaseType::Fabric);
        assert_eq!(selection.color, Color::new(0x3f, 0x51, 0xb5));
        assert_eq!(selection.patches[0].glyph, "⭐");
        assert_eq!(selection.selected_font, None);
    }

    #[test]
    fn unknown_case_type_is_rejected() {
        let result = Selection::from_json(r##"{ "caseType": "wood", "color": "#fff" }"##);
        assert!(result.is_err());
    }

    #[test]
    fn color_serializes_as_css_hex() {
        let json = serde_json::to_string(&Selection::new(CaseType::Leather, Color::new(141, 110, 99)))
            .unwrap();
        assert!(json.contains(r##""color":"#8d6e63""##));
        assert!(json.contains(r#""caseType":"leather""#));
    }

    #[test]
    fn case_types_bring_their_own_colors() {
        assert_eq!(CaseType::Leather.default_color(), "#1a1a1a".parse::<Color>().unwrap());
        assert_eq!(CaseType::Fabric.default_color(), "#f5f5f5".parse::<Color>().unwrap());
        assert_eq!(CaseType::Transparent.default_color(), Color::WHITE);
        assert_eq!(CaseType::Clear.default_color(), Color::WHITE);

        assert!(CaseType::Leather.palette().contains(&"#E64A19".parse().unwrap()));
        assert!(CaseType::Fabric.palette().contains(&"#009688".parse().unwrap()));
        assert!(CaseType::Transparent.palette().is_empty());
    }

    #[test]
    fn only_transparent_shows_the_photo() {
        assert!(CaseType::Transparent.shows_photo());
        assert!(!CaseType::Clear.shows_photo());
        assert!(CaseType::Clear.is_transmissive());
        assert!(!CaseType::Leather.shows_photo());
    }
}
