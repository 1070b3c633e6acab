//! Validated hex color values.
//!
//! [`Color`] wraps a `#RRGGBB` string. The submitted spelling is kept as-is
//! so that a cell always reads back exactly what was painted.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::error::PlacementError;

/// Stock palette offered by the canvas client.
pub const DEFAULT_PALETTE: [&str; 18] = [
    "#000000", "#FFFFFF", "#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF",
    "#FFA500", "#800080", "#FFC0CB", "#A52A2A", "#808080", "#000080", "#008000", "#800000",
    "#FFD700", "#C0C0C0",
];

/// A `#RRGGBB` color (hex digits are case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "#FF0000")]
pub struct Color(String);

impl Color {
    /// Background shown for cells nobody has painted.
    pub const BACKGROUND_HEX: &'static str = "#FFFFFF";

    /// Parses a `#RRGGBB` string.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::InvalidColor`] if the value is not a `#`
    /// followed by exactly six hex digits.
    pub fn parse(value: &str) -> Result<Self, PlacementError> {
        if is_hex6(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(PlacementError::InvalidColor(value.to_string()))
        }
    }

    /// Parses user input that may omit the `#` or use the `#RGB` shorthand.
    ///
    /// The shorthand is expanded to six digits (`#F0A` becomes `#FF00AA`).
    #[must_use]
    pub fn from_user_input(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let with_hash = if trimmed.starts_with('#') {
            trimmed.to_string()
        } else {
            format!("#{trimmed}")
        };
        if is_hex6(&with_hash) {
            return Some(Self(with_hash));
        }
        let digits = with_hash.strip_prefix('#')?;
        if digits.len() == 3 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            let expanded: String = digits.chars().flat_map(|c| [c, c]).collect();
            return Some(Self(format!("#{expanded}")));
        }
        None
    }

    /// The background color.
    #[must_use]
    pub fn background() -> Self {
        Self(Self::BACKGROUND_HEX.to_string())
    }

    /// Black, the initially selected brush color.
    #[must_use]
    pub fn black() -> Self {
        Self("#000000".to_string())
    }

    /// Returns the color string as submitted.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when this is the background color, in any case.
    #[must_use]
    pub fn is_background(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::BACKGROUND_HEX)
    }

    /// Decodes the color into its RGB components.
    #[must_use]
    pub fn to_rgb(&self) -> [u8; 3] {
        let channel = |range: std::ops::Range<usize>| {
            self.0
                .get(range)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .unwrap_or(0)
        };
        [channel(1..3), channel(3..5), channel(5..7)]
    }
}

fn is_hex6(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|digits| digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()))
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn accepts_six_digit_hex_in_any_case() {
        assert!(Color::parse("#FF0000").is_ok());
        assert!(Color::parse("#ff00aa").is_ok());
        let Ok(c) = Color::parse("#aBcDeF") else {
            panic!("mixed case should parse");
        };
        assert_eq!(c.as_str(), "#aBcDeF");
    }

    #[test]
    fn rejects_malformed_values() {
        for bad in ["FF0000", "#FFF", "#GG0000", "#FF00000", "", "red"] {
            assert_eq!(
                Color::parse(bad),
                Err(PlacementError::InvalidColor(bad.to_string())),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn user_input_adds_hash_and_expands_shorthand() {
        assert_eq!(
            Color::from_user_input("00ff00").map(|c| c.to_string()),
            Some("#00ff00".to_string())
        );
        assert_eq!(
            Color::from_user_input("#F0A").map(|c| c.to_string()),
            Some("#FF00AA".to_string())
        );
        assert!(Color::from_user_input("#12").is_none());
    }

    #[test]
    fn rgb_decoding() {
        let Ok(c) = Color::parse("#FFA500") else {
            panic!("valid color");
        };
        assert_eq!(c.to_rgb(), [255, 165, 0]);
    }

    #[test]
    fn background_detection_ignores_case() {
        let Ok(c) = Color::parse("#ffffff") else {
            panic!("valid color");
        };
        assert!(c.is_background());
        assert!(Color::background().is_background());
    }

    #[test]
    fn palette_is_valid() {
        assert!(DEFAULT_PALETTE.iter().all(|hex| Color::parse(hex).is_ok()));
    }

    #[test]
    fn deserialize_validates() {
        assert!(serde_json::from_str::<Color>("\"#123456\"").is_ok());
        assert!(serde_json::from_str::<Color>("\"blue\"").is_err());
    }
}
