//! Cell color values.
//!
//! Colors are 24-bit RGB. Text form is `#rgb` or `#rrggbb` on input and
//! always lowercase `#rrggbb` on output, which is also the wire form.

#[cfg(test)]
#[path = "color_test.rs"]
mod color_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::grid::ValidationError;

/// Largest packed RGB value.
const RGB_MAX: u32 = 0x00FF_FFFF;

/// A validated 24-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(u32);

impl Color {
    pub const WHITE: Self = Self(0x00FF_FFFF);
    pub const BLACK: Self = Self(0x0000_0000);

    #[must_use]
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Build a color from a packed `0xRRGGBB` value.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ColorOutOfRange`] when bits above the low 24 are set.
    pub fn from_packed(value: u32) -> Result<Self, ValidationError> {
        if value > RGB_MAX {
            return Err(ValidationError::ColorOutOfRange(value));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn packed(self) -> u32 {
        self.0
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn rgb(self) -> (u8, u8, u8) {
        ((self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

impl FromStr for Color {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidColor(raw.to_owned());
        let hex = raw.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        match hex.len() {
            3 => {
                let short = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
                let (r, g, b) = ((short >> 8) & 0xF, (short >> 4) & 0xF, short & 0xF);
                Ok(Self(((r * 0x11) << 16) | ((g * 0x11) << 8) | (b * 0x11)))
            }
            6 => u32::from_str_radix(hex, 16).map(Self).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Default picker palette.
pub const PALETTE: [Color; 12] = [
    Color::from_rgb(0x00, 0x00, 0x00),
    Color::from_rgb(0xFF, 0xFF, 0xFF),
    Color::from_rgb(0xFF, 0x00, 0x00),
    Color::from_rgb(0x00, 0xFF, 0x00),
    Color::from_rgb(0x00, 0x00, 0xFF),
    Color::from_rgb(0xFF, 0xFF, 0x00),
    Color::from_rgb(0xFF, 0x00, 0xFF),
    Color::from_rgb(0x00, 0xFF, 0xFF),
    Color::from_rgb(0xFF, 0xA5, 0x00),
    Color::from_rgb(0x80, 0x00, 0x80),
    Color::from_rgb(0x00, 0x80, 0x00),
    Color::from_rgb(0xA5, 0x2A, 0x2A),
];
