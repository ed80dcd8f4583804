//! Particle color palette.
//!
//! A palette is an ordered list of colors with a parallel list of enable
//! flags. Each particle's color is an independent uniform pick among the
//! enabled entries, re-rolled whenever the palette changes. With nothing
//! enabled every particle is white.

use crate::error::ConfigError;
use crate::spawn::SpawnContext;
use crate::Vec3;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Color used when no palette entry is enabled.
pub const FALLBACK_COLOR: Vec3 = Vec3::ONE;

/// Ordered colors with parallel enable flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Vec3>,
    enabled: Vec<bool>,
}

impl Palette {
    /// Build from parallel lists. The lists must be the same length.
    pub fn new(colors: Vec<Vec3>, enabled: Vec<bool>) -> Result<Self, ConfigError> {
        if colors.len() != enabled.len() {
            return Err(ConfigError::PaletteMismatch {
                colors: colors.len(),
                enabled: enabled.len(),
            });
        }
        Ok(Self { colors, enabled })
    }

    /// Every color enabled.
    pub fn from_colors(colors: Vec<Vec3>) -> Self {
        let enabled = vec![true; colors.len()];
        Self { colors, enabled }
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    pub fn enabled(&self) -> &[bool] {
        &self.enabled
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Colors whose flag is set, in palette order.
    pub fn enabled_colors(&self) -> Vec<Vec3> {
        self.colors
            .iter()
            .zip(&self.enabled)
            .filter_map(|(color, on)| on.then_some(*color))
            .collect()
    }

    /// Replace entry `index`. Returns whether the palette changed.
    pub fn set_color(&mut self, index: usize, color: Vec3) -> bool {
        match self.colors.get_mut(index) {
            Some(slot) if *slot != color => {
                *slot = color;
                true
            }
            _ => false,
        }
    }

    /// Toggle entry `index`. Returns whether the palette changed.
    pub fn set_enabled(&mut self, index: usize, enabled: bool) -> bool {
        match self.enabled.get_mut(index) {
            Some(slot) if *slot != enabled => {
                *slot = enabled;
                true
            }
            _ => false,
        }
    }

    /// Uniform pick among the enabled colors, or [`FALLBACK_COLOR`].
    pub fn sample(&self, ctx: &mut SpawnContext) -> Vec3 {
        let count = self.enabled.iter().filter(|on| **on).count();
        if count == 0 {
            return FALLBACK_COLOR;
        }
        let pick = ctx.random_index(count);
        self.colors
            .iter()
            .zip(&self.enabled)
            .filter(|(_, on)| **on)
            .nth(pick)
            .map(|(color, _)| *color)
            .unwrap_or(FALLBACK_COLOR)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_colors(vec![
            Vec3::new(0xb0 as f32, 0x27 as f32, 0x27 as f32) / 255.0,
            Vec3::new(0x45 as f32, 0x45 as f32, 0x45 as f32) / 255.0,
            Vec3::new(0x15 as f32, 0x15 as f32, 0x4c as f32) / 255.0,
        ])
    }
}

/// Parse `#rrggbb` or `rrggbb` into an RGB vector in `[0, 1]`.
pub fn parse_hex(text: &str) -> Result<Vec3, ConfigError> {
    let digits = text.strip_prefix('#').unwrap_or(text);
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(ConfigError::InvalidColor(text.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map(|v| v as f32 / 255.0)
            .map_err(|_| ConfigError::InvalidColor(text.to_string()))
    };
    Ok(Vec3::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Format an RGB vector as `#rrggbb`, clamping each channel.
pub fn to_hex(color: Vec3) -> String {
    let [r, g, b] = color
        .clamp(Vec3::ZERO, Vec3::ONE)
        .to_array()
        .map(|c| (c * 255.0).round() as u8);
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// On-disk form of one palette entry.
#[derive(Serialize, Deserialize)]
struct PaletteEntry {
    color: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Serialize for Palette {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries: Vec<PaletteEntry> = self
            .colors
            .iter()
            .zip(&self.enabled)
            .map(|(color, enabled)| PaletteEntry {
                color: to_hex(*color),
                enabled: *enabled,
            })
            .collect();
        entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Palette {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<PaletteEntry>::deserialize(deserializer)?;
        let mut colors = Vec::with_capacity(entries.len());
        let mut enabled = Vec::with_capacity(entries.len());
        for entry in entries {
            colors.push(parse_hex(&entry.color).map_err(serde::de::Error::custom)?);
            enabled.push(entry.enabled);
        }
        Ok(Self { colors, enabled })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        let c = parse_hex("#ff0080").unwrap();
        assert_eq!(c.x, 1.0);
        assert_eq!(c.y, 0.0);
        assert!((c.z - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(parse_hex("000000").unwrap(), Vec3::ZERO);
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#fff").is_err());
        assert!(parse_hex("#gg0000").is_err());
        assert!(parse_hex("#ffé00").is_err());
    }

    #[test]
    fn test_hex_formatting() {
        assert_eq!(to_hex(Vec3::new(1.0, 0.0, 0.5)), "#ff0080");
        assert_eq!(to_hex(Vec3::splat(2.0)), "#ffffff");
    }

    #[test]
    fn test_mismatched_lengths() {
        let err = Palette::new(vec![Vec3::ONE], vec![true, false]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::PaletteMismatch { colors: 1, enabled: 2 }
        ));
    }

    #[test]
    fn test_no_enabled_is_white() {
        let palette = Palette::new(vec![Vec3::X, Vec3::Y], vec![false, false]).unwrap();
        let mut ctx = SpawnContext::from_seed(0);
        for _ in 0..20 {
            assert_eq!(palette.sample(&mut ctx), Vec3::ONE);
        }
        assert_eq!(Palette::from_colors(vec![]).sample(&mut ctx), Vec3::ONE);
    }

    #[test]
    fn test_sample_only_enabled() {
        let palette = Palette::new(vec![Vec3::X, Vec3::Y, Vec3::Z], vec![true, false, true]).unwrap();
        let mut ctx = SpawnContext::from_seed(5);
        let mut seen_x = false;
        let mut seen_z = false;
        for _ in 0..200 {
            let c = palette.sample(&mut ctx);
            assert_ne!(c, Vec3::Y);
            seen_x |= c == Vec3::X;
            seen_z |= c == Vec3::Z;
        }
        assert!(seen_x && seen_z);
        assert_eq!(palette.enabled_colors(), vec![Vec3::X, Vec3::Z]);
    }

    #[test]
    fn test_setters_report_change() {
        let mut palette = Palette::default();
        assert!(!palette.set_enabled(0, true));
        assert!(palette.set_enabled(0, false));
        assert!(!palette.set_enabled(7, false));
        assert!(palette.set_color(1, Vec3::ONE));
        assert!(!palette.set_color(1, Vec3::ONE));
    }

    #[test]
    fn test_json_entries() {
        let palette = Palette::new(vec![Vec3::X, Vec3::ONE], vec![true, false]).unwrap();
        let json = serde_json::to_string(&palette).unwrap();
        assert_eq!(
            json,
            r##"[{"color":"#ff0000","enabled":true},{"color":"#ffffff","enabled":false}]"##
        );
        let back: Palette = serde_json::from_str(&json).unwrap();
        assert_eq!(back, palette);

        let defaulted: Palette = serde_json::from_str(r##"[{"color":"#000000"}]"##).unwrap();
        assert_eq!(defaulted.enabled(), &[true]);
    }
}
