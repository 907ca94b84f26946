//! Colours, palettes and the per-gauge colour precedence

use std::fmt;
use std::str::FromStr;

/// RGBA colour, channels 0.0 to 1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::from_rgba8(r, g, b, 255)
    }

    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: a as f64 / 255.0,
        }
    }

    pub fn to_rgba8(&self) -> (u8, u8, u8, u8) {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        (channel(self.r), channel(self.g), channel(self.b), channel(self.a))
    }

    /// `#RRGGBB`, or `#RRGGBBAA` when not opaque
    pub fn to_hex(&self) -> String {
        let (r, g, b, a) = self.to_rgba8();
        if a == 255 {
            format!("#{:02X}{:02X}{:02X}", r, g, b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", r, g, b, a)
        }
    }

    /// `#RRGGBB` without alpha, for Pango markup
    pub fn to_rgb_hex(&self) -> String {
        let (r, g, b, _) = self.to_rgba8();
        format!("#{:02X}{:02X}{:02X}", r, g, b)
    }

    /// CSS `rgba()` notation
    pub fn to_css(&self) -> String {
        let (r, g, b, _) = self.to_rgba8();
        format!("rgba({}, {}, {}, {:.3})", r, g, b, self.a.clamp(0.0, 1.0))
    }

    /// Apply to a cairo context
    pub fn apply_to_cairo(&self, cr: &gtk::cairo::Context) {
        cr.set_source_rgba(self.r, self.g, self.b, self.a);
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid colour {0:?} (expected #RRGGBB or #RRGGBBAA)")]
pub struct ColorParseError(pub String);

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(err());
        }

        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        let alpha = if hex.len() == 8 { byte(6)? } else { 255 };
        Ok(Self::from_rgba8(byte(0)?, byte(2)?, byte(4)?, alpha))
    }
}

/// Stroke colour used when neither an override nor the palette has one
pub const FALLBACK_COLOR: Color = Color {
    r: 0.0,
    g: 122.0 / 255.0,
    b: 1.0,
    a: 1.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeVariant {
    #[default]
    Light,
    Dark,
}

impl ThemeVariant {
    pub fn palette(&self) -> Palette {
        match self {
            Self::Light => Palette::light(),
            Self::Dark => Palette::dark(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown theme {0:?} (expected light or dark)")]
pub struct UnknownTheme(pub String);

impl FromStr for ThemeVariant {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(UnknownTheme(s.to_string())),
        }
    }
}

/// Theme colours. Accent roles are optional so that a custom palette can
/// leave some of them to the fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub background: Color,
    pub card: Color,
    pub text: Color,
    /// Unfilled part of a ring
    pub track: Color,
    pub used: Option<Color>,
    pub free: Option<Color>,
    pub battery: Option<Color>,
    pub cpu: Option<Color>,
    pub ram_used: Option<Color>,
}

impl Palette {
    pub fn light() -> Self {
        Self {
            background: Color::from_rgb8(0xF2, 0xF2, 0xF7),
            card: Color::from_rgb8(0xFF, 0xFF, 0xFF),
            text: Color::from_rgb8(0x1C, 0x1C, 0x1E),
            track: Color::from_rgb8(0xE5, 0xE5, 0xEA),
            used: Some(Color::from_rgb8(0xFF, 0x3B, 0x30)),
            free: Some(Color::from_rgb8(0x34, 0xC7, 0x59)),
            battery: Some(Color::from_rgb8(0xFF, 0xD6, 0x0A)),
            cpu: Some(Color::from_rgb8(0xFF, 0x95, 0x00)),
            ram_used: Some(Color::from_rgb8(0xFF, 0x3B, 0x30)),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Color::from_rgb8(0x1C, 0x1C, 0x1E),
            card: Color::from_rgb8(0x2C, 0x2C, 0x2E),
            text: Color::from_rgb8(0xFF, 0xFF, 0xFF),
            track: Color::from_rgb8(0x3A, 0x3A, 0x3C),
            used: Some(Color::from_rgb8(0xFF, 0x45, 0x3A)),
            free: Some(Color::from_rgb8(0x30, 0xD1, 0x58)),
            battery: Some(Color::from_rgb8(0xFF, 0xD6, 0x0A)),
            cpu: Some(Color::from_rgb8(0xFF, 0x9F, 0x0A)),
            ram_used: Some(Color::from_rgb8(0xFF, 0x45, 0x3A)),
        }
    }

    /// Palette colour for a gauge slot, if this palette defines one
    pub fn accent(&self, slot: ColorSlot) -> Option<Color> {
        match slot {
            ColorSlot::StorageUsed => self.used,
            ColorSlot::StorageFree | ColorSlot::RamFree => self.free,
            ColorSlot::Battery => self.battery,
            ColorSlot::Cpu => self.cpu,
            ColorSlot::RamUsed => self.ram_used,
        }
    }
}

/// Every distinct gauge stroke the dashboard draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSlot {
    StorageUsed,
    StorageFree,
    Battery,
    Cpu,
    RamUsed,
    RamFree,
}

impl ColorSlot {
    pub const ALL: [ColorSlot; 6] = [
        Self::StorageUsed,
        Self::StorageFree,
        Self::Battery,
        Self::Cpu,
        Self::RamUsed,
        Self::RamFree,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::StorageUsed => "storage_used",
            Self::StorageFree => "storage_free",
            Self::Battery => "battery",
            Self::Cpu => "cpu",
            Self::RamUsed => "ram_used",
            Self::RamFree => "ram_free",
        }
    }
}

/// Caller-supplied per-slot colours
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorOverrides {
    pub storage_used: Option<Color>,
    pub storage_free: Option<Color>,
    pub battery: Option<Color>,
    pub cpu: Option<Color>,
    pub ram_used: Option<Color>,
    pub ram_free: Option<Color>,
}

impl ColorOverrides {
    pub fn get(&self, slot: ColorSlot) -> Option<Color> {
        match slot {
            ColorSlot::StorageUsed => self.storage_used,
            ColorSlot::StorageFree => self.storage_free,
            ColorSlot::Battery => self.battery,
            ColorSlot::Cpu => self.cpu,
            ColorSlot::RamUsed => self.ram_used,
            ColorSlot::RamFree => self.ram_free,
        }
    }

    pub fn set(&mut self, slot: ColorSlot, color: Option<Color>) {
        let field = match slot {
            ColorSlot::StorageUsed => &mut self.storage_used,
            ColorSlot::StorageFree => &mut self.storage_free,
            ColorSlot::Battery => &mut self.battery,
            ColorSlot::Cpu => &mut self.cpu,
            ColorSlot::RamUsed => &mut self.ram_used,
            ColorSlot::RamFree => &mut self.ram_free,
        };
        *field = color;
    }
}

/// Everything that decides how the gauges look, none of which affects polling
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Appearance {
    pub theme: ThemeVariant,
    /// Replaces the built-in palette of `theme` when set
    pub custom_palette: Option<Palette>,
    pub overrides: ColorOverrides,
}

impl Appearance {
    pub fn palette(&self) -> Palette {
        self.custom_palette
            .clone()
            .unwrap_or_else(|| self.theme.palette())
    }

    /// Override, then palette, then the hardcoded fallback
    pub fn resolve(&self, slot: ColorSlot) -> Color {
        resolve_color(slot, &self.overrides, &self.palette())
    }
}

pub fn resolve_color(slot: ColorSlot, overrides: &ColorOverrides, palette: &Palette) -> Color {
    overrides
        .get(slot)
        .or_else(|| palette.accent(slot))
        .unwrap_or(FALLBACK_COLOR)
}
