//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::piece::Catalog;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Board, text and piece colours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Outline colour shared by every piece.
    pub pen: Color,
    /// Piece fills in J, T, O, I order.
    pub fills: [Color; 4],
    /// Board background.
    pub bg: Color,
    /// Border.
    pub div_line: Color,
    /// Text (score, controls).
    pub main_fg: Color,
    /// Titles.
    pub title: Color,
    /// Secondary text (control hints).
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex for {key}: {value}")]
    InvalidHex { key: String, value: String },
}

const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(r, g, b)
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    /// Blue outlines on red, green, magenta and cyan blocks over a white board.
    pub fn classic() -> Self {
        Self {
            pen: rgb(0x00, 0x00, 0xFF),
            fills: [
                rgb(0xFF, 0x00, 0x00),
                rgb(0x00, 0xFF, 0x00),
                rgb(0xFF, 0x00, 0xFF),
                rgb(0x00, 0xFF, 0xFF),
            ],
            bg: rgb(0xFF, 0xFF, 0xFF),
            div_line: rgb(0x80, 0x80, 0x80),
            main_fg: rgb(0x20, 0x20, 0x20),
            title: rgb(0x00, 0x00, 0xC0),
            inactive_fg: rgb(0x70, 0x70, 0x70),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to the classic colours if path is None or the file does not exist.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => {
                let s = std::fs::read_to_string(p)?;
                Self::from_map(&parse_theme_file(&s))?
            }
            _ => Self::classic(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Override piece fills for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.pen = rgb(0x00, 0x00, 0x00);
                self.fills = [
                    rgb(0xFF, 0x00, 0x00),
                    rgb(0x00, 0xFF, 0x00),
                    rgb(0xFF, 0xFF, 0x00),
                    rgb(0x00, 0x88, 0xFF),
                ];
            }
            crate::Palette::Colorblind => {
                // Avoid relying on red vs green.
                self.fills = [
                    rgb(0x00, 0x77, 0xBB),
                    rgb(0xEE, 0x77, 0x33),
                    rgb(0x00, 0x99, 0x88),
                    rgb(0xEE, 0x33, 0x77),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Result<Self, ThemeError> {
        let get = |keys: &[&str], fallback: Color| -> Result<Color, ThemeError> {
            for key in keys {
                if let Some(v) = map.get(*key) {
                    return parse_hex(v).ok_or_else(|| ThemeError::InvalidHex {
                        key: (*key).to_string(),
                        value: v.clone(),
                    });
                }
            }
            Ok(fallback)
        };
        let d = Self::classic();
        Ok(Self {
            pen: get(&["cpu_box"], d.pen)?,
            fills: [
                get(&["cpu_end", "temp_end"], d.fills[0])?,
                get(&["mem_box", "cpu_start"], d.fills[1])?,
                get(&["net_box"], d.fills[2])?,
                get(&["hi_fg", "proc_misc"], d.fills[3])?,
            ],
            bg: get(&["main_bg", "meter_bg"], d.bg)?,
            div_line: get(&["div_line"], d.div_line)?,
            main_fg: get(&["main_fg"], d.main_fg)?,
            title: get(&["title"], d.title)?,
            inactive_fg: get(&["inactive_fg"], d.inactive_fg)?,
        })
    }

    /// Shape colours for the game.
    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.pen, self.fills)
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB".
pub fn parse_hex(s: &str) -> Option<Color> {
    let s = s.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&s[range], 16).ok();
    match s.len() {
        6 => Some(rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => Some(rgb(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::ShapeId;

    #[test]
    fn test_parse_hex_6() {
        assert_eq!(parse_hex("#98C379"), Some(Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        assert_eq!(parse_hex("#FFF"), Some(Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert_eq!(parse_hex("#12345"), None);
        assert_eq!(parse_hex("#GGGGGG"), None);
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[meter_bg]="#31353F""##);
        assert_eq!(map.get("meter_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_from_map_overrides_and_falls_back() {
        let map = parse_theme_file(
            "# comment\ntheme[main_bg]=\"#000000\"\ntheme[net_box]='#C678DD'\n",
        );
        let theme = Theme::from_map(&map).unwrap();
        assert_eq!(theme.bg, Color::Rgb(0, 0, 0));
        assert_eq!(theme.fills[2], Color::Rgb(0xC6, 0x78, 0xDD));
        assert_eq!(theme.fills[0], Theme::classic().fills[0]);
    }

    #[test]
    fn test_from_map_reports_bad_hex() {
        let map = parse_theme_file("theme[title]=\"#nothex\"");
        let err = Theme::from_map(&map).unwrap_err();
        assert!(matches!(err, ThemeError::InvalidHex { ref key, .. } if key == "title"));
    }

    #[test]
    fn test_missing_file_uses_classic() {
        let theme = Theme::load(
            Some(Path::new("/definitely/not/here.theme")),
            crate::Palette::Normal,
        )
        .unwrap();
        assert_eq!(theme, Theme::classic());
    }

    #[test]
    fn test_catalog_uses_theme_colours() {
        let mut theme = Theme::classic();
        theme.apply_palette(crate::Palette::Colorblind);
        let catalog = theme.catalog();
        assert_eq!(catalog.block(ShapeId::I).fill, theme.fills[3]);
        assert_eq!(catalog.block(ShapeId::J).pen, theme.pen);
    }
}
