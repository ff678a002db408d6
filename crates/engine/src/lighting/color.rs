use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb`. Returns `None` for anything else.
    pub fn from_hex(raw: &str) -> Option<Self> {
        let hex = raw.strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_rgba(self, alpha: u8) -> [u8; 4] {
        [self.r, self.g, self.b, alpha]
    }
}

/// CSS functional form, `rgb(r, g, b)`.
impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(Rgb::from_hex("#ff6b35"), Some(Rgb::new(255, 107, 53)));
        assert_eq!(Rgb::from_hex("#FFEB3B"), Some(Rgb::new(255, 235, 59)));
    }

    #[test]
    fn rejects_malformed_hex() {
        for raw in ["ff6b35", "#ff6b3", "#ff6b3512", "#gg0000", "", "#ééé"] {
            assert_eq!(Rgb::from_hex(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn displays_css_form() {
        assert_eq!(Rgb::new(51, 51, 51).to_string(), "rgb(51, 51, 51)");
        assert_eq!(Rgb::new(255, 107, 53).to_hex(), "#ff6b35");
    }
}
