//! Inline CSS declarations attached to document elements.

use std::fmt::Write;

/// CSS pixels per millimetre at 96 dpi.
pub const PX_PER_MM: f32 = 96.0 / 25.4;

/// Ordered list of `property: value` declarations, as found in a `style` attribute.
///
/// Setting an existing property replaces it in place and a new property is appended,
/// so serialization stays stable across set/restore cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    decls: Vec<(String, String)>,
}

/// The three declarations the PDF export overrides while rasterizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxStyleSnapshot {
    width: Option<String>,
    height: Option<String>,
    overflow: Option<String>,
}

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `a: b; c: d`. Malformed declarations are skipped.
    pub fn parse(css: &str) -> Self {
        let mut style = Self::new();
        for decl in css.split(';') {
            if let Some((prop, value)) = decl.split_once(':') {
                let (prop, value) = (prop.trim(), value.trim());
                if !prop.is_empty() && !value.is_empty() {
                    style.set(prop, value);
                }
            }
        }
        style
    }

    pub fn get(&self, prop: &str) -> Option<&str> {
        self.decls
            .iter()
            .find(|(p, _)| p == prop)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, prop: &str, value: impl Into<String>) {
        let value = value.into();
        match self.decls.iter_mut().find(|(p, _)| p == prop) {
            Some(slot) => slot.1 = value,
            None => self.decls.push((prop.to_string(), value)),
        }
    }

    pub fn remove(&mut self, prop: &str) {
        self.decls.retain(|(p, _)| p != prop);
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn to_css(&self) -> String {
        let mut out = String::new();
        for (i, (p, v)) in self.decls.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{p}: {v};");
        }
        out
    }

    /// Length in CSS px. Accepts `px`, `mm`, `pt` or a bare number.
    pub fn length_px(&self, prop: &str) -> Option<f32> {
        self.get(prop).and_then(parse_length_px)
    }

    pub fn snapshot_box(&self) -> BoxStyleSnapshot {
        BoxStyleSnapshot {
            width: self.get("width").map(str::to_string),
            height: self.get("height").map(str::to_string),
            overflow: self.get("overflow").map(str::to_string),
        }
    }

    pub fn restore_box(&mut self, snapshot: &BoxStyleSnapshot) {
        for (prop, value) in [
            ("width", &snapshot.width),
            ("height", &snapshot.height),
            ("overflow", &snapshot.overflow),
        ] {
            match value {
                Some(v) => self.set(prop, v.clone()),
                None => self.remove(prop),
            }
        }
    }
}

pub fn parse_length_px(raw: &str) -> Option<f32> {
    let raw = raw.trim();
    let (number, factor) = if let Some(n) = raw.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = raw.strip_suffix("mm") {
        (n, PX_PER_MM)
    } else if let Some(n) = raw.strip_suffix("pt") {
        (n, 96.0 / 72.0)
    } else {
        (raw, 1.0)
    };
    number.trim().parse::<f32>().ok().map(|v| v * factor)
}

/// Parses `#rgb`, `#rrggbb` or `#rrggbbaa` (alpha ignored).
pub fn parse_hex_color(raw: &str) -> Option<[u8; 3]> {
    let hex = raw.trim().strip_prefix('#')?;
    let expand = |c: u8| c * 17;
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok();
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => Some([expand(nibble(0)?), expand(nibble(1)?), expand(nibble(2)?)]),
        6 | 8 => Some([byte(0)?, byte(2)?, byte(4)?]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize_keep_order() {
        let style = InlineStyle::parse("color: #111; width:50%;  ; bogus");
        assert_eq!(style.to_css(), "color: #111; width: 50%;");
    }

    #[test]
    fn test_snapshot_restore_is_byte_identical() {
        let mut style = InlineStyle::parse("color: red; width: 210mm; padding: 4px");
        let before = style.to_css();
        let snap = style.snapshot_box();
        style.set("width", "794px");
        style.set("overflow", "visible");
        assert_ne!(style.to_css(), before);
        style.restore_box(&snap);
        assert_eq!(style.to_css(), before);
    }

    #[test]
    fn test_lengths() {
        assert_eq!(parse_length_px("12px"), Some(12.0));
        assert_eq!(parse_length_px("7"), Some(7.0));
        assert!((parse_length_px("210mm").unwrap() - 793.7).abs() < 0.1);
        assert_eq!(parse_length_px("auto"), None);
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(parse_hex_color("#fff"), Some([255, 255, 255]));
        assert_eq!(parse_hex_color("#1e1d64ff"), Some([0x1e, 0x1d, 0x64]));
        assert_eq!(parse_hex_color("red"), None);
        assert_eq!(parse_hex_color("#12345"), None);
    }
}
