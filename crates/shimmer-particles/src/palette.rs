//! Named color schemes and palette resolution

use shimmer_core::Color;

/// Names accepted by `color_scheme`
pub const SCHEME_NAMES: &[&str] = &["glass", "aurora", "sunset", "neon", "ocean", "mono"];

/// Colors for a named scheme. Unknown names fall back to `glass`.
pub fn scheme(name: &str) -> Vec<Color> {
    let hexes: &[u32] = match name {
        "aurora" => &[0x7CFFCB, 0x4FACFE, 0xA18CD1, 0x00F2FE],
        "sunset" => &[0xFF7E5F, 0xFEB47B, 0xFF5E62, 0xFFC371],
        "neon" => &[0xFF00E6, 0x00FFF0, 0xFAFF00, 0x39FF14],
        "ocean" => &[0x2E3192, 0x1BFFFF, 0x0083B0, 0x00B4DB],
        "mono" => &[0xFFFFFF, 0xD9D9D9, 0xA6A6A6],
        _ => &[0xFFFFFF, 0xE0F7FF, 0xC9D6FF, 0xF5E6FF],
    };
    hexes.iter().map(|&h| Color::from_hex(h)).collect()
}

pub fn is_known_scheme(name: &str) -> bool {
    SCHEME_NAMES.contains(&name)
}

/// Resolve an emitter palette: its own hex colors first, then the scheme, then white.
///
/// Malformed entries are dropped; their text is returned alongside so the
/// caller can report them.
pub fn resolve(colors: &[String], scheme_name: &str) -> (Vec<Color>, Vec<String>) {
    let mut rejected = Vec::new();
    let mut palette: Vec<Color> = colors
        .iter()
        .filter_map(|c| match Color::parse_hex(c) {
            Ok(color) => Some(color),
            Err(_) => {
                rejected.push(c.clone());
                None
            }
        })
        .collect();

    if palette.is_empty() {
        palette = scheme(scheme_name);
    }
    if palette.is_empty() {
        palette.push(Color::WHITE);
    }
    (palette, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_named_scheme_has_colors() {
        for name in SCHEME_NAMES {
            assert!(!scheme(name).is_empty(), "{name} is empty");
        }
    }

    #[test]
    fn unknown_scheme_falls_back_to_glass() {
        assert_eq!(scheme("does-not-exist"), scheme("glass"));
        assert!(!is_known_scheme("does-not-exist"));
    }

    #[test]
    fn emitter_colors_take_precedence() {
        let (palette, rejected) = resolve(&["#ff0000".into(), "nope".into()], "neon");
        assert_eq!(palette, vec![Color::from_hex(0xFF0000)]);
        assert_eq!(rejected, vec!["nope".to_string()]);
    }

    #[test]
    fn all_malformed_uses_scheme() {
        let (palette, rejected) = resolve(&["#12".into()], "mono");
        assert_eq!(palette, scheme("mono"));
        assert_eq!(rejected.len(), 1);
    }
}
