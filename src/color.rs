use serde::{Deserialize, Deserializer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    // Parses `RRGGBB` with an optional leading `#`.
    pub fn from_hex(hex: &str) -> Option<Rgb> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

        Some(Rgb(r, g, b))
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Rgb::from_hex(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid hex color '{raw}', expected RRGGBB"))
        })
    }
}

pub fn pick(rng: &mut fastrand::Rng, palette: &[Rgb]) -> Rgb {
    if palette.is_empty() {
        return Rgb::WHITE;
    }
    palette[rng.usize(0..palette.len())]
}

// Picks a palette entry different from `current` whenever the palette allows it.
pub fn pick_other(rng: &mut fastrand::Rng, palette: &[Rgb], current: Rgb) -> Rgb {
    if palette.iter().all(|c| *c == current) {
        return pick(rng, palette);
    }
    loop {
        let c = pick(rng, palette);
        if c != current {
            break c;
        }
    }
}

pub fn palette(hexes: &[&str]) -> Vec<Rgb> {
    hexes.iter().filter_map(|h| Rgb::from_hex(h)).collect()
}
