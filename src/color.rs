//! 24-bit color helpers. Pixels are `image::Rgb<u8>`; these functions convert
//! to and from packed `0xRRGGBB` values and the `"#RRGGBB"` text form used in
//! session files.

use image::Rgb;

pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Unpack `0xRRGGBB` (upper byte ignored).
pub fn from_packed(value: u32) -> Rgb<u8> {
    Rgb([(value >> 16) as u8, (value >> 8) as u8, value as u8])
}

pub fn to_packed(color: Rgb<u8>) -> u32 {
    let [r, g, b] = color.0;
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Per-channel addition clamped at 255.
pub fn saturating_add(a: Rgb<u8>, b: Rgb<u8>) -> Rgb<u8> {
    Rgb([
        a.0[0].saturating_add(b.0[0]),
        a.0[1].saturating_add(b.0[1]),
        a.0[2].saturating_add(b.0[2]),
    ])
}

pub fn format(color: Rgb<u8>) -> String {
    format!("#{:06x}", to_packed(color))
}

/// Parse `#RRGGBB`, `0xRRGGBB` or bare `RRGGBB`.
pub fn parse(text: &str) -> Option<Rgb<u8>> {
    let text = text.trim();
    let digits = text
        .strip_prefix('#')
        .or_else(|| text.strip_prefix("0x"))
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.len() != 6 {
        return None;
    }
    u32::from_str_radix(digits, 16).ok().map(from_packed)
}

/// Serde adapter storing a color as `"#rrggbb"`.
pub mod hex {
    use image::Rgb;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &Rgb<u8>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format(*color))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Rgb<u8>, D::Error> {
        let text = String::deserialize(d)?;
        super::parse(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color '{}'", text)))
    }
}
