//! Minimal color types for scene objects.

use serde::{Deserialize, Serialize};

/// Linear RGB, components in 0-1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// From a 24-bit `0xRRGGBB` value
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    pub fn scale(self, k: f32) -> Self {
        Self::new(self.r * k, self.g * k, self.b * k)
    }

    pub fn add(self, other: Rgb) -> Self {
        Self::new(self.r + other.r, self.g + other.g, self.b + other.b)
    }

    pub fn mul(self, other: Rgb) -> Self {
        Self::new(self.r * other.r, self.g * other.g, self.b * other.b)
    }

    pub fn clamped(self) -> Self {
        Self::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
        )
    }
}

/// Hue/saturation/lightness, all in 0-1 (hue wraps)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }

    pub fn to_rgb(self) -> Rgb {
        let h = self.h.rem_euclid(1.0);
        let s = self.s.clamp(0.0, 1.0);
        let l = self.l.clamp(0.0, 1.0);

        if s == 0.0 {
            return Rgb::new(l, l, l);
        }

        let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        Rgb::new(
            hue_to_channel(p, q, h + 1.0 / 3.0),
            hue_to_channel(p, q, h),
            hue_to_channel(p, q, h - 1.0 / 3.0),
        )
    }
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

impl From<Hsl> for Rgb {
    fn from(hsl: Hsl) -> Self {
        hsl.to_rgb()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgb, b: Rgb) -> bool {
        (a.r - b.r).abs() < 1e-4 && (a.g - b.g).abs() < 1e-4 && (a.b - b.b).abs() < 1e-4
    }

    #[test]
    fn test_primary_hues() {
        assert!(close(Hsl::new(0.0, 1.0, 0.5).to_rgb(), Rgb::new(1.0, 0.0, 0.0)));
        assert!(close(Hsl::new(1.0 / 3.0, 1.0, 0.5).to_rgb(), Rgb::new(0.0, 1.0, 0.0)));
        assert!(close(Hsl::new(2.0 / 3.0, 1.0, 0.5).to_rgb(), Rgb::new(0.0, 0.0, 1.0)));
        // hue wraps
        assert!(close(Hsl::new(1.0, 1.0, 0.5).to_rgb(), Rgb::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_grey_and_hex() {
        assert!(close(Hsl::new(0.3, 0.0, 0.25).to_rgb(), Rgb::new(0.25, 0.25, 0.25)));
        assert!(close(Rgb::from_hex(0xff0000), Rgb::new(1.0, 0.0, 0.0)));
        assert!(close(
            Rgb::from_hex(0x404040),
            Rgb::new(64.0 / 255.0, 64.0 / 255.0, 64.0 / 255.0)
        ));
    }
}
