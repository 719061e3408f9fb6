//! OKLab color space, extended with alpha as a fourth channel.
//!
//! All clustering, nearest-entry search, and error diffusion run in this
//! space so the remap stays consistent with the objective the palette was
//! optimized for. Alpha is carried as a linear 0..1 channel alongside L, a, b;
//! since L also spans 0..1, a full opacity swing costs about as much as a
//! black-to-white swing, which keeps semi-transparent colors from collapsing
//! into their opaque neighbors.

/// OKLab color (Bjorn Ottosson's perceptually uniform space).
/// L: lightness [0, 1], a: green-red, b: blue-yellow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OKLab {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}

impl OKLab {
    pub const fn new(l: f32, a: f32, b: f32) -> Self {
        Self { l, a, b }
    }
}

/// OKLab plus alpha — the 4-D space the whole pipeline shares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OKLabA {
    pub l: f32,
    pub a: f32,
    pub b: f32,
    /// Linear alpha, 0.0 (transparent) to 1.0 (opaque).
    pub alpha: f32,
}

impl OKLabA {
    pub const fn new(l: f32, a: f32, b: f32, alpha: f32) -> Self {
        Self { l, a, b, alpha }
    }

    /// Squared Euclidean distance across all four channels.
    pub fn distance_sq(self, other: Self) -> f32 {
        let dl = self.l - other.l;
        let da = self.a - other.a;
        let db = self.b - other.b;
        let dalpha = self.alpha - other.alpha;
        dl * dl + da * da + db * db + dalpha * dalpha
    }

    pub fn color(self) -> OKLab {
        OKLab::new(self.l, self.a, self.b)
    }
}

// --- sRGB transfer function ---

/// sRGB gamma → linear (single channel, 0..255 → 0.0..1.0)
#[inline]
fn srgb_to_linear(c: u8) -> f32 {
    let c = c as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Linear → sRGB gamma (single channel, 0.0..1.0 → 0..255)
#[inline]
fn linear_to_srgb(c: f32) -> u8 {
    let c = c.clamp(0.0, 1.0);
    let s = if c <= 0.0031308 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (s * 255.0 + 0.5) as u8
}

// --- OKLab conversion (Bjorn Ottosson) ---
// Matrix constants are from the OKLab reference implementation — keep the
// author's original values, let the compiler truncate to f32.

/// Convert sRGB (0..255 per channel) to OKLab.
#[allow(clippy::excessive_precision)]
pub fn srgb_to_oklab(r: u8, g: u8, b: u8) -> OKLab {
    let r = srgb_to_linear(r);
    let g = srgb_to_linear(g);
    let b = srgb_to_linear(b);

    // Linear sRGB → LMS (Ottosson's M1 matrix)
    let l = 0.4122214708 * r + 0.5363325363 * g + 0.0514459929 * b;
    let m = 0.2119034982 * r + 0.6806995451 * g + 0.1073969566 * b;
    let s = 0.0883024619 * r + 0.2817188376 * g + 0.6299787005 * b;

    let l_ = l.cbrt();
    let m_ = m.cbrt();
    let s_ = s.cbrt();

    // LMS → OKLab (Ottosson's M2 matrix)
    OKLab {
        l: 0.2104542553 * l_ + 0.7936177850 * m_ - 0.0040720468 * s_,
        a: 1.9779984951 * l_ - 2.4285922050 * m_ + 0.4505937099 * s_,
        b: 0.0259040371 * l_ + 0.7827717662 * m_ - 0.8086757660 * s_,
    }
}

/// Convert an sRGBA pixel to OKLab + linear alpha.
pub fn rgba_to_oklaba(px: rgb::RGBA<u8>) -> OKLabA {
    let lab = srgb_to_oklab(px.r, px.g, px.b);
    OKLabA::new(lab.l, lab.a, lab.b, px.a as f32 / 255.0)
}

/// Convert OKLab to sRGB (0..255 per channel).
#[allow(clippy::excessive_precision)]
pub fn oklab_to_srgb(lab: OKLab) -> (u8, u8, u8) {
    // OKLab → LMS (inverse of M2)
    let l_ = lab.l + 0.3963377774 * lab.a + 0.2158037573 * lab.b;
    let m_ = lab.l - 0.1055613458 * lab.a - 0.0638541728 * lab.b;
    let s_ = lab.l - 0.0894841775 * lab.a - 1.2914855480 * lab.b;

    let l = l_ * l_ * l_;
    let m = m_ * m_ * m_;
    let s = s_ * s_ * s_;

    // LMS → linear sRGB (inverse of M1)
    let r = 4.0767416621 * l - 3.3077115913 * m + 0.2309699292 * s;
    let g = -1.2684380046 * l + 2.6097574011 * m - 0.3413193965 * s;
    let b = -0.0041960863 * l - 0.7034186147 * m + 1.7076147010 * s;

    (linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(b))
}

/// Convert an OKLab + alpha centroid back to an sRGBA entry.
pub fn oklaba_to_rgba(laba: OKLabA) -> rgb::RGBA<u8> {
    let (r, g, b) = oklab_to_srgb(laba.color());
    let a = (laba.alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    rgb::RGBA { r, g, b, a }
}
