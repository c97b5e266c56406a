//! QR bitmaps and the printable card.
//!
//! The card folds in two: the outside carries the address and its QR code,
//! the inside carries every secret (seed phrase, passphrase, private key and
//! the seed QR code).

use std::fmt::Write as _;

use qrcode::render::unicode;
use qrcode::{Color, EcLevel, QrCode};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::config::{ErrorCorrection, QrSettings, MAX_QR_PIXELS};
use crate::derivation::PaperWallet;
use crate::provenance::Provenance;
use crate::Error;

/// Two-tone RGB palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub dark: [u8; 3],
    pub light: [u8; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            dark: [0x00, 0x00, 0x00],
            light: [0xff, 0xff, 0xff],
        }
    }
}

/// Square two-tone bitmap. Pixels are row-major, `1` for dark.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Bitmap {
    size: u32,
    scale: u32,
    pixels: Vec<u8>,
    #[zeroize(skip)]
    palette: Palette,
}

impl Bitmap {
    /// Side length in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Pixels per QR module.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_dark(&self, x: u32, y: u32) -> bool {
        x < self.size
            && y < self.size
            && self.pixels[y as usize * self.size as usize + x as usize] == 1
    }

    /// Packed RGB, three bytes per pixel.
    pub fn to_rgb(&self) -> Zeroizing<Vec<u8>> {
        let mut out = Vec::with_capacity(self.pixels.len() * 3);
        for &p in &self.pixels {
            out.extend_from_slice(if p == 1 {
                &self.palette.dark
            } else {
                &self.palette.light
            });
        }
        Zeroizing::new(out)
    }

    /// Half-block text rendering, one character cell per two module rows.
    ///
    /// Light modules print as filled blocks so the code scans on dark
    /// terminal backgrounds.
    pub fn to_terminal(&self) -> Zeroizing<String> {
        let modules = self.size / self.scale;
        let mut out = String::new();
        for row in (0..modules).step_by(2) {
            for col in 0..modules {
                let top = self.module(col, row);
                let bottom = row + 1 < modules && self.module(col, row + 1);
                out.push(match (top, bottom) {
                    (false, false) => '█',
                    (true, true) => ' ',
                    (true, false) => '▄',
                    (false, true) => '▀',
                });
            }
            out.push('\n');
        }
        Zeroizing::new(out)
    }

    fn module(&self, col: u32, row: u32) -> bool {
        self.is_dark(col * self.scale, row * self.scale)
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("size", &self.size)
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}

/// Renders text to a square bitmap.
pub trait BitmapRenderer {
    /// Encode `text` into a bitmap no larger than `pixels` on a side, unless
    /// the code needs more than one pixel per module to fit.
    fn render(&self, text: &str, pixels: u32) -> Result<Bitmap, Error>;
}

/// QR renderer over the `qrcode` crate.
#[derive(Debug, Clone, Copy)]
pub struct QrRenderer {
    level: EcLevel,
    margin: u32,
    palette: Palette,
}

impl Default for QrRenderer {
    fn default() -> Self {
        Self::from_settings(&QrSettings::default())
    }
}

impl QrRenderer {
    pub fn from_settings(settings: &QrSettings) -> Self {
        let level = match settings.error_correction {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        };
        Self {
            level,
            margin: settings.margin,
            palette: Palette::default(),
        }
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    fn encode(&self, text: &str) -> Result<QrCode, Error> {
        QrCode::with_error_correction_level(text.trim().as_bytes(), self.level)
            .map_err(|e| Error::Qr(e.to_string()))
    }

    /// Render straight to terminal text with the crate's own renderer.
    pub fn render_terminal(&self, text: &str) -> Result<Zeroizing<String>, Error> {
        let code = self.encode(text)?;
        Ok(Zeroizing::new(
            code.render::<unicode::Dense1x2>()
                .dark_color(unicode::Dense1x2::Light)
                .light_color(unicode::Dense1x2::Dark)
                .build(),
        ))
    }
}

impl BitmapRenderer for QrRenderer {
    fn render(&self, text: &str, pixels: u32) -> Result<Bitmap, Error> {
        if pixels > MAX_QR_PIXELS {
            return Err(Error::Qr(format!(
                "{pixels} px exceeds the {MAX_QR_PIXELS} px bitmap limit"
            )));
        }

        let code = self.encode(text)?;
        let width = code.width();
        let colors = code.to_colors();
        let margin = self.margin as usize;

        let modules = margin
            .checked_mul(2)
            .and_then(|m| m.checked_add(width))
            .ok_or_else(|| Error::Qr("quiet zone too large".into()))?;
        let scale = (pixels as usize / modules).max(1);
        let size = modules
            .checked_mul(scale)
            .filter(|&size| u32::try_from(size).is_ok())
            .ok_or_else(|| Error::Qr("bitmap side overflows".into()))?;
        let area = size
            .checked_mul(size)
            .ok_or_else(|| Error::Qr("bitmap area overflows".into()))?;

        let mut bitmap = vec![0u8; area];
        for y in 0..size {
            let my = y / scale;
            if !(margin..margin + width).contains(&my) {
                continue;
            }
            for x in 0..size {
                let mx = x / scale;
                if !(margin..margin + width).contains(&mx) {
                    continue;
                }
                if colors[(my - margin) * width + (mx - margin)] == Color::Dark {
                    bitmap[y * size + x] = 1;
                }
            }
        }

        Ok(Bitmap {
            size: size as u32,
            scale: scale as u32,
            pixels: bitmap,
            palette: self.palette,
        })
    }
}

/// Rendered card content for one wallet.
pub struct PaperCard {
    address: String,
    address_qr: Bitmap,
    seed_phrase: Zeroizing<String>,
    passphrase: Zeroizing<String>,
    private_key_hex: Zeroizing<String>,
    seed_qr: Bitmap,
    provenance: Provenance,
}

impl PaperCard {
    /// Render both QR codes at `pixels` and collect the card text.
    pub fn render<R>(wallet: &PaperWallet, renderer: &R, pixels: u32) -> Result<Self, Error>
    where
        R: BitmapRenderer + ?Sized,
    {
        let address_qr = renderer.render(wallet.address(), pixels)?;
        let seed_qr = renderer.render(wallet.seed_phrase(), pixels)?;

        Ok(Self {
            address: wallet.address().to_owned(),
            address_qr,
            seed_phrase: Zeroizing::new(wallet.seed_phrase().to_owned()),
            passphrase: Zeroizing::new(wallet.passphrase().to_owned()),
            private_key_hex: Zeroizing::new(wallet.private_key_hex().to_owned()),
            seed_qr,
            provenance: wallet.provenance(),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn address_qr(&self) -> &Bitmap {
        &self.address_qr
    }

    pub fn seed_qr(&self) -> &Bitmap {
        &self.seed_qr
    }

    /// Both faces as terminal text.
    pub fn to_text(&self) -> Zeroizing<String> {
        let mut out = Zeroizing::new(String::new());
        let passphrase = if self.passphrase.is_empty() {
            "(none)"
        } else {
            self.passphrase.as_str()
        };
        let words = self.seed_phrase.split_whitespace().count();

        // Writing into a String cannot fail.
        let _ = writeln!(out, "== OUTSIDE ==");
        let _ = writeln!(out, "{}", self.address_qr.to_terminal().as_str());
        let _ = writeln!(out, "Address: {}", self.address);
        let _ = writeln!(out);
        let _ = writeln!(out, "== INSIDE ==");
        let _ = writeln!(out, "SECRET - DO NOT SHARE");
        let _ = writeln!(out, "Seed ({words} words): {}", self.seed_phrase.as_str());
        let _ = writeln!(out, "Passphrase: {passphrase}");
        let _ = writeln!(out, "Private key (hex): {}", self.private_key_hex.as_str());
        let _ = writeln!(out, "Entropy: {}", self.provenance);
        let _ = writeln!(out, "{}", self.seed_qr.to_terminal().as_str());
        out
    }
}

impl std::fmt::Debug for PaperCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaperCard")
            .field("address", &self.address)
            .field("provenance", &self.provenance)
            .finish_non_exhaustive()
    }
}
