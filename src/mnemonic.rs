//! Seed material: from a condensed digest (or backend randomness) to words.
//!
//! # Conversion order
//!
//! The backend is asked for a direct entropy-to-mnemonic conversion through
//! each entry point in [`CONVERSION_ORDER`]; the first one that succeeds
//! wins. A present entry point that fails is logged and the next is tried.
//! If every present entry point failed, the last error is returned.
//!
//! # Trust boundary
//!
//! If the backend offers *no* conversion, [`from_digest`] asks the backend
//! for a mnemonic from its own randomness. The digest is then unused and
//! security reduces to the backend's RNG. The result is tagged
//! [`FallbackReason::NoEntropyConversion`] and a warning is logged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::condenser::Digest;
use crate::provenance::{FallbackReason, Provenance};
use crate::{Error, MnemonicBackend};

/// Supported phrase lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WordCount {
    /// 12 words (128-bit entropy)
    Twelve,
    /// 24 words (256-bit entropy)
    #[default]
    TwentyFour,
}

impl WordCount {
    /// Entropy bytes consumed from the digest.
    #[inline]
    pub const fn entropy_bytes(self) -> usize {
        match self {
            WordCount::Twelve => 16,
            WordCount::TwentyFour => 32,
        }
    }

    #[inline]
    pub const fn words(self) -> usize {
        match self {
            WordCount::Twelve => 12,
            WordCount::TwentyFour => 24,
        }
    }
}

impl TryFrom<u8> for WordCount {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            12 => Ok(WordCount::Twelve),
            24 => Ok(WordCount::TwentyFour),
            other => Err(format!("unsupported word count {other}, expected 12 or 24")),
        }
    }
}

impl From<WordCount> for u8 {
    fn from(value: WordCount) -> Self {
        value.words() as u8
    }
}

impl FromStr for WordCount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("invalid word count '{s}'"))?;
        WordCount::try_from(n)
    }
}

impl fmt::Display for WordCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.words())
    }
}

/// Entropy-to-mnemonic entry points a backend may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conversion {
    /// Primary entry point, raw bytes.
    Entropy,
    /// Secondary named alternative, raw bytes.
    EntropyToMnemonic,
    /// Hex-string alternative.
    EntropyHex,
}

/// Order in which conversions are attempted.
pub const CONVERSION_ORDER: [Conversion; 3] = [
    Conversion::Entropy,
    Conversion::EntropyToMnemonic,
    Conversion::EntropyHex,
];

impl Conversion {
    pub const fn name(self) -> &'static str {
        match self {
            Conversion::Entropy => "from_entropy",
            Conversion::EntropyToMnemonic => "entropy_to_mnemonic",
            Conversion::EntropyHex => "from_entropy_hex",
        }
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Entropy as handed to a conversion.
#[derive(Clone, Copy)]
pub enum EntropyInput<'a> {
    Bytes(&'a [u8]),
    /// Lowercase hex of the same bytes.
    Hex(&'a str),
}

impl fmt::Debug for EntropyInput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntropyInput::Bytes(b) => write!(f, "Bytes([REDACTED; {}])", b.len()),
            EntropyInput::Hex(h) => write!(f, "Hex([REDACTED; {}])", h.len()),
        }
    }
}

/// A mnemonic as serialized by a backend.
///
/// Some backends hand back the bare words, others a JSON object carrying a
/// `phrase` field. [`MnemonicValue::from_serialized`] tells them apart and
/// [`MnemonicValue::into_phrase`] yields the words either way.
pub enum MnemonicValue {
    Structured { phrase: String },
    Raw(String),
}

#[derive(Deserialize)]
struct StructuredPhrase {
    phrase: String,
}

impl MnemonicValue {
    /// Classify a backend string. Backends that hand back text go through
    /// here rather than building a variant themselves.
    ///
    /// Anything that is not a JSON object with a non-empty `phrase` string is
    /// kept as raw text.
    pub fn from_serialized(text: String) -> Self {
        match serde_json::from_str::<StructuredPhrase>(&text) {
            Ok(StructuredPhrase { phrase }) if !phrase.trim().is_empty() => {
                let mut text = text;
                text.zeroize();
                MnemonicValue::Structured { phrase }
            }
            Ok(StructuredPhrase { mut phrase }) => {
                phrase.zeroize();
                MnemonicValue::Raw(text)
            }
            Err(_) => MnemonicValue::Raw(text),
        }
    }

    /// Plain phrase text with whitespace normalized to single spaces.
    pub fn into_phrase(mut self) -> Zeroizing<String> {
        let text = match &mut self {
            MnemonicValue::Structured { phrase } => std::mem::take(phrase),
            MnemonicValue::Raw(text) => std::mem::take(text),
        };
        let text = Zeroizing::new(text);
        Zeroizing::new(text.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

impl Drop for MnemonicValue {
    fn drop(&mut self) {
        match self {
            MnemonicValue::Structured { phrase } => phrase.zeroize(),
            MnemonicValue::Raw(text) => text.zeroize(),
        }
    }
}

impl fmt::Debug for MnemonicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MnemonicValue::Structured { .. } => f.write_str("Structured { phrase: [REDACTED] }"),
            MnemonicValue::Raw(_) => f.write_str("Raw([REDACTED])"),
        }
    }
}

/// Words ready for key derivation.
pub struct SeedPhrase {
    phrase: Zeroizing<String>,
    word_count: WordCount,
    provenance: Provenance,
}

impl SeedPhrase {
    fn new(
        value: MnemonicValue,
        word_count: WordCount,
        provenance: Provenance,
    ) -> Result<Self, Error> {
        let phrase = value.into_phrase();
        let words = phrase.split_whitespace().count();
        if words != word_count.words() {
            return Err(Error::Mnemonic(format!(
                "backend returned {words} words, expected {word_count}"
            )));
        }
        Ok(Self {
            phrase,
            word_count,
            provenance,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.phrase
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.phrase.split_whitespace()
    }

    pub fn word_count(&self) -> WordCount {
        self.word_count
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }
}

impl fmt::Debug for SeedPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedPhrase")
            .field("word_count", &self.word_count)
            .field("provenance", &self.provenance)
            .field("phrase", &"[REDACTED]")
            .finish()
    }
}

/// Build a phrase from a condensed digest.
///
/// Twelve words use `digest[..16]` only; twenty-four use all 32 bytes.
pub fn from_digest<B>(backend: &B, digest: &Digest, word_count: WordCount) -> Result<SeedPhrase, Error>
where
    B: MnemonicBackend + ?Sized,
{
    let entropy = digest.prefix(word_count.entropy_bytes());
    let mut last_error = None;

    for conversion in CONVERSION_ORDER {
        if !backend.supports(conversion) {
            continue;
        }

        let result = match conversion {
            Conversion::EntropyHex => {
                let hex = Zeroizing::new(hex::encode(entropy));
                backend.convert(conversion, EntropyInput::Hex(&hex))
            }
            _ => backend.convert(conversion, EntropyInput::Bytes(entropy)),
        };

        match result {
            Ok(value) => {
                debug!(%conversion, words = word_count.words(), "mnemonic built from collected entropy");
                return SeedPhrase::new(
                    value,
                    word_count,
                    Provenance::CollectedEntropy { conversion },
                );
            }
            Err(e) => {
                warn!(%conversion, error = %e, "entropy conversion failed, trying next");
                last_error = Some(e);
            }
        }
    }

    if let Some(e) = last_error {
        return Err(e);
    }

    warn!("backend offers no entropy conversion; collected entropy discarded, using backend randomness");
    from_backend_randomness(backend, word_count, FallbackReason::NoEntropyConversion)
}

/// Build a phrase from the backend's own randomness.
pub fn from_backend_randomness<B>(
    backend: &B,
    word_count: WordCount,
    reason: FallbackReason,
) -> Result<SeedPhrase, Error>
where
    B: MnemonicBackend + ?Sized,
{
    let value = backend.random_mnemonic(word_count)?;
    SeedPhrase::new(value, word_count, Provenance::LibraryRandom { reason })
}
