//! # papercard
//!
//! Offline paper wallet generation: pointer-driven entropy collection,
//! BIP-39 mnemonic construction and a Kaspa mainnet receive address.
//!
//! The core is a one-way pipeline:
//!
//! ```text
//! Accumulator -> condense -> mnemonic builder -> key derivation -> card
//! ```
//!
//! - [`Accumulator`] XOR-folds 16-byte samples (pointer position, delta,
//!   timestamp and a secure 32-bit random draw) into a 4096-byte pool.
//! - [`condense`] reduces a complete pool to a 32-byte SHA-256 [`Digest`].
//! - [`mnemonic`] turns the digest (first 16 bytes for 12 words, all 32 for
//!   24 words) into a seed phrase through the backend's entropy conversions.
//! - [`derivation`] expands phrase + passphrase into a seed, the master key,
//!   the receive key at `m/44'/111111'/0'/0/0` and its address.
//! - [`PaperWalletGenerator`] drives the collection session state machine
//!   and is the only place pipeline failures are caught.
//!
//! ## Quick start
//!
//! ```rust
//! use papercard::{KaspaBackend, PaperWalletGenerator, PointerEvent, SessionEvent, WordCount};
//!
//! let mut generator = PaperWalletGenerator::load(KaspaBackend::new(), WordCount::Twelve)?;
//! generator.generate();
//!
//! let mut i = 0;
//! loop {
//!     let event = PointerEvent::mouse(i % 640, i % 480, 3, -2);
//!     i += 1;
//!     match generator.add_sample(&event) {
//!         SessionEvent::Collecting { .. } => continue,
//!         _ => break,
//!     }
//! }
//!
//! let wallet = generator.wallet().expect("published");
//! assert!(wallet.address().starts_with("kaspa:"));
//! assert_eq!(wallet.seed_phrase().split_whitespace().count(), 12);
//! # Ok::<(), papercard::Error>(())
//! ```
//!
//! ## Trust boundary
//!
//! When a backend offers no entropy conversion, the builder asks the backend
//! for a mnemonic from its own randomness and the collected entropy is not
//! used. This is never silent: a warning is logged and the published wallet
//! carries [`Provenance::LibraryRandom`].

pub mod accumulator;
#[cfg(feature = "qr")]
pub mod card;
pub mod condenser;
pub mod config;
pub mod derivation;
pub mod kaspa;
pub mod mnemonic;
pub mod provenance;
pub mod session;
pub mod trail;
mod traits;

pub use accumulator::{
    Accumulator, EntropyPool, EntropySample, OsEntropy, PointerEvent, SampleProgress,
    SystemClock, POOL_SIZE, SAMPLE_LEN, TARGET_SAMPLES,
};
#[cfg(feature = "qr")]
pub use card::{Bitmap, BitmapRenderer, PaperCard, QrRenderer};
pub use condenser::{condense, Digest, DIGEST_LEN};
pub use config::{Config, ConfigError, ErrorCorrection, QrSettings, MAX_QR_PIXELS};
pub use derivation::{derive, DerivationStep, PaperWallet, ACCOUNT_INDEX, RECEIVE_INDEX};
pub use kaspa::KaspaBackend;
pub use mnemonic::{Conversion, EntropyInput, MnemonicValue, SeedPhrase, WordCount};
pub use provenance::{FallbackReason, Provenance};
pub use session::{PaperWalletGenerator, SessionEvent, SessionState};
pub use trail::{Trail, TrailSegment, TRAIL_MAX_AGE_MS};
pub use traits::{
    Backend, Capability, Clock, EntropySource, KeyBackend, MnemonicBackend,
    REQUIRED_CAPABILITIES,
};

/// Errors produced by the generation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The cryptographic backend lacks capabilities the pipeline needs.
    #[error("cryptographic backend is missing capabilities: {}", list_capabilities(.missing))]
    Load {
        /// Capabilities reported as unavailable.
        missing: Vec<Capability>,
    },

    /// The secure random source failed.
    #[error("secure random source failed: {0}")]
    Random(getrandom::Error),

    /// Condensing was requested before the sample target was reached.
    #[error("entropy collection incomplete: {count}/{target} samples", target = TARGET_SAMPLES)]
    IncompleteEntropy {
        /// Samples collected so far.
        count: u32,
    },

    /// Mnemonic construction or normalization failed.
    #[error("mnemonic construction failed: {0}")]
    Mnemonic(String),

    /// A key derivation step failed.
    #[error("{step} failed: {reason}")]
    Derivation {
        /// The step that failed.
        step: DerivationStep,
        /// Backend-provided reason (never contains key material).
        reason: String,
    },

    /// QR bitmap rendering failed.
    #[error("QR rendering failed: {0}")]
    Qr(String),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    pub(crate) fn derivation(step: DerivationStep, reason: impl std::fmt::Display) -> Self {
        Self::Derivation {
            step,
            reason: reason.to_string(),
        }
    }
}

fn list_capabilities(missing: &[Capability]) -> String {
    missing
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, Error>;
