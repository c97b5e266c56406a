//! Collection session state machine.
//!
//! ```text
//! idle --generate--> collecting --target reached--> finalizing --> idle
//!                        |
//!                        +--cancel--> idle
//! idle --skip_entropy--> finalizing --> idle
//! ```
//!
//! [`PaperWalletGenerator`] owns the one entropy session, enforces that only
//! one is active at a time, and is the boundary where every pipeline failure
//! is caught: a failed generation publishes nothing and leaves any earlier
//! wallet untouched.

use tracing::{debug, error, info, warn};
use zeroize::Zeroizing;

use crate::accumulator::{Accumulator, OsEntropy, PointerEvent, SystemClock, TARGET_SAMPLES};
use crate::derivation::{derive, PaperWallet};
use crate::mnemonic::{self, WordCount, CONVERSION_ORDER};
use crate::provenance::FallbackReason;
use crate::trail::Trail;
use crate::traits::REQUIRED_CAPABILITIES;
use crate::{Backend, Clock, EntropySource, Error, MnemonicBackend};

/// Progress is logged every this many samples.
const PROGRESS_LOG_INTERVAL: u32 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session; earlier progress may be visible but is inert.
    Idle,
    /// Input events are being folded into the pool.
    Collecting,
    /// Condense, mnemonic and derivation are running.
    Finalizing,
}

/// What a call on the generator did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    /// The call did not apply in the current state and changed nothing.
    Ignored,
    /// A sample was folded; collection continues.
    Collecting { count: u32, percent: f64 },
    /// A wallet was generated and published.
    Published,
    /// Generation failed; see [`PaperWalletGenerator::last_error`].
    Failed,
}

enum Material {
    Collected,
    Skipped,
}

/// Drives entropy collection and wallet generation.
pub struct PaperWalletGenerator<B, S = OsEntropy, C = SystemClock> {
    backend: B,
    accumulator: Accumulator<S, C>,
    word_count: WordCount,
    passphrase: Zeroizing<String>,
    state: SessionState,
    busy: bool,
    wallet: Option<PaperWallet>,
    last_error: Option<Error>,
}

impl<B: Backend> PaperWalletGenerator<B> {
    /// Load with the OS random source and the system clock.
    ///
    /// # Errors
    ///
    /// [`Error::Load`] if the backend lacks a required capability.
    pub fn load(backend: B, word_count: WordCount) -> Result<Self, Error> {
        Self::with_sources(backend, word_count, OsEntropy, SystemClock::new())
    }
}

impl<B: Backend, S: EntropySource, C: Clock> PaperWalletGenerator<B, S, C> {
    /// Load with explicit random source and clock.
    pub fn with_sources(
        backend: B,
        word_count: WordCount,
        source: S,
        clock: C,
    ) -> Result<Self, Error> {
        let missing: Vec<_> = backend
            .missing_capabilities()
            .into_iter()
            .filter(|c| REQUIRED_CAPABILITIES.contains(c))
            .collect();
        if !missing.is_empty() {
            error!(?missing, "cryptographic backend incomplete");
            return Err(Error::Load { missing });
        }

        if !CONVERSION_ORDER.iter().any(|c| backend.supports(*c)) {
            warn!("backend offers no entropy conversion; collected entropy will not be used");
        }

        Ok(Self {
            backend,
            accumulator: Accumulator::new(source, clock),
            word_count,
            passphrase: Zeroizing::new(String::new()),
            state: SessionState::Idle,
            busy: false,
            wallet: None,
            last_error: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Most recently published wallet.
    pub fn wallet(&self) -> Option<&PaperWallet> {
        self.wallet.as_ref()
    }

    /// Failure of the most recent generation, cleared by the next success.
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    pub fn accumulator(&self) -> &Accumulator<S, C> {
        &self.accumulator
    }

    /// Prune the pointer trail to the current time and return it for drawing.
    pub fn redraw_trail(&mut self) -> &Trail {
        self.accumulator.redraw_trail()
    }

    pub fn word_count(&self) -> WordCount {
        self.word_count
    }

    pub fn set_word_count(&mut self, word_count: WordCount) {
        self.word_count = word_count;
    }

    pub fn set_passphrase(&mut self, passphrase: impl Into<String>) {
        self.passphrase = Zeroizing::new(passphrase.into());
    }

    /// Start a collection session. Ignored unless idle.
    pub fn generate(&mut self) -> SessionEvent {
        if self.busy || self.state != SessionState::Idle {
            debug!(state = ?self.state, "generate ignored");
            return SessionEvent::Ignored;
        }

        self.accumulator.reset();
        self.state = SessionState::Collecting;
        info!(target_samples = TARGET_SAMPLES, "entropy collection started");
        SessionEvent::Collecting {
            count: 0,
            percent: 0.0,
        }
    }

    /// Feed one pointer or touch event.
    ///
    /// Reaching the target finalizes immediately, within this call.
    pub fn add_sample(&mut self, event: &PointerEvent) -> SessionEvent {
        if self.state != SessionState::Collecting {
            return SessionEvent::Ignored;
        }

        let progress = match self.accumulator.add_sample(event) {
            Ok(progress) => progress,
            Err(e) => {
                error!(error = %e, "entropy collection aborted");
                self.accumulator.discard();
                self.state = SessionState::Idle;
                self.last_error = Some(e);
                return SessionEvent::Failed;
            }
        };

        if progress.completed {
            return self.finalize(Material::Collected);
        }

        if progress.count % PROGRESS_LOG_INTERVAL == 0 {
            debug!(count = progress.count, "entropy collection progress");
        }

        SessionEvent::Collecting {
            count: progress.count,
            percent: self.accumulator.progress_percent(),
        }
    }

    /// Abandon the active collection, discarding its entropy.
    ///
    /// Returns `false` when there was nothing to cancel.
    pub fn cancel(&mut self) -> bool {
        if self.state != SessionState::Collecting {
            return false;
        }

        self.accumulator.reset();
        self.state = SessionState::Idle;
        info!("entropy collection cancelled");
        true
    }

    /// Generate from backend randomness without collecting. Ignored unless idle.
    pub fn skip_entropy(&mut self) -> SessionEvent {
        if self.busy || self.state != SessionState::Idle {
            debug!(state = ?self.state, "skip entropy ignored");
            return SessionEvent::Ignored;
        }
        self.finalize(Material::Skipped)
    }

    fn finalize(&mut self, material: Material) -> SessionEvent {
        if self.busy {
            return SessionEvent::Ignored;
        }
        self.busy = true;
        self.state = SessionState::Finalizing;

        let result = self.run_pipeline(material);

        self.accumulator.discard();
        self.state = SessionState::Idle;
        self.busy = false;

        match result {
            Ok(wallet) => {
                info!(
                    words = wallet.word_count().words(),
                    provenance = %wallet.provenance(),
                    "paper wallet generated"
                );
                self.wallet = Some(wallet);
                self.last_error = None;
                SessionEvent::Published
            }
            Err(e) => {
                error!(error = %e, "paper wallet generation failed");
                self.last_error = Some(e);
                SessionEvent::Failed
            }
        }
    }

    fn run_pipeline(&self, material: Material) -> Result<PaperWallet, Error> {
        let phrase = match material {
            Material::Collected => {
                let digest = self.accumulator.condense()?;
                mnemonic::from_digest(&self.backend, &digest, self.word_count)?
            }
            Material::Skipped => mnemonic::from_backend_randomness(
                &self.backend,
                self.word_count,
                FallbackReason::Skipped,
            )?,
        };

        if phrase.provenance().discarded_entropy() {
            warn!("wallet seed comes from backend randomness, not collected entropy");
        }

        derive(&self.backend, &phrase, &self.passphrase)
    }
}
