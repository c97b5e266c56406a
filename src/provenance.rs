//! Where a wallet's seed entropy came from.
//!
//! Attached to every published wallet so that a fallback to backend
//! randomness is visible on the card, not only in the logs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mnemonic::Conversion;

/// Origin of the entropy behind a seed phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Provenance {
    /// Collected pointer entropy, converted by the named entry point.
    CollectedEntropy {
        /// Conversion that produced the phrase.
        conversion: Conversion,
    },
    /// The backend's own randomness. Collected entropy, if any, was unused.
    LibraryRandom {
        /// Why the backend's randomness was used.
        reason: FallbackReason,
    },
}

/// Reason for using backend randomness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The user chose to skip collection.
    Skipped,
    /// Collection finished but the backend offers no entropy conversion.
    NoEntropyConversion,
}

impl Provenance {
    /// Check if the collected entropy determined the phrase.
    pub fn is_collected(&self) -> bool {
        matches!(self, Provenance::CollectedEntropy { .. })
    }

    /// Check if collected entropy was thrown away for this wallet.
    pub fn discarded_entropy(&self) -> bool {
        matches!(
            self,
            Provenance::LibraryRandom {
                reason: FallbackReason::NoEntropyConversion
            }
        )
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::CollectedEntropy { conversion } => {
                write!(f, "collected entropy ({conversion})")
            }
            Provenance::LibraryRandom {
                reason: FallbackReason::Skipped,
            } => f.write_str("backend randomness (entropy collection skipped)"),
            Provenance::LibraryRandom {
                reason: FallbackReason::NoEntropyConversion,
            } => f.write_str(
                "backend randomness (backend cannot take entropy; collected entropy discarded)",
            ),
        }
    }
}
