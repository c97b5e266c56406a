//! Core traits at the seams of the pipeline.
//!
//! - [`EntropySource`]: secure 32-bit draws folded into every sample
//! - [`Clock`]: high-resolution timestamps for samples and the trail
//! - [`MnemonicBackend`] / [`KeyBackend`]: the external BIP-39 / BIP-32 /
//!   address capability, consumed opaquely
//! - [`Backend`]: both of the above plus a load-time capability probe
//!
//! # Implementing a test source
//!
//! ```rust
//! use papercard::{EntropySource, Error};
//!
//! struct Fixed(u32);
//!
//! impl EntropySource for Fixed {
//!     fn next_u32(&mut self) -> Result<u32, Error> {
//!         Ok(self.0)
//!     }
//! }
//! ```

use std::fmt;

use zeroize::Zeroizing;

use crate::mnemonic::{Conversion, EntropyInput, MnemonicValue, WordCount};
use crate::Error;

/// Source of cryptographically secure randomness.
///
/// One draw is mixed into every entropy sample, so a replayed or scripted
/// pointer path still yields a fresh pool per session.
///
/// # Implementors
///
/// - [`OsEntropy`](crate::OsEntropy): operating system CSPRNG via `getrandom`
pub trait EntropySource {
    /// Draw one 32-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Random`] if the underlying generator is unavailable.
    fn next_u32(&mut self) -> Result<u32, Error>;
}

/// Monotonic microsecond clock.
pub trait Clock {
    /// Microseconds since an arbitrary fixed origin.
    fn now_us(&self) -> u64;

    /// Milliseconds since the same origin.
    fn now_ms(&self) -> u64 {
        self.now_us() / 1_000
    }
}

/// Mnemonic half of the cryptographic capability.
pub trait MnemonicBackend {
    /// Whether this backend offers the given entropy conversion entry point.
    fn supports(&self, conversion: Conversion) -> bool;

    /// Build a mnemonic from caller-supplied entropy.
    ///
    /// Only called for conversions where [`supports`](Self::supports)
    /// returned `true`.
    fn convert(&self, conversion: Conversion, input: EntropyInput<'_>)
        -> Result<MnemonicValue, Error>;

    /// Build a mnemonic of `word_count` words from the backend's own
    /// randomness. Caller-collected entropy plays no part in the result.
    fn random_mnemonic(&self, word_count: WordCount) -> Result<MnemonicValue, Error>;
}

/// Key derivation half of the cryptographic capability.
///
/// Every method maps to one step of the derivation pipeline and reports
/// failures as [`Error::Derivation`] tagged with that step.
pub trait KeyBackend {
    /// Extended private key (master key and chain-level keys).
    type ExtendedKey;
    /// Leaf private key that owns an address.
    type PrivateKey;

    /// Expand phrase + passphrase into 64 seed bytes.
    fn seed(&self, phrase: &str, passphrase: &str) -> Result<Zeroizing<[u8; 64]>, Error>;

    /// Master extended private key from seed bytes.
    fn master_key(&self, seed: &[u8]) -> Result<Self::ExtendedKey, Error>;

    /// Key generator for the non-change chain of `account`.
    fn receive_chain(
        &self,
        master: &Self::ExtendedKey,
        account: u32,
    ) -> Result<Self::ExtendedKey, Error>;

    /// Receive key at `index` on a chain returned by
    /// [`receive_chain`](Self::receive_chain).
    fn receive_key(&self, chain: &Self::ExtendedKey, index: u32)
        -> Result<Self::PrivateKey, Error>;

    /// Lowercase hex serialization of the private key.
    fn private_key_hex(&self, key: &Self::PrivateKey) -> Zeroizing<String>;

    /// Address of the key on the backend's fixed network.
    fn address(&self, key: &Self::PrivateKey) -> Result<String, Error>;
}

/// A complete cryptographic backend.
pub trait Backend: MnemonicBackend + KeyBackend {
    /// Capabilities this backend cannot provide.
    ///
    /// Probed once when a generator is loaded; any entry in
    /// [`REQUIRED_CAPABILITIES`] makes loading fail.
    fn missing_capabilities(&self) -> Vec<Capability> {
        Vec::new()
    }
}

/// One capability of the external cryptographic library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Mnemonic from internal randomness at a given word count.
    RandomMnemonic,
    /// Seed expansion from (mnemonic, passphrase).
    SeedExpansion,
    /// Extended private key from seed.
    MasterKey,
    /// Key generator scoped to an extended private key.
    KeyGenerator,
    /// Receive key derivation by index.
    ReceiveKey,
    /// Address encoding for the selected network.
    AddressEncoding,
    /// Mnemonic and key serialization back to text.
    Serialization,
}

/// Capabilities without which a generator refuses to load.
///
/// Entropy conversions are absent from this list: without one, the mnemonic
/// builder falls back to [`Capability::RandomMnemonic`].
pub const REQUIRED_CAPABILITIES: [Capability; 7] = [
    Capability::RandomMnemonic,
    Capability::SeedExpansion,
    Capability::MasterKey,
    Capability::KeyGenerator,
    Capability::ReceiveKey,
    Capability::AddressEncoding,
    Capability::Serialization,
];

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::RandomMnemonic => "random mnemonic",
            Capability::SeedExpansion => "seed expansion",
            Capability::MasterKey => "master key",
            Capability::KeyGenerator => "key generator",
            Capability::ReceiveKey => "receive key",
            Capability::AddressEncoding => "address encoding",
            Capability::Serialization => "serialization",
        };
        f.write_str(name)
    }
}
