//! Key derivation pipeline: phrase + passphrase to private key and address.
//!
//! Steps run in a fixed order and none may be skipped:
//!
//! 1. seed expansion (BIP-39, empty passphrase by default)
//! 2. master extended private key (BIP-32)
//! 3. receive-chain key generator for account 0
//! 4. receive key at index 0
//! 5. address on the backend's single network
//!
//! Any failure aborts the whole derivation; a [`PaperWallet`] only exists
//! when all five steps succeeded. Nothing is cached.

use std::fmt;

use serde::{Serialize, Serializer};
use zeroize::Zeroizing;

use crate::mnemonic::{SeedPhrase, WordCount};
use crate::provenance::Provenance;
use crate::{Error, KeyBackend};

/// Account used for the receive key.
pub const ACCOUNT_INDEX: u32 = 0;
/// Index of the receive key on the non-change chain.
pub const RECEIVE_INDEX: u32 = 0;

/// One step of the pipeline, named in derivation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationStep {
    SeedExpansion,
    MasterKey,
    KeyGenerator,
    ReceiveKey,
    AddressEncoding,
}

impl fmt::Display for DerivationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DerivationStep::SeedExpansion => "seed expansion",
            DerivationStep::MasterKey => "master key construction",
            DerivationStep::KeyGenerator => "key generator construction",
            DerivationStep::ReceiveKey => "receive key derivation",
            DerivationStep::AddressEncoding => "address encoding",
        };
        f.write_str(name)
    }
}

/// Everything printed on the card. Secrets are zeroized on drop.
pub struct PaperWallet {
    seed_phrase: Zeroizing<String>,
    word_count: WordCount,
    passphrase: Zeroizing<String>,
    private_key_hex: Zeroizing<String>,
    address: String,
    provenance: Provenance,
}

impl PaperWallet {
    pub fn seed_phrase(&self) -> &str {
        &self.seed_phrase
    }

    pub fn word_count(&self) -> WordCount {
        self.word_count
    }

    /// Passphrase used for seed expansion; empty when none was set.
    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    pub fn private_key_hex(&self) -> &str {
        &self.private_key_hex
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }
}

impl fmt::Debug for PaperWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaperWallet")
            .field("address", &self.address)
            .field("word_count", &self.word_count)
            .field("provenance", &self.provenance)
            .field("seed_phrase", &"[REDACTED]")
            .field("passphrase", &"[REDACTED]")
            .field("private_key_hex", &"[REDACTED]")
            .finish()
    }
}

#[derive(Serialize)]
struct PaperWalletView<'a> {
    seed_phrase: &'a str,
    word_count: u8,
    passphrase: &'a str,
    private_key_hex: &'a str,
    address: &'a str,
    provenance: Provenance,
}

/// Serialization exists for displaying the card, e.g. as JSON on stdout.
impl Serialize for PaperWallet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PaperWalletView {
            seed_phrase: &self.seed_phrase,
            word_count: self.word_count.into(),
            passphrase: &self.passphrase,
            private_key_hex: &self.private_key_hex,
            address: &self.address,
            provenance: self.provenance,
        }
        .serialize(serializer)
    }
}

/// Run the full pipeline for `phrase` and `passphrase`.
pub fn derive<B>(backend: &B, phrase: &SeedPhrase, passphrase: &str) -> Result<PaperWallet, Error>
where
    B: KeyBackend + ?Sized,
{
    let seed = backend.seed(phrase.as_str(), passphrase)?;
    let master = backend.master_key(seed.as_slice())?;
    let chain = backend.receive_chain(&master, ACCOUNT_INDEX)?;
    let key = backend.receive_key(&chain, RECEIVE_INDEX)?;

    let address = backend.address(&key)?;
    let private_key_hex = backend.private_key_hex(&key);

    Ok(PaperWallet {
        seed_phrase: Zeroizing::new(phrase.as_str().to_owned()),
        word_count: phrase.word_count(),
        passphrase: Zeroizing::new(passphrase.to_owned()),
        private_key_hex,
        address,
        provenance: phrase.provenance(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condenser::Digest;
    use crate::mnemonic::from_digest;
    use crate::KaspaBackend;

    fn phrase(fill: u8, word_count: WordCount) -> SeedPhrase {
        from_digest(&KaspaBackend::new(), &Digest::from([fill; 32]), word_count).unwrap()
    }

    /// Kaspa key side, failing at a chosen step.
    struct FailAt(DerivationStep);

    impl KeyBackend for FailAt {
        type ExtendedKey = <KaspaBackend as KeyBackend>::ExtendedKey;
        type PrivateKey = <KaspaBackend as KeyBackend>::PrivateKey;

        fn seed(&self, phrase: &str, passphrase: &str) -> Result<Zeroizing<[u8; 64]>, Error> {
            self.check(DerivationStep::SeedExpansion)?;
            KaspaBackend.seed(phrase, passphrase)
        }

        fn master_key(&self, seed: &[u8]) -> Result<Self::ExtendedKey, Error> {
            self.check(DerivationStep::MasterKey)?;
            KaspaBackend.master_key(seed)
        }

        fn receive_chain(
            &self,
            master: &Self::ExtendedKey,
            account: u32,
        ) -> Result<Self::ExtendedKey, Error> {
            self.check(DerivationStep::KeyGenerator)?;
            KaspaBackend.receive_chain(master, account)
        }

        fn receive_key(
            &self,
            chain: &Self::ExtendedKey,
            index: u32,
        ) -> Result<Self::PrivateKey, Error> {
            self.check(DerivationStep::ReceiveKey)?;
            KaspaBackend.receive_key(chain, index)
        }

        fn private_key_hex(&self, key: &Self::PrivateKey) -> Zeroizing<String> {
            KaspaBackend.private_key_hex(key)
        }

        fn address(&self, key: &Self::PrivateKey) -> Result<String, Error> {
            self.check(DerivationStep::AddressEncoding)?;
            KaspaBackend.address(key)
        }
    }

    impl FailAt {
        fn check(&self, step: DerivationStep) -> Result<(), Error> {
            if self.0 == step {
                Err(Error::derivation(step, "injected"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let backend = KaspaBackend::new();
        let words = phrase(0x33, WordCount::TwentyFour);

        let a = derive(&backend, &words, "").unwrap();
        let b = derive(&backend, &words, "").unwrap();

        assert_eq!(a.private_key_hex(), b.private_key_hex());
        assert_eq!(a.address(), b.address());
        assert_eq!(a.private_key_hex().len(), 64);
    }

    #[test]
    fn test_passphrase_changes_key_and_address() {
        let backend = KaspaBackend::new();
        let words = phrase(0x33, WordCount::Twelve);

        let plain = derive(&backend, &words, "").unwrap();
        let protected = derive(&backend, &words, "test").unwrap();

        assert_ne!(plain.private_key_hex(), protected.private_key_hex());
        assert_ne!(plain.address(), protected.address());
        assert_eq!(protected.passphrase(), "test");
    }

    #[test]
    fn test_different_phrases_differ() {
        let backend = KaspaBackend::new();
        let a = derive(&backend, &phrase(1, WordCount::Twelve), "").unwrap();
        let b = derive(&backend, &phrase(2, WordCount::Twelve), "").unwrap();
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn test_every_step_failure_aborts() {
        let words = phrase(0x10, WordCount::Twelve);
        for step in [
            DerivationStep::SeedExpansion,
            DerivationStep::MasterKey,
            DerivationStep::KeyGenerator,
            DerivationStep::ReceiveKey,
            DerivationStep::AddressEncoding,
        ] {
            match derive(&FailAt(step), &words, "") {
                Err(Error::Derivation { step: failed, .. }) => assert_eq!(failed, step),
                other => panic!("expected failure at {step}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_wallet_carries_phrase_and_provenance() {
        let words = phrase(0, WordCount::Twelve);
        let wallet = derive(&KaspaBackend::new(), &words, "").unwrap();
        assert_eq!(wallet.seed_phrase(), words.as_str());
        assert_eq!(wallet.word_count(), WordCount::Twelve);
        assert!(wallet.provenance().is_collected());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let wallet = derive(&KaspaBackend::new(), &phrase(0, WordCount::Twelve), "hunter2").unwrap();
        let debug = format!("{:?}", wallet);
        assert!(!debug.contains("abandon"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains(wallet.private_key_hex()));
        assert!(debug.contains(wallet.address()));
    }

    #[test]
    fn test_json_shape() {
        let wallet = derive(&KaspaBackend::new(), &phrase(0, WordCount::Twelve), "").unwrap();
        let json: serde_json::Value = serde_json::to_value(&wallet).unwrap();
        assert_eq!(json["word_count"], 12);
        assert_eq!(json["address"], wallet.address());
        assert_eq!(json["provenance"]["type"], "CollectedEntropy");
        assert_eq!(json["provenance"]["conversion"], "entropy");
    }
}
