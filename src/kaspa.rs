//! Kaspa mainnet backend over `bip39`, `bip32` and `kaspa-addresses`.
//!
//! Keys follow `m/44'/111111'/{account}'/0/{index}`; addresses are
//! version-0 (schnorr public key) on the `kaspa:` prefix.

use bip32::{ChildNumber, XPrv};
use bip39::{Language, Mnemonic};
use kaspa_addresses::{Address, Prefix, Version};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroizing;

use crate::derivation::DerivationStep;
use crate::mnemonic::{Conversion, EntropyInput, MnemonicValue, WordCount};
use crate::{Backend, Error, KeyBackend, MnemonicBackend};

/// BIP-44 purpose.
pub const PURPOSE: u32 = 44;
/// SLIP-44 coin type for Kaspa.
pub const COIN_TYPE: u32 = 111_111;
/// Non-change (receive) chain.
pub const RECEIVE_CHAIN: u32 = 0;

/// The only network addresses are encoded for.
pub const NETWORK: Prefix = Prefix::Mainnet;

#[derive(Debug, Clone, Copy, Default)]
pub struct KaspaBackend;

impl KaspaBackend {
    pub fn new() -> Self {
        Self
    }
}

fn mnemonic_error(e: bip39::Error) -> Error {
    Error::Mnemonic(e.to_string())
}

impl MnemonicBackend for KaspaBackend {
    fn supports(&self, _conversion: Conversion) -> bool {
        true
    }

    fn convert(
        &self,
        conversion: Conversion,
        input: EntropyInput<'_>,
    ) -> Result<MnemonicValue, Error> {
        let mnemonic = match (conversion, input) {
            (Conversion::Entropy, EntropyInput::Bytes(bytes)) => {
                Mnemonic::from_entropy(bytes).map_err(mnemonic_error)?
            }
            (Conversion::EntropyToMnemonic, EntropyInput::Bytes(bytes)) => {
                Mnemonic::from_entropy_in(Language::English, bytes).map_err(mnemonic_error)?
            }
            (Conversion::EntropyHex, EntropyInput::Hex(hex)) => {
                let bytes = Zeroizing::new(
                    hex::decode(hex).map_err(|e| Error::Mnemonic(e.to_string()))?,
                );
                Mnemonic::from_entropy(&bytes).map_err(mnemonic_error)?
            }
            (conversion, _) => {
                return Err(Error::Mnemonic(format!(
                    "{conversion} received entropy in the wrong form"
                )))
            }
        };
        Ok(MnemonicValue::from_serialized(mnemonic.to_string()))
    }

    fn random_mnemonic(&self, word_count: WordCount) -> Result<MnemonicValue, Error> {
        let len = word_count.entropy_bytes();
        let mut entropy = Zeroizing::new([0u8; 32]);
        OsRng
            .try_fill_bytes(&mut entropy[..len])
            .map_err(|e| Error::Mnemonic(format!("backend randomness failed: {e}")))?;
        let mnemonic = Mnemonic::from_entropy(&entropy[..len]).map_err(mnemonic_error)?;
        Ok(MnemonicValue::from_serialized(mnemonic.to_string()))
    }
}

impl KeyBackend for KaspaBackend {
    type ExtendedKey = XPrv;
    type PrivateKey = XPrv;

    fn seed(&self, phrase: &str, passphrase: &str) -> Result<Zeroizing<[u8; 64]>, Error> {
        let mnemonic = Mnemonic::parse_in(Language::English, phrase)
            .map_err(|e| Error::derivation(DerivationStep::SeedExpansion, e))?;
        Ok(Zeroizing::new(mnemonic.to_seed(passphrase)))
    }

    fn master_key(&self, seed: &[u8]) -> Result<XPrv, Error> {
        XPrv::new(seed).map_err(|e| Error::derivation(DerivationStep::MasterKey, e))
    }

    fn receive_chain(&self, master: &XPrv, account: u32) -> Result<XPrv, Error> {
        let path = [
            (PURPOSE, true),
            (COIN_TYPE, true),
            (account, true),
            (RECEIVE_CHAIN, false),
        ];

        let mut key = master.clone();
        for (index, hardened) in path {
            let child = ChildNumber::new(index, hardened)
                .map_err(|e| Error::derivation(DerivationStep::KeyGenerator, e))?;
            key = key
                .derive_child(child)
                .map_err(|e| Error::derivation(DerivationStep::KeyGenerator, e))?;
        }
        Ok(key)
    }

    fn receive_key(&self, chain: &XPrv, index: u32) -> Result<XPrv, Error> {
        let child = ChildNumber::new(index, false)
            .map_err(|e| Error::derivation(DerivationStep::ReceiveKey, e))?;
        chain
            .derive_child(child)
            .map_err(|e| Error::derivation(DerivationStep::ReceiveKey, e))
    }

    fn private_key_hex(&self, key: &XPrv) -> Zeroizing<String> {
        let bytes: Zeroizing<[u8; 32]> = Zeroizing::new(key.private_key().to_bytes().into());
        Zeroizing::new(hex::encode(&*bytes))
    }

    fn address(&self, key: &XPrv) -> Result<String, Error> {
        let public_key = key.public_key();
        let compressed = public_key.public_key().to_encoded_point(true);
        let bytes = compressed.as_bytes();
        if bytes.len() != 33 {
            return Err(Error::derivation(
                DerivationStep::AddressEncoding,
                format!("unexpected public key length {}", bytes.len()),
            ));
        }

        // Schnorr addresses carry the x coordinate only.
        let address = Address::new(NETWORK, Version::PubKey, &bytes[1..]);
        Ok(address.to_string())
    }
}

impl Backend for KaspaBackend {}
