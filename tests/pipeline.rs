//! End-to-end generation with deterministic random source and clock.

use std::cell::Cell;
use std::rc::Rc;

use papercard::{
    derive, mnemonic, Accumulator, Backend, Clock, Conversion, EntropyInput, EntropySource,
    Error, FallbackReason, KaspaBackend, KeyBackend, MnemonicBackend, MnemonicValue,
    PaperWalletGenerator, PointerEvent, Provenance, SessionEvent, SessionState, WordCount,
    TARGET_SAMPLES,
};
use zeroize::Zeroizing;

struct Lcg(u32);

impl EntropySource for Lcg {
    fn next_u32(&mut self) -> Result<u32, Error> {
        self.0 = self.0.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        Ok(self.0)
    }
}

#[derive(Clone, Default)]
struct StepClock(Rc<Cell<u64>>);

impl Clock for StepClock {
    fn now_us(&self) -> u64 {
        let now = self.0.get();
        self.0.set(now + 8_000);
        now
    }
}

fn event(i: u32) -> PointerEvent {
    let i = i as i32;
    PointerEvent::mouse(i * 7 % 1920, i * 3 % 1080, i % 5 - 2, 2 - i % 3)
}

fn run_session<B: Backend>(backend: B, word_count: WordCount) -> PaperWalletGenerator<B, Lcg, StepClock> {
    let mut generator =
        PaperWalletGenerator::with_sources(backend, word_count, Lcg(42), StepClock::default())
            .unwrap();
    assert!(matches!(generator.generate(), SessionEvent::Collecting { count: 0, .. }));

    for i in 0..TARGET_SAMPLES - 1 {
        assert!(matches!(
            generator.add_sample(&event(i)),
            SessionEvent::Collecting { .. }
        ));
    }
    assert_eq!(generator.add_sample(&event(TARGET_SAMPLES - 1)), SessionEvent::Published);
    generator
}

#[test]
fn session_matches_manual_pipeline() {
    let generator = run_session(KaspaBackend::new(), WordCount::TwentyFour);
    let wallet = generator.wallet().unwrap();

    let mut acc = Accumulator::new(Lcg(42), StepClock::default());
    for i in 0..TARGET_SAMPLES {
        acc.add_sample(&event(i)).unwrap();
    }
    let digest = acc.condense().unwrap();
    let backend = KaspaBackend::new();
    let phrase = mnemonic::from_digest(&backend, &digest, WordCount::TwentyFour).unwrap();
    let expected = derive(&backend, &phrase, "").unwrap();

    assert_eq!(wallet.seed_phrase(), expected.seed_phrase());
    assert_eq!(wallet.private_key_hex(), expected.private_key_hex());
    assert_eq!(wallet.address(), expected.address());
    assert_eq!(
        wallet.provenance(),
        Provenance::CollectedEntropy {
            conversion: Conversion::Entropy
        }
    );
}

#[test]
fn twelve_words_share_the_digest_prefix() {
    let twelve = run_session(KaspaBackend::new(), WordCount::Twelve);
    let twenty_four = run_session(KaspaBackend::new(), WordCount::TwentyFour);

    let short: Vec<&str> = twelve.wallet().unwrap().seed_phrase().split(' ').collect();
    let long: Vec<&str> = twenty_four.wallet().unwrap().seed_phrase().split(' ').collect();

    assert_eq!(short.len(), 12);
    assert_eq!(long.len(), 24);
    // The first 11 words encode the same 121 bits; the 12th mixes in the checksum.
    assert_eq!(short[..11], long[..11]);
}

#[test]
fn session_ends_idle_with_pool_discarded() {
    let generator = run_session(KaspaBackend::new(), WordCount::Twelve);
    assert_eq!(generator.state(), SessionState::Idle);
    assert!(!generator.is_busy());
    assert!(generator.accumulator().pool().as_bytes().iter().all(|&b| b == 0));
    assert_eq!(generator.accumulator().count(), TARGET_SAMPLES);
}

/// Kaspa keys but no entropy conversion at all.
struct RandomOnly(KaspaBackend);

impl MnemonicBackend for RandomOnly {
    fn supports(&self, _conversion: Conversion) -> bool {
        false
    }

    fn convert(&self, conversion: Conversion, _input: EntropyInput<'_>) -> Result<MnemonicValue, Error> {
        Err(Error::Mnemonic(format!("{conversion} unavailable")))
    }

    fn random_mnemonic(&self, word_count: WordCount) -> Result<MnemonicValue, Error> {
        self.0.random_mnemonic(word_count)
    }
}

impl KeyBackend for RandomOnly {
    type ExtendedKey = <KaspaBackend as KeyBackend>::ExtendedKey;
    type PrivateKey = <KaspaBackend as KeyBackend>::PrivateKey;

    fn seed(&self, phrase: &str, passphrase: &str) -> Result<Zeroizing<[u8; 64]>, Error> {
        self.0.seed(phrase, passphrase)
    }

    fn master_key(&self, seed: &[u8]) -> Result<Self::ExtendedKey, Error> {
        self.0.master_key(seed)
    }

    fn receive_chain(&self, master: &Self::ExtendedKey, account: u32) -> Result<Self::ExtendedKey, Error> {
        self.0.receive_chain(master, account)
    }

    fn receive_key(&self, chain: &Self::ExtendedKey, index: u32) -> Result<Self::PrivateKey, Error> {
        self.0.receive_key(chain, index)
    }

    fn private_key_hex(&self, key: &Self::PrivateKey) -> Zeroizing<String> {
        self.0.private_key_hex(key)
    }

    fn address(&self, key: &Self::PrivateKey) -> Result<String, Error> {
        self.0.address(key)
    }
}

impl Backend for RandomOnly {}

#[test]
fn missing_conversions_are_surfaced() {
    let generator = run_session(RandomOnly(KaspaBackend::new()), WordCount::Twelve);
    let wallet = generator.wallet().unwrap();

    assert_eq!(
        wallet.provenance(),
        Provenance::LibraryRandom {
            reason: FallbackReason::NoEntropyConversion
        }
    );
    assert!(wallet.provenance().discarded_entropy());
    assert!(wallet.address().starts_with("kaspa:q"));
}

#[test]
fn skip_then_collect() {
    let mut generator = PaperWalletGenerator::with_sources(
        KaspaBackend::new(),
        WordCount::Twelve,
        Lcg(7),
        StepClock::default(),
    )
    .unwrap();

    assert_eq!(generator.skip_entropy(), SessionEvent::Published);
    let skipped = generator.wallet().unwrap().address().to_owned();
    assert_eq!(
        generator.wallet().unwrap().provenance(),
        Provenance::LibraryRandom {
            reason: FallbackReason::Skipped
        }
    );

    generator.set_passphrase("extra words");
    generator.generate();
    for i in 0..TARGET_SAMPLES {
        generator.add_sample(&event(i));
    }
    let wallet = generator.wallet().unwrap();
    assert_ne!(wallet.address(), skipped);
    assert_eq!(wallet.passphrase(), "extra words");
    assert!(wallet.provenance().is_collected());
}

#[cfg(feature = "qr")]
#[test]
fn card_renders_for_generated_wallet() {
    use papercard::{PaperCard, QrRenderer, QrSettings};

    let generator = run_session(KaspaBackend::new(), WordCount::TwentyFour);
    let wallet = generator.wallet().unwrap();
    let settings = QrSettings::default();
    let card = PaperCard::render(wallet, &QrRenderer::from_settings(&settings), settings.pixels).unwrap();

    assert_eq!(card.address(), wallet.address());
    assert!(card.address_qr().size() <= settings.pixels);
    assert!(card.seed_qr().size() <= settings.pixels);
    assert!(card.to_text().contains("Seed (24 words)"));
}
