//! Generate Command - collect entropy and print a paper wallet card
//!
//! Every byte read from stdin is one sample: the byte value is the x
//! position, the running offset the y position, and the change from the
//! previous byte the movement. Pipe something noisy in, or type at a
//! terminal in raw mode. EOF before the target cancels the session.

use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use tracing::{info, warn};

use papercard::{
    Config, KaspaBackend, PaperCard, PaperWalletGenerator, PointerEvent,
    QrRenderer, SessionEvent, WordCount, TARGET_SAMPLES,
};

/// Card output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Folded card with terminal QR codes
    Text,
    /// Wallet fields as JSON
    Json,
}

/// Generate a paper wallet
#[derive(Args)]
pub struct GenerateCommand {
    /// Seed phrase length (12 or 24); overrides the config file
    #[arg(short, long)]
    words: Option<WordCount>,

    /// BIP-39 passphrase for seed expansion
    #[arg(short, long, env = "PAPERCARD_PASSPHRASE", hide_env_values = true)]
    passphrase: Option<String>,

    /// Use backend randomness instead of collecting entropy from stdin
    #[arg(long)]
    skip_entropy: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl GenerateCommand {
    pub fn execute(self, config_path: Option<PathBuf>) -> anyhow::Result<()> {
        let config = match config_path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Config::load(&path)?
            }
            None => Config::default(),
        };
        let word_count = self.words.unwrap_or(config.word_count);

        let mut generator = PaperWalletGenerator::load(KaspaBackend::new(), word_count)?;
        if let Some(passphrase) = self.passphrase {
            generator.set_passphrase(passphrase);
        }

        let outcome = if self.skip_entropy {
            warn!("Skipping entropy collection; the seed comes from backend randomness");
            generator.skip_entropy()
        } else {
            generator.generate();
            info!("Collecting {} samples from stdin", TARGET_SAMPLES);
            collect_from_stdin(&mut generator)?
        };

        match outcome {
            SessionEvent::Published => {}
            SessionEvent::Failed => match generator.last_error() {
                Some(e) => anyhow::bail!("Generation failed: {}", e),
                None => anyhow::bail!("Generation failed"),
            },
            _ => {
                let collected = generator.accumulator().count();
                generator.cancel();
                anyhow::bail!(
                    "Input ended after {}/{} samples; session cancelled",
                    collected,
                    TARGET_SAMPLES
                );
            }
        }

        let Some(wallet) = generator.wallet() else {
            anyhow::bail!("No wallet was published");
        };

        let mut stdout = io::stdout().lock();
        match self.format {
            OutputFormat::Text => {
                let renderer = QrRenderer::from_settings(&config.qr);
                let card = PaperCard::render(wallet, &renderer, config.qr.pixels)?;
                stdout.write_all(card.to_text().as_bytes())?;
            }
            OutputFormat::Json => {
                let json = zeroize::Zeroizing::new(serde_json::to_string_pretty(wallet)?);
                writeln!(stdout, "{}", json.as_str())?;
            }
        }
        stdout.flush()?;

        Ok(())
    }
}

/// Feed stdin bytes until the session leaves collection or input ends.
fn collect_from_stdin(
    generator: &mut PaperWalletGenerator<KaspaBackend>,
) -> anyhow::Result<SessionEvent> {
    let mut stdin = io::stdin().lock();
    let mut buf = [0u8; 256];
    let mut offset: i32 = 0;
    let mut previous: i32 = 0;
    let mut last_percent = 0u32;

    loop {
        let read = stdin.read(&mut buf)?;
        if read == 0 {
            return Ok(SessionEvent::Ignored);
        }

        for &byte in &buf[..read] {
            let x = i32::from(byte);
            let event = PointerEvent::mouse(x, offset, x - previous, 1);
            previous = x;
            offset = offset.wrapping_add(1);

            match generator.add_sample(&event) {
                SessionEvent::Collecting { percent, .. } => {
                    let floor = percent as u32;
                    if floor >= last_percent + 10 {
                        last_percent = floor - floor % 10;
                        info!("Entropy collection {}%", last_percent);
                    }
                }
                other => return Ok(other),
            }
        }
    }
}
