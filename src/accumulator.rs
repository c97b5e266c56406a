//! Entropy accumulation from pointer and touch input.
//!
//! Each input event becomes one 16-byte [`EntropySample`]:
//!
//! | bytes  | field                          |
//! |--------|--------------------------------|
//! | 0..2   | x position (u16 LE)            |
//! | 2..4   | y position (u16 LE)            |
//! | 4..6   | x movement (u16 LE)            |
//! | 6..8   | y movement (u16 LE)            |
//! | 8..12  | timestamp µs, low 32 bits (LE) |
//! | 12..16 | secure random draw (u32 LE)    |
//!
//! Samples are XOR-folded into the pool at a circular write offset, so no
//! pool byte is ever overwritten, only perturbed.

use std::time::Instant;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::condenser::{condense, Digest};
use crate::trail::Trail;
use crate::{Clock, EntropySource, Error};

/// Pool length in bytes.
pub const POOL_SIZE: usize = 4096;

/// Packed sample length in bytes.
pub const SAMPLE_LEN: usize = 16;

/// Samples required before the pool may be condensed.
pub const TARGET_SAMPLES: u32 = 1280;

/// One pointer-move or touch-move event.
///
/// Missing fields count as zero when packed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerEvent {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub movement_x: Option<i32>,
    pub movement_y: Option<i32>,
}

impl PointerEvent {
    /// Mouse move with position and delta.
    pub fn mouse(x: i32, y: i32, movement_x: i32, movement_y: i32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            movement_x: Some(movement_x),
            movement_y: Some(movement_y),
        }
    }

    /// Touch move. Touch input carries no delta, so it is fixed at (1, 1).
    pub fn touch(x: i32, y: i32) -> Self {
        Self::mouse(x, y, 1, 1)
    }
}

/// A packed sample, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EntropySample([u8; SAMPLE_LEN]);

impl EntropySample {
    /// Pack an event, a timestamp and a random draw into the wire layout.
    pub fn pack(event: &PointerEvent, timestamp_us: u64, random: u32) -> Self {
        let mut bytes = [0u8; SAMPLE_LEN];
        bytes[0..2].copy_from_slice(&mask16(event.x).to_le_bytes());
        bytes[2..4].copy_from_slice(&mask16(event.y).to_le_bytes());
        bytes[4..6].copy_from_slice(&mask16(event.movement_x).to_le_bytes());
        bytes[6..8].copy_from_slice(&mask16(event.movement_y).to_le_bytes());
        bytes[8..12].copy_from_slice(&(timestamp_us as u32).to_le_bytes());
        bytes[12..16].copy_from_slice(&random.to_le_bytes());
        Self(bytes)
    }

    /// The packed little-endian record.
    pub fn as_bytes(&self) -> &[u8; SAMPLE_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for EntropySample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EntropySample([REDACTED])")
    }
}

fn mask16(value: Option<i32>) -> u16 {
    (value.unwrap_or(0) & 0xffff) as u16
}

/// Fixed-size rolling pool.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct EntropyPool {
    bytes: Box<[u8; POOL_SIZE]>,
    offset: usize,
}

impl Default for EntropyPool {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropyPool {
    /// An all-zero pool with the write offset at 0.
    pub fn new() -> Self {
        Self {
            bytes: Box::new([0u8; POOL_SIZE]),
            offset: 0,
        }
    }

    /// XOR `sample` in at the write offset, wrapping, then advance the offset.
    pub fn fold(&mut self, sample: &[u8; SAMPLE_LEN]) {
        for (i, byte) in sample.iter().enumerate() {
            self.bytes[(self.offset + i) % POOL_SIZE] ^= byte;
        }
        self.offset = (self.offset + SAMPLE_LEN) % POOL_SIZE;
    }

    /// Raw pool contents.
    pub fn as_bytes(&self) -> &[u8; POOL_SIZE] {
        &self.bytes
    }

    /// Always [`POOL_SIZE`].
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Current write offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Zero every byte and rewind the offset.
    pub fn clear(&mut self) {
        self.zeroize();
    }
}

impl std::fmt::Debug for EntropyPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntropyPool")
            .field("len", &POOL_SIZE)
            .field("offset", &self.offset)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Result of folding one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleProgress {
    /// Sample counter after this event.
    pub count: u32,
    /// `true` only for the event that moved the counter onto the target.
    pub completed: bool,
}

/// Collects samples for one session at a time.
///
/// # Example
///
/// ```rust
/// use papercard::{Accumulator, PointerEvent, TARGET_SAMPLES};
///
/// let mut acc = Accumulator::default();
/// let progress = acc.add_sample(&PointerEvent::mouse(10, 20, 1, 1))?;
/// assert_eq!(progress.count, 1);
/// assert!(!progress.completed);
/// assert!(acc.progress_percent() < 1.0);
/// assert!(acc.condense().is_err());
/// # Ok::<(), papercard::Error>(())
/// ```
pub struct Accumulator<S = OsEntropy, C = SystemClock> {
    pool: EntropyPool,
    count: u32,
    trail: Trail,
    source: S,
    clock: C,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new(OsEntropy, SystemClock::new())
    }
}

impl<S: EntropySource, C: Clock> Accumulator<S, C> {
    pub fn new(source: S, clock: C) -> Self {
        Self {
            pool: EntropyPool::new(),
            count: 0,
            trail: Trail::new(),
            source,
            clock,
        }
    }

    /// Zero the pool, the counter and the trail.
    pub fn reset(&mut self) {
        self.pool.clear();
        self.count = 0;
        self.trail.clear();
    }

    /// Zero the pool and trail but leave the counter readable.
    ///
    /// Used when a session ends: the progress shown to the user stays, the
    /// entropy does not.
    pub fn discard(&mut self) {
        self.pool.clear();
        self.trail.clear();
    }

    /// Fold one input event into the pool.
    ///
    /// Events past the target are still folded but do not move the counter.
    pub fn add_sample(&mut self, event: &PointerEvent) -> Result<SampleProgress, Error> {
        let random = self.source.next_u32()?;
        let now_us = self.clock.now_us();

        let sample = EntropySample::pack(event, now_us, random);
        self.pool.fold(sample.as_bytes());

        let before = self.count;
        self.count = (self.count + 1).min(TARGET_SAMPLES);

        if let (Some(x), Some(y)) = (event.x, event.y) {
            self.trail.push(x, y, now_us / 1_000);
        }
        self.trail.prune(now_us / 1_000);

        Ok(SampleProgress {
            count: self.count,
            completed: before < TARGET_SAMPLES && self.count == TARGET_SAMPLES,
        })
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Completion is exact equality with the target, never rounding.
    pub fn is_complete(&self) -> bool {
        self.count == TARGET_SAMPLES
    }

    /// `min(100, 100 * count / TARGET_SAMPLES)` as a float.
    pub fn progress_percent(&self) -> f64 {
        (f64::from(self.count) * 100.0 / f64::from(TARGET_SAMPLES)).min(100.0)
    }

    /// Integer percent for labels; reads 100 only at completion.
    pub fn progress_floor(&self) -> u32 {
        self.progress_percent().floor() as u32
    }

    /// Progress bar fill, never narrower than half a percent.
    pub fn bar_width_percent(&self) -> f64 {
        self.progress_percent().clamp(0.5, 100.0)
    }

    pub fn pool(&self) -> &EntropyPool {
        &self.pool
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    /// Prune and return the trail as of now.
    pub fn redraw_trail(&mut self) -> &Trail {
        let now_ms = self.clock.now_ms();
        self.trail.prune(now_ms);
        &self.trail
    }

    /// Condense the pool, refusing until the target has been reached.
    pub fn condense(&self) -> Result<Digest, Error> {
        if !self.is_complete() {
            return Err(Error::IncompleteEntropy { count: self.count });
        }
        Ok(condense(&self.pool))
    }
}

/// Operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn next_u32(&mut self) -> Result<u32, Error> {
        getrandom::u32().map_err(Error::Random)
    }
}

/// Monotonic clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_us(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(u32);

    impl EntropySource for FixedSource {
        fn next_u32(&mut self) -> Result<u32, Error> {
            Ok(self.0)
        }
    }

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now_us(&self) -> u64 {
            self.0
        }
    }

    fn fixed() -> Accumulator<FixedSource, FixedClock> {
        Accumulator::new(FixedSource(0xAABB_CCDD), FixedClock(0x0102_0304))
    }

    #[test]
    fn test_single_sample_lands_verbatim_in_zero_pool() {
        let mut acc = fixed();
        let progress = acc.add_sample(&PointerEvent::mouse(10, 20, 1, 1)).unwrap();

        let expected = [
            10, 0, 20, 0, 1, 0, 1, 0, // position, delta
            0x04, 0x03, 0x02, 0x01, // timestamp
            0xDD, 0xCC, 0xBB, 0xAA, // random draw
        ];
        assert_eq!(&acc.pool().as_bytes()[..16], &expected);
        assert!(acc.pool().as_bytes()[16..].iter().all(|&b| b == 0));
        assert_eq!(progress.count, 1);
        assert!(!progress.completed);
        assert!((acc.progress_percent() - 100.0 / 1280.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_fields_pack_as_zero() {
        let sample = EntropySample::pack(&PointerEvent::default(), 0, 0);
        assert_eq!(sample.as_bytes(), &[0u8; SAMPLE_LEN]);
    }

    #[test]
    fn test_negative_and_wide_values_are_masked() {
        let sample = EntropySample::pack(&PointerEvent::mouse(-1, 0x1_2345, -2, 0), 0, 0);
        assert_eq!(&sample.as_bytes()[0..2], &[0xff, 0xff]);
        assert_eq!(&sample.as_bytes()[2..4], &[0x45, 0x23]);
        assert_eq!(&sample.as_bytes()[4..6], &[0xfe, 0xff]);
    }

    #[test]
    fn test_timestamp_truncated_to_32_bits() {
        let sample = EntropySample::pack(&PointerEvent::default(), 0x1_0000_0007, 0);
        assert_eq!(&sample.as_bytes()[8..12], &[7, 0, 0, 0]);
    }

    #[test]
    fn test_touch_has_unit_delta() {
        let event = PointerEvent::touch(5, 6);
        assert_eq!(event.movement_x, Some(1));
        assert_eq!(event.movement_y, Some(1));
    }

    #[test]
    fn test_identical_samples_fold_back_to_zero() {
        let mut pool = EntropyPool::new();
        let sample = [0x5Au8; SAMPLE_LEN];
        // A full lap puts the second fold on the same bytes as the first.
        for _ in 0..(POOL_SIZE / SAMPLE_LEN) * 2 {
            pool.fold(&sample);
        }
        assert!(pool.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(pool.offset(), 0);
    }

    #[test]
    fn test_offset_wraps() {
        let mut pool = EntropyPool::new();
        for _ in 0..POOL_SIZE / SAMPLE_LEN {
            pool.fold(&[1u8; SAMPLE_LEN]);
        }
        assert_eq!(pool.offset(), 0);
        assert!(pool.as_bytes().iter().all(|&b| b == 1));
        pool.fold(&[2u8; SAMPLE_LEN]);
        assert_eq!(pool.offset(), SAMPLE_LEN);
        assert_eq!(pool.as_bytes()[0], 3);
        assert_eq!(pool.len(), POOL_SIZE);
    }

    #[test]
    fn test_counter_saturates_and_completes_once() {
        let mut acc = fixed();
        let event = PointerEvent::mouse(1, 2, 3, 4);
        let mut completions = 0;
        for _ in 0..TARGET_SAMPLES + 50 {
            if acc.add_sample(&event).unwrap().completed {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert_eq!(acc.count(), TARGET_SAMPLES);
        assert_eq!(acc.progress_percent(), 100.0);
    }

    #[test]
    fn test_rising_edge_at_1279() {
        let mut acc = fixed();
        let event = PointerEvent::mouse(1, 2, 3, 4);
        for _ in 0..TARGET_SAMPLES - 1 {
            assert!(!acc.add_sample(&event).unwrap().completed);
        }
        assert_eq!(acc.count(), 1279);
        assert_eq!(acc.progress_floor(), 99);
        assert!(acc.condense().is_err());

        let progress = acc.add_sample(&event).unwrap();
        assert!(progress.completed);
        assert_eq!(progress.count, TARGET_SAMPLES);
        assert_eq!(acc.progress_floor(), 100);
        assert!(acc.condense().is_ok());
    }

    struct SteppingClock(std::cell::Cell<u64>);

    impl Clock for SteppingClock {
        fn now_us(&self) -> u64 {
            let now = self.0.get();
            self.0.set(now + 100_000);
            now
        }
    }

    #[test]
    fn test_trail_pruned_while_sampling() {
        let mut acc = Accumulator::new(FixedSource(1), SteppingClock(Default::default()));
        for i in 0..100 {
            acc.add_sample(&PointerEvent::mouse(i, i, 1, 1)).unwrap();
        }
        // 100 ms per sample keeps about 2 s worth of segments.
        assert!(acc.trail().len() <= 21);
        assert!(!acc.trail().is_empty());
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let mut acc = fixed();
        for i in 0..10 {
            acc.add_sample(&PointerEvent::mouse(i, i, 1, 1)).unwrap();
        }
        acc.reset();
        assert_eq!(acc.count(), 0);
        assert_eq!(acc.pool().offset(), 0);
        assert!(acc.pool().as_bytes().iter().all(|&b| b == 0));
        assert!(acc.trail().is_empty());
    }

    #[test]
    fn test_discard_keeps_counter() {
        let mut acc = fixed();
        acc.add_sample(&PointerEvent::mouse(9, 9, 1, 1)).unwrap();
        acc.discard();
        assert_eq!(acc.count(), 1);
        assert!(acc.pool().as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_bar_width_floor() {
        let acc = fixed();
        assert_eq!(acc.bar_width_percent(), 0.5);
    }

    #[test]
    fn test_debug_does_not_leak_pool() {
        let mut acc = fixed();
        acc.add_sample(&PointerEvent::mouse(10, 20, 1, 1)).unwrap();
        let debug = format!("{:?}", acc.pool());
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("221")); // 0xDD
    }

    #[test]
    fn test_os_entropy_draws() {
        let mut source = OsEntropy;
        let draws: Vec<u32> = (0..8).map(|_| source.next_u32().unwrap()).collect();
        assert!(draws.windows(2).any(|w| w[0] != w[1]));
    }
}
