//! Fading pointer trail shown while entropy is collected.
//!
//! Purely cosmetic: nothing here feeds the pool.

use std::collections::VecDeque;

/// Segments older than this are dropped on redraw.
pub const TRAIL_MAX_AGE_MS: u64 = 2_000;

/// A line segment between two consecutive pointer positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailSegment {
    pub from: (i32, i32),
    pub to: (i32, i32),
    /// Creation time in milliseconds on the accumulator's clock.
    pub at_ms: u64,
}

impl TrailSegment {
    /// Opacity in `[0, 1]`, fading linearly to zero at [`TRAIL_MAX_AGE_MS`].
    pub fn alpha(&self, now_ms: u64) -> f32 {
        let age = now_ms.saturating_sub(self.at_ms).min(TRAIL_MAX_AGE_MS);
        1.0 - age as f32 / TRAIL_MAX_AGE_MS as f32
    }
}

/// Recent pointer path as time-stamped segments, oldest first.
#[derive(Debug, Clone, Default)]
pub struct Trail {
    last: Option<(i32, i32)>,
    segments: VecDeque<TrailSegment>,
}

impl Trail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the trail to `(x, y)`. The first point only anchors it.
    pub fn push(&mut self, x: i32, y: i32, now_ms: u64) {
        if let Some(from) = self.last {
            self.segments.push_back(TrailSegment {
                from,
                to: (x, y),
                at_ms: now_ms,
            });
        }
        self.last = Some((x, y));
    }

    /// Drop segments older than [`TRAIL_MAX_AGE_MS`].
    pub fn prune(&mut self, now_ms: u64) {
        // Segments are pushed in time order, so the oldest sit at the front.
        while let Some(front) = self.segments.front() {
            if now_ms.saturating_sub(front.at_ms) > TRAIL_MAX_AGE_MS {
                self.segments.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &TrailSegment> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn clear(&mut self) {
        self.last = None;
        self.segments.clear();
    }
}
