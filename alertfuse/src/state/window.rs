// alertfuse/src/state/window.rs
//
// Time-window arithmetic shared by the blast-radius analyzer and the workers.
//
//   window_minutes — whole minutes between two instants, ceiling, minimum 1
//   span_minutes   — window_minutes over min/max of a set of instants
//   densest_span   — two-pointer "max points inside any window of width W"
//                    over a sorted slice of instants

use chrono::{DateTime, Duration, Utc};

// ── Window durations ──────────────────────────────────────────────────────────

pub const W_10MIN: i64 = 10 * 60;

const MICROS_PER_MINUTE: u64 = 60 * 1_000_000;

// ── Minute rounding ───────────────────────────────────────────────────────────

/// Whole minutes from `start` to `end`, rounded up, never below 1.
pub fn window_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    let micros = (end - start).num_microseconds().unwrap_or(i64::MAX).max(0) as u64;
    micros.div_ceil(MICROS_PER_MINUTE).max(1)
}

/// `window_minutes` over the earliest and latest instant; 0 when there are none.
pub fn span_minutes<I>(timestamps: I) -> u64
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut bounds: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
    for ts in timestamps {
        bounds = Some(match bounds {
            None => (ts, ts),
            Some((lo, hi)) => (lo.min(ts), hi.max(ts)),
        });
    }
    bounds.map(|(lo, hi)| window_minutes(lo, hi)).unwrap_or(0)
}

// ── Densest span ──────────────────────────────────────────────────────────────

/// Half-open index range `[start, end)` into a sorted slice of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn count(&self) -> usize {
        self.end - self.start
    }
}

/// Widest-populated window of `width` over `sorted` (ascending).
///
/// A point belongs to the window opened at `sorted[i]` when it lies at most
/// `width` after it. The first point alone is the initial best; a later window
/// replaces it only with a strictly larger count, so the earliest densest
/// window wins ties. Returns `None` for an empty slice.
pub fn densest_span(sorted: &[DateTime<Utc>], width: Duration) -> Option<Span> {
    if sorted.is_empty() {
        return None;
    }

    let mut best = Span { start: 0, end: 1 };
    let mut end = 0usize;

    for (start, &opened) in sorted.iter().enumerate() {
        if end < start {
            end = start;
        }
        while end < sorted.len() && sorted[end] - opened <= width {
            end += 1;
        }
        if end - start > best.count() {
            best = Span { start, end };
        }
    }

    Some(best)
}
