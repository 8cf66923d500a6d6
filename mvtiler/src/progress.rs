use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::Duration;

use mvtiler_core::pyramid::{EventSink, TilingEvent};
use tokio::time::Instant;
use tracing::{debug, info};

/// Counts generated tiles from the pyramid events.
///
/// The size of the whole pyramid is unknown up front because empty subtrees are pruned,
/// so the estimate only covers the zoom level in progress.
#[derive(Debug)]
pub struct Progress {
    // needed to compute elapsed time
    start_time: Instant,
    zoom: AtomicU8,
    level_total: AtomicU64,
    level_done: AtomicU64,
    empty: AtomicU64,
    non_empty: AtomicU64,
    features: AtomicU64,
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            zoom: AtomicU8::default(),
            level_total: AtomicU64::default(),
            level_done: AtomicU64::default(),
            empty: AtomicU64::default(),
            non_empty: AtomicU64::default(),
            features: AtomicU64::default(),
        }
    }

    /// Tiles generated so far, empty or not
    #[must_use]
    pub fn done(&self) -> u64 {
        self.non_empty() + self.empty()
    }

    #[must_use]
    pub fn non_empty(&self) -> u64 {
        self.non_empty.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn empty(&self) -> u64 {
        self.empty.load(Ordering::Relaxed)
    }

    /// Features written over all tiles
    #[must_use]
    pub fn features(&self) -> u64 {
        self.features.load(Ordering::Relaxed)
    }
}

impl EventSink for Progress {
    fn on_event(&self, event: &TilingEvent) {
        match event {
            TilingEvent::LevelStarted { zoom, tiles } => {
                self.zoom.store(*zoom, Ordering::Relaxed);
                self.level_total.store(*tiles as u64, Ordering::Relaxed);
                self.level_done.store(0, Ordering::Relaxed);
                info!("Generating zoom {zoom}: {tiles} tiles");
            }
            TilingEvent::TileDone { features, .. } => {
                self.level_done.fetch_add(1, Ordering::Relaxed);
                if *features == 0 {
                    self.empty.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.non_empty.fetch_add(1, Ordering::Relaxed);
                    self.features
                        .fetch_add(*features as u64, Ordering::Relaxed);
                }
            }
            TilingEvent::LevelFinished {
                zoom,
                non_empty,
                empty,
            } => {
                debug!("Zoom {zoom} done: ✓ {non_empty} □ {empty}");
            }
        }
    }
}

impl Display for Progress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let elapsed = self.start_time.elapsed();
        let elapsed_s = elapsed.as_secs_f32();
        let non_empty = self.non_empty();
        let empty = self.empty();
        let done = non_empty + empty;
        let zoom = self.zoom.load(Ordering::Relaxed);
        let level_total = self.level_total.load(Ordering::Relaxed);
        let level_done = self.level_done.load(Ordering::Relaxed).min(level_total);
        let percent = if level_total > 0 {
            level_done as f32 * 100.0 / level_total as f32
        } else {
            0.0
        };
        let speed = if elapsed_s > 0.0 {
            done as f32 / elapsed_s
        } else {
            0.0
        };
        write!(
            f,
            "[{elapsed:.1?}] z{zoom} {percent:.2}% @ {speed:.1}/s | ✓ {non_empty} □ {empty}"
        )?;

        let left = level_total - level_done;
        if left == 0 {
            f.write_str(" | done")
        } else if done == 0 || speed <= 0.0 {
            f.write_str(" | ??? left")
        } else {
            let left = Duration::try_from_secs_f32(left as f32 / speed).unwrap_or(Duration::MAX);
            write!(f, " | {left:.0?} left in z{zoom}")
        }
    }
}
