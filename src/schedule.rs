//! Time-driven cycling through the debug visualization stages.

use crate::config::ScheduleConfig;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::time::{Duration, Instant};

/// Pipeline stage whose output is shown. `AllPairs` is the production view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Original,
    Blur,
    Filter,
    Edges,
    Candidate,
    SinglePair,
    AllPairs,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Original,
        Stage::Blur,
        Stage::Filter,
        Stage::Edges,
        Stage::Candidate,
        Stage::SinglePair,
        Stage::AllPairs,
    ];

    /// Single-shape bounds are loosened while showing raw candidates
    pub fn relaxes_shape(self) -> bool {
        self == Stage::Candidate
    }

    /// Pairing predicate is bypassed so every candidate pair is shown
    pub fn bypasses_pairing(self) -> bool {
        matches!(self, Stage::Candidate | Stage::SinglePair)
    }

    pub fn composites(self) -> bool {
        self == Stage::AllPairs
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Original => "ORIGINAL",
            Stage::Blur => "BLUR",
            Stage::Filter => "FILTER",
            Stage::Edges => "EDGES",
            Stage::Candidate => "CANDIDATE",
            Stage::SinglePair => "SINGLE PAIR",
            Stage::AllPairs => "ALL PAIRS",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Source of the current instant
pub trait Clock {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    elapsed: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            elapsed: Cell::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }

    pub fn set_elapsed(&self, elapsed: Duration) {
        self.elapsed.set(elapsed);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.elapsed.get()
    }
}

/// Free-running cyclic timer over [`Stage::ALL`]
#[derive(Debug, Clone)]
pub struct StageScheduler {
    epoch: Instant,
    current: Stage,
    /// Exclusive end of each stage's window, relative to the epoch
    ends: [Duration; 7],
}

impl StageScheduler {
    pub fn new(config: &ScheduleConfig, start: Instant) -> Self {
        let step = config.step();
        let ends = [
            step / 2,
            step,
            step * 2,
            step * 3,
            step * 4,
            step * 5,
            step * config.final_stage_end_steps,
        ];
        Self {
            epoch: start,
            current: Stage::Original,
            ends,
        }
    }

    pub fn current(&self) -> Stage {
        self.current
    }

    /// Length of one full cycle
    pub fn cycle(&self) -> Duration {
        self.ends[6]
    }

    /// Select the stage for `now`. Once the final window has elapsed the
    /// epoch moves to `now` and the cycle restarts at `Original`.
    pub fn advance(&mut self, now: Instant) -> Stage {
        let elapsed = now.saturating_duration_since(self.epoch);
        self.current = match self.ends.iter().position(|end| elapsed < *end) {
            Some(idx) => Stage::ALL[idx],
            None => {
                tracing::debug!("stage cycle complete after {:?}, restarting", elapsed);
                self.epoch = now;
                Stage::Original
            }
        };
        self.current
    }
}
