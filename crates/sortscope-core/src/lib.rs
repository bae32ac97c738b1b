//! Core types and the instrumented sorting engine shared across the sortscope workspace.
//!
//! The engine executes one of six classical sorting algorithms against an
//! element sequence, pausing after every primitive operation (compare, swap,
//! mark) so an external shell can animate the run. Each pause emits an
//! immutable [`StepSnapshot`] carrying the element states and cumulative
//! performance counters. Runs are cooperatively cancellable: a stop request
//! is observed at the next pacing checkpoint and unwinds the algorithm
//! without emitting further snapshots.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

mod algorithms;
mod ops;
mod runner;

pub use runner::{start, RunHandle, RunOutcome, StartError};

/// Advisory per-element tag consumed only by the presentation layer.
///
/// Carries no algorithmic meaning; the engine never branches on it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VisualState {
    #[default]
    Default,
    Comparing,
    Swapping,
    Sorted,
    Pivot,
}

/// One bar in the visualized array.
///
/// `id` is assigned once at generation and survives every reordering, so a
/// shell can track an element across positions (e.g. for transition
/// animation). Exactly the elements present at run start are present at run
/// end, as a permutation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Element {
    pub value: u32,
    pub id: u32,
    pub state: VisualState,
}

impl Element {
    /// Construct an element in the default visual state.
    #[must_use]
    pub const fn new(value: u32, id: u32) -> Self {
        Self {
            value,
            id,
            state: VisualState::Default,
        }
    }
}

/// Cumulative performance counters for one run.
///
/// Reset to zero when a run starts; monotonically non-decreasing across the
/// snapshots emitted by that run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Counters {
    pub comparisons: u64,
    pub swaps: u64,
    pub array_accesses: u64,
}

/// Immutable point-in-time copy of array state and counters delivered to the
/// step callback.
///
/// The element vector never aliases the run's live storage; consumers may
/// hold a snapshot for as long as they like.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepSnapshot {
    pub elements: Vec<Element>,
    pub counters: Counters,
    /// Wall-clock time since the run started. Monotonic across one run.
    pub elapsed: Duration,
}

/// The six supported sorting strategies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Bubble,
    Selection,
    Insertion,
    Merge,
    Quick,
    Heap,
}

impl Algorithm {
    /// Every algorithm, in menu order.
    pub const ALL: [Self; 6] = [
        Self::Bubble,
        Self::Selection,
        Self::Insertion,
        Self::Merge,
        Self::Quick,
        Self::Heap,
    ];

    /// Resolve a wire key (`"bubble"`, `"quick"`, ...) to an algorithm.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|algo| algo.key() == key)
    }

    /// Stable wire key for this algorithm.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Bubble => "bubble",
            Self::Selection => "selection",
            Self::Insertion => "insertion",
            Self::Merge => "merge",
            Self::Quick => "quick",
            Self::Heap => "heap",
        }
    }

    /// Human-readable name shown by shells.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bubble => "Bubble Sort",
            Self::Selection => "Selection Sort",
            Self::Insertion => "Insertion Sort",
            Self::Merge => "Merge Sort",
            Self::Quick => "Quick Sort",
            Self::Heap => "Heap Sort",
        }
    }

    /// Average-case time complexity, for display alongside the label.
    #[must_use]
    pub const fn complexity(self) -> &'static str {
        match self {
            Self::Bubble | Self::Selection | Self::Insertion => "O(n²)",
            Self::Merge | Self::Quick | Self::Heap => "O(n log n)",
        }
    }

    /// Whether the algorithm preserves the relative order of equal values.
    #[must_use]
    pub const fn is_stable(self) -> bool {
        matches!(self, Self::Bubble | Self::Insertion | Self::Merge)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
