//! Instrumentation primitives shared by every algorithm.
//!
//! [`SortOps`] owns the run's live element storage, the performance counters,
//! the cancellation flag, and the step callback. Every counter increment,
//! cancellation check, and snapshot emission funnels through here; the
//! algorithms themselves only sequence primitive calls and pure index
//! arithmetic. Suspension happens exclusively inside [`SortOps::emit_and_pace`],
//! so observable state between two emissions is always internally consistent.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::{Counters, Element, StepSnapshot, VisualState};

/// Signal that a stop request was observed at a pacing checkpoint.
///
/// This is the expected outcome of a user-initiated stop, not a fault; it
/// unwinds the algorithm via `?` and is classified by the run controller,
/// never logged as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopped;

impl fmt::Display for Stopped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("sorting stopped")
    }
}

/// Result of one instrumented step.
pub(crate) type StepResult<T = ()> = Result<T, Stopped>;

/// State shared between a run's worker and its [`crate::RunHandle`].
///
/// The cancellation flag is set once and never reset; the pacing interval may
/// be retuned at any time and is re-read before every suspension.
#[derive(Debug)]
pub(crate) struct RunShared {
    cancelled: AtomicBool,
    pacing_micros: AtomicU64,
}

impl RunShared {
    pub(crate) fn new(pacing: Duration) -> Self {
        let shared = Self {
            cancelled: AtomicBool::new(false),
            pacing_micros: AtomicU64::new(0),
        };
        shared.set_pacing(pacing);
        shared
    }

    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub(crate) fn set_pacing(&self, pacing: Duration) {
        let micros = u64::try_from(pacing.as_micros()).unwrap_or(u64::MAX);
        self.pacing_micros.store(micros, Ordering::Relaxed);
    }

    pub(crate) fn pacing(&self) -> Duration {
        Duration::from_micros(self.pacing_micros.load(Ordering::Relaxed))
    }
}

/// Shared context threaded through every algorithm by mutable reference.
pub(crate) struct SortOps<'a> {
    elements: &'a mut [Element],
    counters: Counters,
    shared: &'a RunShared,
    on_step: &'a mut dyn FnMut(StepSnapshot),
    started: Instant,
}

impl<'a> SortOps<'a> {
    pub(crate) fn new(
        elements: &'a mut [Element],
        shared: &'a RunShared,
        on_step: &'a mut dyn FnMut(StepSnapshot),
        started: Instant,
    ) -> Self {
        Self {
            elements,
            counters: Counters::default(),
            shared,
            on_step,
            started,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.elements.len()
    }

    pub(crate) fn value(&self, index: usize) -> u32 {
        self.elements[index].value
    }

    pub(crate) fn element(&self, index: usize) -> Element {
        self.elements[index]
    }

    /// Write an element without counting an access; used when an algorithm
    /// places a held-out key back into the sequence.
    pub(crate) fn put(&mut self, index: usize, element: Element) {
        self.elements[index] = element;
    }

    /// Stage a visual state ahead of the next emission. Uncounted, unpaced.
    pub(crate) fn set_state(&mut self, index: usize, state: VisualState) {
        self.elements[index].state = state;
    }

    pub(crate) fn counters(&self) -> Counters {
        self.counters
    }

    fn snapshot(&self) -> StepSnapshot {
        StepSnapshot {
            elements: self.elements.to_vec(),
            counters: self.counters,
            elapsed: self.started.elapsed(),
        }
    }

    /// The single choke point every primitive funnels through.
    ///
    /// Checks the cancellation flag before doing any work, emits a snapshot,
    /// re-checks the flag, then suspends for the configured pacing interval.
    /// No snapshot is emitted once cancellation has been observed.
    pub(crate) fn emit_and_pace(&mut self) -> StepResult {
        if self.shared.is_cancelled() {
            return Err(Stopped);
        }
        let snapshot = self.snapshot();
        (self.on_step)(snapshot);
        if self.shared.is_cancelled() {
            return Err(Stopped);
        }
        let pacing = self.shared.pacing();
        if !pacing.is_zero() {
            thread::sleep(pacing);
        }
        Ok(())
    }

    /// Counted comparison of two positions.
    ///
    /// Highlights both, emits once, and returns whether `i`'s value exceeds
    /// `j`'s. Both states are restored to default before returning. Does not
    /// mutate array order.
    pub(crate) fn compare(&mut self, i: usize, j: usize) -> StepResult<bool> {
        self.counters.comparisons += 1;
        self.counters.array_accesses += 2;
        self.set_state(i, VisualState::Comparing);
        self.set_state(j, VisualState::Comparing);
        self.emit_and_pace()?;
        let result = self.elements[i].value > self.elements[j].value;
        self.set_state(i, VisualState::Default);
        self.set_state(j, VisualState::Default);
        Ok(result)
    }

    /// Counted comparison where only one side is a live position.
    ///
    /// Highlights `i` and emits once; the caller performs the asymmetric
    /// value test itself (against a held-out key, a captured pivot, or a
    /// tracked minimum) and restores `i`'s state afterwards.
    pub(crate) fn probe(&mut self, i: usize) -> StepResult {
        self.counters.comparisons += 1;
        self.counters.array_accesses += 2;
        self.set_state(i, VisualState::Comparing);
        self.emit_and_pace()
    }

    /// Counted exchange of two positions.
    ///
    /// Emits twice: once with both positions highlighted before the exchange
    /// so shells can animate the transition, and once after it. Both states
    /// are restored to default before returning.
    pub(crate) fn swap(&mut self, i: usize, j: usize) -> StepResult {
        self.counters.swaps += 1;
        self.counters.array_accesses += 4;
        self.set_state(i, VisualState::Swapping);
        self.set_state(j, VisualState::Swapping);
        self.emit_and_pace()?;
        self.elements.swap(i, j);
        self.emit_and_pace()?;
        self.set_state(i, VisualState::Default);
        self.set_state(j, VisualState::Default);
        Ok(())
    }

    /// Counted one-position shift, for insertion sort's held-out-key walk.
    ///
    /// Copies `src` into `dst`, highlights `dst`, and emits once. The caller
    /// settles both positions' states.
    pub(crate) fn shift(&mut self, src: usize, dst: usize) -> StepResult {
        self.counters.swaps += 1;
        self.counters.array_accesses += 2;
        self.elements[dst] = self.elements[src];
        self.set_state(dst, VisualState::Swapping);
        self.emit_and_pace()
    }

    /// Write-back of a merged element, for merge sort's drain loops.
    ///
    /// Writes `element` at `dst` highlighted as swapping and emits once. The
    /// caller settles `dst`'s state.
    pub(crate) fn place(&mut self, dst: usize, element: Element) -> StepResult {
        self.counters.array_accesses += 1;
        self.elements[dst] = element;
        self.set_state(dst, VisualState::Swapping);
        self.emit_and_pace()
    }

    /// Mark a position as the current pivot candidate and emit once.
    pub(crate) fn mark_pivot(&mut self, index: usize) -> StepResult {
        self.set_state(index, VisualState::Pivot);
        self.emit_and_pace()
    }

    /// Mark positions as settled and emit once.
    pub(crate) fn mark_sorted(&mut self, indices: &[usize]) -> StepResult {
        for &index in indices {
            self.set_state(index, VisualState::Sorted);
        }
        self.emit_and_pace()
    }

    /// Mark the whole sequence as settled in a single batch emission.
    pub(crate) fn mark_sorted_all(&mut self) -> StepResult {
        for element in self.elements.iter_mut() {
            element.state = VisualState::Sorted;
        }
        self.emit_and_pace()
    }
}
