//! Run lifecycle: start/stop orchestration and outcome classification.
//!
//! One run owns one private copy of the caller's elements, one cancellation
//! flag, and one worker thread. The controller is the single point that
//! classifies how a run ended: `Finished` (ran to completion), `Stopped`
//! (cancellation observed at a checkpoint — the expected outcome of a stop
//! request, not an error), or `Failed` (a fault inside the algorithm,
//! surfaced to the caller instead of propagating uncaught).

use std::any::Any;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::ops::{RunShared, SortOps, Stopped};
use crate::{Algorithm, Counters, Element, StepSnapshot};

/// Rejections reported synchronously by [`start`], before any mutation
/// occurs and before the step callback is ever invoked.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("unknown algorithm key `{0}`")]
    UnknownAlgorithm(String),
    #[error("failed to spawn sorting worker")]
    Spawn(#[from] std::io::Error),
}

/// How a run settled. Resolved exactly once per run, via [`RunHandle::wait`].
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The algorithm ran to completion; the final elements are fully sorted
    /// and every visual state is `Sorted`.
    Finished {
        elements: Vec<Element>,
        counters: Counters,
    },
    /// Cancellation was observed before completion. No partial-sort guarantee
    /// is made about the array's final order.
    Stopped,
    /// The algorithm faulted. Distinct from `Stopped`: this one is an error.
    Failed { message: String },
}

/// Cancellable handle to an in-flight run.
#[derive(Debug)]
pub struct RunHandle {
    shared: Arc<RunShared>,
    worker: JoinHandle<RunOutcome>,
}

impl RunHandle {
    /// Request cancellation. Idempotent; never blocks. The run settles as
    /// `Stopped` shortly after the next pacing checkpoint observes the flag.
    pub fn stop(&self) {
        self.shared.cancel();
    }

    /// Retune the pacing interval of the in-flight run. Takes effect at the
    /// next suspension.
    pub fn set_pacing(&self, pacing: Duration) {
        self.shared.set_pacing(pacing);
    }

    /// Whether the run has settled. `wait` will not block once this is true.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.worker.is_finished()
    }

    /// Block until the run settles and classify the outcome.
    #[must_use]
    pub fn wait(self) -> RunOutcome {
        classify_join(self.worker.join())
    }
}

fn classify_join(joined: Result<RunOutcome, Box<dyn Any + Send>>) -> RunOutcome {
    match joined {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(message = %message, "sorting worker faulted");
            RunOutcome::Failed { message }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "sorting worker panicked".to_string()
    }
}

/// Begin a run of `algorithm_key` over a private copy of `elements`.
///
/// The caller's slice is never mutated; the run owns the only live copy for
/// its duration. `on_step` receives an immutable snapshot after every
/// primitive operation, in strict chronological order. Counters start at
/// zero. An empty input settles as `Finished` immediately without invoking
/// `on_step`.
///
/// Starting a second run while one is active on the same elements is the
/// caller's responsibility to avoid; the controller does not serialize
/// overlapping starts.
pub fn start(
    elements: &[Element],
    pacing: Duration,
    algorithm_key: &str,
    on_step: impl FnMut(StepSnapshot) + Send + 'static,
) -> Result<RunHandle, StartError> {
    let algorithm = Algorithm::from_key(algorithm_key)
        .ok_or_else(|| StartError::UnknownAlgorithm(algorithm_key.to_string()))?;

    let shared = Arc::new(RunShared::new(pacing));
    let worker_shared = Arc::clone(&shared);
    let mut elements = elements.to_vec();
    let mut on_step = on_step;

    debug!(
        algorithm = algorithm.key(),
        len = elements.len(),
        pacing_micros = pacing.as_micros() as u64,
        "starting sorting run"
    );

    let worker = thread::Builder::new()
        .name(format!("sortscope-{}", algorithm.key()))
        .spawn(move || {
            if elements.is_empty() {
                return RunOutcome::Finished {
                    elements,
                    counters: Counters::default(),
                };
            }
            let started = Instant::now();
            let (result, counters) = {
                let mut ops =
                    SortOps::new(&mut elements, &worker_shared, &mut on_step, started);
                let result = algorithm.execute(&mut ops);
                (result, ops.counters())
            };
            match result {
                Ok(()) => {
                    debug!(
                        algorithm = algorithm.key(),
                        comparisons = counters.comparisons,
                        swaps = counters.swaps,
                        "sorting run finished"
                    );
                    RunOutcome::Finished { elements, counters }
                }
                Err(Stopped) => {
                    debug!(algorithm = algorithm.key(), "sorting run stopped");
                    RunOutcome::Stopped
                }
            }
        })?;

    Ok(RunHandle { shared, worker })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VisualState;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn elements(values: &[u32]) -> Vec<Element> {
        values
            .iter()
            .enumerate()
            .map(|(id, &value)| Element::new(value, id as u32))
            .collect()
    }

    #[test]
    fn unknown_algorithm_fails_synchronously() {
        let input = elements(&[3, 1, 2]);
        let calls = Arc::new(AtomicUsize::new(0));
        let observer = Arc::clone(&calls);
        let result = start(&input, Duration::ZERO, "bogo", move |_snapshot| {
            observer.fetch_add(1, Ordering::Relaxed);
        });
        assert!(matches!(
            result,
            Err(StartError::UnknownAlgorithm(ref key)) if key == "bogo"
        ));
        assert_eq!(calls.load(Ordering::Relaxed), 0);
        // The caller's elements are untouched.
        assert_eq!(input[0].value, 3);
    }

    #[test]
    fn run_to_completion_is_finished_and_sorted() {
        let input = elements(&[5, 3, 8, 1]);
        let handle = start(&input, Duration::ZERO, "bubble", |_snapshot| {}).expect("start");
        match handle.wait() {
            RunOutcome::Finished { elements, counters } => {
                let values: Vec<u32> = elements.iter().map(|e| e.value).collect();
                assert_eq!(values, vec![1, 3, 5, 8]);
                assert!(elements.iter().all(|e| e.state == VisualState::Sorted));
                assert_eq!(counters.comparisons, 6);
            }
            other => panic!("expected Finished, got {other:?}"),
        }
        // The caller's copy still holds the original order.
        assert_eq!(input[0].value, 5);
    }

    #[test]
    fn empty_input_settles_finished_without_callbacks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let observer = Arc::clone(&calls);
        let handle = start(&[], Duration::from_millis(50), "merge", move |_snapshot| {
            observer.fetch_add(1, Ordering::Relaxed);
        })
        .expect("start");
        match handle.wait() {
            RunOutcome::Finished { elements, counters } => {
                assert!(elements.is_empty());
                assert_eq!(counters, Counters::default());
            }
            other => panic!("expected Finished, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn stop_settles_as_stopped_never_finished() {
        let input = elements(&(0..128).rev().collect::<Vec<u32>>());
        let emitted = Arc::new(AtomicUsize::new(0));
        let observer = Arc::clone(&emitted);
        let handle = start(&input, Duration::from_millis(20), "bubble", move |_snapshot| {
            observer.fetch_add(1, Ordering::Relaxed);
        })
        .expect("start");

        handle.stop();
        handle.stop(); // idempotent
        let outcome = handle.wait();
        assert_eq!(outcome, RunOutcome::Stopped);

        // No further emissions after the run settled.
        let settled = emitted.load(Ordering::Relaxed);
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(emitted.load(Ordering::Relaxed), settled);
    }

    #[test]
    fn counters_reset_between_runs() {
        let input = elements(&[4, 2, 7, 1]);
        for _ in 0..2 {
            let first = Arc::new(Mutex::new(None::<Counters>));
            let slot = Arc::clone(&first);
            let handle = start(&input, Duration::ZERO, "selection", move |snapshot| {
                let mut slot = slot.lock().expect("lock");
                if slot.is_none() {
                    *slot = Some(snapshot.counters);
                }
            })
            .expect("start");
            assert!(matches!(handle.wait(), RunOutcome::Finished { .. }));
            // The first emission of each run carries near-zero counters: the
            // opening mark_pivot costs nothing.
            let first = (*first.lock().expect("lock")).expect("saw a snapshot");
            assert_eq!(first, Counters::default());
        }
    }

    #[test]
    fn pacing_can_be_retuned_through_the_handle() {
        let input = elements(&(0..64).rev().collect::<Vec<u32>>());
        let handle = start(&input, Duration::from_millis(10), "insertion", |_snapshot| {})
            .expect("start");
        handle.set_pacing(Duration::ZERO);
        assert!(matches!(handle.wait(), RunOutcome::Finished { .. }));
    }

    #[test]
    fn worker_panics_classify_as_failed() {
        let panicked: Result<RunOutcome, Box<dyn Any + Send>> =
            Err(Box::new("index out of bounds".to_string()));
        match classify_join(panicked) {
            RunOutcome::Failed { message } => assert_eq!(message, "index out of bounds"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
