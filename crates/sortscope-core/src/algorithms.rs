//! The six sorting strategies, each a sequence of instrumented primitive
//! calls over [`SortOps`].
//!
//! Algorithms never suspend on their own: recursion setup and index
//! arithmetic run synchronously, and every pause, counter bump, and snapshot
//! emission goes through a primitive. Cancellation unwinds with `?` from
//! whichever primitive observes it. Callers guarantee a non-empty sequence;
//! the run controller short-circuits the empty case.

use crate::ops::{SortOps, StepResult};
use crate::{Algorithm, VisualState};

impl Algorithm {
    /// Run this strategy to completion over the shared primitive context.
    pub(crate) fn execute(self, ops: &mut SortOps<'_>) -> StepResult {
        match self {
            Self::Bubble => bubble(ops),
            Self::Selection => selection(ops),
            Self::Insertion => insertion(ops),
            Self::Merge => merge(ops),
            Self::Quick => quick(ops),
            Self::Heap => heap(ops),
        }
    }
}

/// Adjacent compare/swap passes over a shrinking unsorted suffix, with an
/// early exit when a pass performs no swaps.
fn bubble(ops: &mut SortOps<'_>) -> StepResult {
    let n = ops.len();
    for i in 0..n - 1 {
        let mut swapped = false;
        for j in 0..n - i - 1 {
            if ops.compare(j, j + 1)? {
                ops.swap(j, j + 1)?;
                swapped = true;
            }
        }
        // The largest remaining value has bubbled to the end of the suffix.
        ops.mark_sorted(&[n - i - 1])?;
        if !swapped {
            break;
        }
    }
    // Covers the prefix an early exit leaves unmarked.
    ops.mark_sorted_all()
}

/// Linear scan for the true minimum of the unsorted suffix, re-marking the
/// pivot candidate on every improvement and swapping once per pass.
fn selection(ops: &mut SortOps<'_>) -> StepResult {
    let n = ops.len();
    for i in 0..n - 1 {
        let mut min_idx = i;
        ops.mark_pivot(min_idx)?;
        for j in i + 1..n {
            ops.probe(j)?;
            if ops.value(j) < ops.value(min_idx) {
                ops.set_state(min_idx, VisualState::Default);
                min_idx = j;
                ops.mark_pivot(min_idx)?;
            } else {
                ops.set_state(j, VisualState::Default);
            }
        }
        ops.set_state(min_idx, VisualState::Default);
        if min_idx != i {
            // A no-op swap would inflate the counters without moving anything.
            ops.swap(i, min_idx)?;
        }
        ops.mark_sorted(&[i])?;
    }
    ops.mark_sorted(&[n - 1])
}

/// Shift-based insertion: each key is held out while larger predecessors are
/// shifted right one slot at a time, then placed back marked as settled.
fn insertion(ops: &mut SortOps<'_>) -> StepResult {
    let n = ops.len();
    ops.mark_sorted(&[0])?;
    for i in 1..n {
        ops.set_state(i, VisualState::Pivot);
        ops.emit_and_pace()?;
        let key = ops.element(i);
        let mut j = i;
        // The walk's terminating comparison is not counted; only shifts that
        // actually happen record a comparison alongside them.
        while j > 0 && ops.value(j - 1) > key.value {
            ops.probe(j - 1)?;
            ops.shift(j - 1, j)?;
            ops.set_state(j - 1, VisualState::Default);
            ops.set_state(j, VisualState::Sorted);
            j -= 1;
        }
        ops.put(j, key);
        ops.set_state(j, VisualState::Sorted);
        ops.emit_and_pace()?;
    }
    Ok(())
}

/// Top-down merge sort over inclusive bounds, splitting at
/// `(left + right) / 2`.
fn merge(ops: &mut SortOps<'_>) -> StepResult {
    let n = ops.len();
    if n > 1 {
        merge_recurse(ops, 0, n - 1)?;
    }
    ops.mark_sorted_all()
}

fn merge_recurse(ops: &mut SortOps<'_>, left: usize, right: usize) -> StepResult {
    if left >= right {
        return Ok(());
    }
    let mid = (left + right) / 2;
    merge_recurse(ops, left, mid)?;
    merge_recurse(ops, mid + 1, right)?;
    merge_halves(ops, left, mid, right)
}

/// Merge two already-sorted halves. `<=` favors the left run so equal values
/// keep their relative order.
fn merge_halves(ops: &mut SortOps<'_>, left: usize, mid: usize, right: usize) -> StepResult {
    let left_run: Vec<_> = (left..=mid).map(|idx| ops.element(idx)).collect();
    let right_run: Vec<_> = (mid + 1..=right).map(|idx| ops.element(idx)).collect();

    let mut i = 0;
    let mut j = 0;
    let mut k = left;
    while i < left_run.len() && j < right_run.len() {
        ops.probe(k)?;
        let taken = if left_run[i].value <= right_run[j].value {
            i += 1;
            left_run[i - 1]
        } else {
            j += 1;
            right_run[j - 1]
        };
        ops.place(k, taken)?;
        ops.set_state(k, VisualState::Default);
        k += 1;
    }
    while i < left_run.len() {
        ops.place(k, left_run[i])?;
        ops.set_state(k, VisualState::Default);
        i += 1;
        k += 1;
    }
    while j < right_run.len() {
        ops.place(k, right_run[j])?;
        ops.set_state(k, VisualState::Default);
        j += 1;
        k += 1;
    }
    Ok(())
}

/// Lomuto-partition quicksort with the last element as pivot.
fn quick(ops: &mut SortOps<'_>) -> StepResult {
    let n = ops.len();
    quick_recurse(ops, 0, n - 1)?;
    ops.mark_sorted_all()
}

fn quick_recurse(ops: &mut SortOps<'_>, low: usize, high: usize) -> StepResult {
    if low >= high {
        return Ok(());
    }
    let pivot_idx = partition(ops, low, high)?;
    if pivot_idx > 0 {
        quick_recurse(ops, low, pivot_idx - 1)?;
    }
    quick_recurse(ops, pivot_idx + 1, high)
}

/// Partition `low..=high` around the value at `high`; elements strictly less
/// than the pivot move left of the returned boundary.
fn partition(ops: &mut SortOps<'_>, low: usize, high: usize) -> StepResult<usize> {
    let pivot = ops.value(high);
    ops.mark_pivot(high)?;

    // Next slot for an element below the pivot.
    let mut boundary = low;
    for j in low..high {
        ops.probe(j)?;
        ops.set_state(j, VisualState::Default);
        if ops.value(j) < pivot {
            if boundary != j {
                ops.swap(boundary, j)?;
            }
            boundary += 1;
        }
    }
    ops.set_state(high, VisualState::Default);
    if boundary != high {
        // Pivot moves only when its computed slot differs from where it sits.
        ops.swap(boundary, high)?;
    }
    Ok(boundary)
}

/// Bottom-up max-heap build followed by repeated root extraction over a
/// shrinking heap.
fn heap(ops: &mut SortOps<'_>) -> StepResult {
    let n = ops.len();
    for i in (0..n / 2).rev() {
        heapify(ops, n, i)?;
    }
    for end in (1..n).rev() {
        ops.swap(0, end)?;
        ops.mark_sorted(&[end])?;
        heapify(ops, end, 0)?;
    }
    ops.mark_sorted(&[0])
}

/// Sift the value at `root` down within the first `len` positions. Always
/// marks the current candidate root as pivot, even when it will not move.
fn heapify(ops: &mut SortOps<'_>, len: usize, root: usize) -> StepResult {
    let mut largest = root;
    let left = 2 * root + 1;
    let right = 2 * root + 2;

    ops.mark_pivot(largest)?;
    if left < len {
        ops.probe(left)?;
        if ops.value(left) > ops.value(largest) {
            ops.set_state(largest, VisualState::Default);
            largest = left;
            ops.mark_pivot(largest)?;
        }
        ops.set_state(left, VisualState::Default);
    }
    if right < len {
        ops.probe(right)?;
        if ops.value(right) > ops.value(largest) {
            ops.set_state(largest, VisualState::Default);
            largest = right;
            ops.mark_pivot(largest)?;
        }
        ops.set_state(right, VisualState::Default);
    }

    ops.set_state(largest, VisualState::Default);
    if largest != root {
        ops.swap(root, largest)?;
        heapify(ops, len, largest)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::ops::RunShared;
    use crate::{Counters, Element, StepSnapshot};

    /// Drive an algorithm synchronously with zero pacing, collecting every
    /// emitted snapshot.
    fn run_collect(
        algorithm: Algorithm,
        values: &[u32],
    ) -> (Vec<Element>, Counters, Vec<StepSnapshot>) {
        let mut elements: Vec<Element> = values
            .iter()
            .enumerate()
            .map(|(id, &value)| Element::new(value, id as u32))
            .collect();
        let shared = RunShared::new(Duration::ZERO);
        let mut snaps = Vec::new();
        let mut on_step = |snapshot: StepSnapshot| snaps.push(snapshot);
        let mut ops = SortOps::new(&mut elements, &shared, &mut on_step, Instant::now());
        algorithm.execute(&mut ops).expect("run not cancelled");
        let counters = ops.counters();
        drop(ops);
        (elements, counters, snaps)
    }

    fn assert_sorted_permutation(input: &[u32], output: &[Element]) {
        assert!(
            output.windows(2).all(|w| w[0].value <= w[1].value),
            "values must be non-decreasing: {output:?}"
        );
        let mut in_pairs: Vec<(u32, u32)> = input
            .iter()
            .enumerate()
            .map(|(id, &value)| (value, id as u32))
            .collect();
        let mut out_pairs: Vec<(u32, u32)> = output.iter().map(|e| (e.value, e.id)).collect();
        in_pairs.sort_unstable();
        out_pairs.sort_unstable();
        assert_eq!(in_pairs, out_pairs, "identity-preserving permutation");
    }

    #[test]
    fn every_algorithm_sorts_fixed_inputs() {
        let inputs: [&[u32]; 6] = [
            &[5, 3, 8, 1],
            &[1],
            &[2, 1],
            &[9, 9, 1, 9, 0],
            &[1, 2, 3, 4, 5],
            &[5, 4, 3, 2, 1],
        ];
        for algorithm in Algorithm::ALL {
            for input in inputs {
                let (output, _, _) = run_collect(algorithm, input);
                assert_sorted_permutation(input, &output);
                assert!(
                    output.iter().all(|e| e.state == VisualState::Sorted),
                    "{algorithm} must settle every element: {output:?}"
                );
            }
        }
    }

    #[test]
    fn every_algorithm_sorts_random_inputs() {
        let mut rng = SmallRng::seed_from_u64(0x5027_5C09);
        for algorithm in Algorithm::ALL {
            for len in [2usize, 7, 16, 33] {
                let input: Vec<u32> = (0..len).map(|_| rng.random_range(10..410)).collect();
                let (output, counters, snaps) = run_collect(algorithm, &input);
                assert_sorted_permutation(&input, &output);
                assert!(!snaps.is_empty());
                assert_eq!(snaps.last().expect("snapshots").counters, counters);
            }
        }
    }

    #[test]
    fn stable_algorithms_keep_equal_values_in_id_order() {
        // Equal values carry distinct ids; a stable sort keeps their
        // generation order.
        let input = [7u32, 3, 7, 3, 7, 1];
        for algorithm in [Algorithm::Bubble, Algorithm::Insertion, Algorithm::Merge] {
            assert!(algorithm.is_stable());
            let (output, _, _) = run_collect(algorithm, &input);
            let mut seen: Vec<(u32, u32)> = output.iter().map(|e| (e.value, e.id)).collect();
            seen.retain(|&(value, _)| value == 7);
            assert_eq!(
                seen,
                vec![(7, 0), (7, 2), (7, 4)],
                "{algorithm} must preserve equal-value order"
            );
        }
    }

    #[test]
    fn bubble_counts_all_adjacent_comparisons_without_early_exit() {
        let (output, counters, _) = run_collect(Algorithm::Bubble, &[5, 3, 8, 1]);
        let values: Vec<u32> = output.iter().map(|e| e.value).collect();
        assert_eq!(values, vec![1, 3, 5, 8]);
        assert_eq!(counters.comparisons, 6);
    }

    #[test]
    fn bubble_exits_early_on_sorted_input() {
        let (_, counters, _) = run_collect(Algorithm::Bubble, &[1, 2, 3, 4]);
        // One full pass, zero swaps, then the early exit fires.
        assert_eq!(counters.comparisons, 3);
        assert_eq!(counters.swaps, 0);
    }

    #[test]
    fn selection_skips_the_swap_when_minimum_is_in_place() {
        let (_, counters, _) = run_collect(Algorithm::Selection, &[1, 2, 3]);
        assert_eq!(counters.swaps, 0);
        assert_eq!(counters.comparisons, 3);
    }

    #[test]
    fn quick_on_all_equal_values_only_places_pivots() {
        let input = [2u32, 2, 2];
        let (output, counters, _) = run_collect(Algorithm::Quick, &input);
        let values: Vec<u32> = output.iter().map(|e| e.value).collect();
        assert_eq!(values, vec![2, 2, 2]);
        // Every comparison finds "not less than pivot"; the only swaps are
        // the two pivot placements.
        assert_eq!(counters.swaps, 2);
    }

    #[test]
    fn counters_are_monotonic_across_snapshots() {
        for algorithm in Algorithm::ALL {
            let (_, _, snaps) = run_collect(algorithm, &[4, 1, 3, 9, 2, 8, 5]);
            let mut previous = Counters::default();
            for snapshot in &snaps {
                assert!(snapshot.counters.comparisons >= previous.comparisons);
                assert!(snapshot.counters.swaps >= previous.swaps);
                assert!(snapshot.counters.array_accesses >= previous.array_accesses);
                previous = snapshot.counters;
            }
        }
    }

    #[test]
    fn elapsed_time_is_monotonic_across_snapshots() {
        let (_, _, snaps) = run_collect(Algorithm::Heap, &[6, 2, 9, 1]);
        for window in snaps.windows(2) {
            assert!(window[1].elapsed >= window[0].elapsed);
        }
    }

    #[test]
    fn single_element_runs_settle_immediately() {
        for algorithm in Algorithm::ALL {
            let (output, counters, _) = run_collect(algorithm, &[42]);
            assert_eq!(output.len(), 1);
            assert_eq!(output[0].state, VisualState::Sorted);
            assert_eq!(counters.comparisons, 0);
            assert_eq!(counters.swaps, 0);
        }
    }
}
