//! Shared shell plumbing for the sortscope terminal UI.
//!
//! Array generation policy (element count, value range) lives here, not in
//! the core: the engine sorts whatever it is handed.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::Rng;
use sortscope_core::{Element, StepSnapshot};

pub mod terminal;

/// Latest snapshot published by a run's step callback, shared with the draw
/// loop.
pub type SharedFrame = Arc<Mutex<Option<StepSnapshot>>>;

/// Smallest selectable array.
pub const MIN_ARRAY_SIZE: usize = 10;
/// Largest selectable array.
pub const MAX_ARRAY_SIZE: usize = 100;
/// Array size slider step.
pub const ARRAY_SIZE_STEP: usize = 5;
/// Values are drawn uniformly from `VALUE_FLOOR..VALUE_FLOOR + VALUE_SPAN`.
pub const VALUE_FLOOR: u32 = 10;
pub const VALUE_SPAN: u32 = 400;

/// Generate a fresh array: random values, sequential identities, default
/// visual state.
#[must_use]
pub fn generate_elements(count: usize, rng: &mut SmallRng) -> Vec<Element> {
    (0..count)
        .map(|id| Element::new(rng.random_range(VALUE_FLOOR..VALUE_FLOOR + VALUE_SPAN), id as u32))
        .collect()
}

/// Map the 1..=100 speed setting to a pacing interval. Higher speed, shorter
/// delay; speed 100 still paces at 1ms so the animation stays observable.
#[must_use]
pub fn pacing_for_speed(speed: u32) -> Duration {
    let speed = speed.clamp(1, 100);
    Duration::from_millis(u64::from(101 - speed))
}
