//! Gesture pipeline: rule catalog, per-category determinators, depth
//! estimation, cross-category resolution and debounce.
//!
//! Per frame: snapshot -> palm box -> `determinator` (+ `depth`) ->
//! `DetectedGestureSet` -> `resolver` -> `ActiveGesture` -> `debounce`
//! -> confirmed gesture.

pub mod bindings;
pub mod debounce;
pub mod depth;
pub mod determinator;
pub mod resolver;
pub mod rules;
pub mod types;

pub use bindings::{BindingTable, GestureBinding};
pub use debounce::{ConfirmedGestureState, DebounceConfig, Debouncer};
pub use depth::{DepthConfig, DepthEstimator, DepthMode, DepthState};
pub use determinator::{determine, determine_all, CategoryOutcome, Classification, EnabledPolicy};
pub use resolver::{resolve, Resolution, ResolverConfig, ResolverPolicy};
pub use rules::{catalog, GestureRule, RuleFault, RuleInput, RuleThresholds};
pub use types::{ActiveGesture, Category, DetectedGestureSet, Gesture};
