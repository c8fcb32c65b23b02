//! Category determinators.
//!
//! One generic loop walks a category's static catalog in rank order and
//! returns the first matching gesture.  The NEUTRAL rule (rank 0) is
//! evaluated separately to report whether the baseline pose is held; the
//! category falls back to NEUTRAL when no other rule matches.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use super::rules::{catalog, RuleInput};
use super::types::{Category, DetectedGestureSet, Gesture};

// ── Enable policy ──────────────────────────────────────────

/// Per-category and per-gesture enable flags.
#[derive(Debug, Clone, PartialEq)]
pub struct EnabledPolicy {
    pub action: bool,
    pub movement: bool,
    pub camera: bool,
    pub navigation: bool,
    disabled: BTreeSet<(Category, &'static str)>,
}

impl Default for EnabledPolicy {
    fn default() -> Self {
        Self {
            action: true,
            movement: true,
            camera: true,
            navigation: true,
            disabled: BTreeSet::new(),
        }
    }
}

impl EnabledPolicy {
    pub fn category_enabled(&self, category: Category) -> bool {
        match category {
            Category::Action => self.action,
            Category::Movement => self.movement,
            Category::Camera => self.camera,
            Category::Navigation => self.navigation,
        }
    }

    pub fn set_category(&mut self, category: Category, enabled: bool) {
        let slot = match category {
            Category::Action => &mut self.action,
            Category::Movement => &mut self.movement,
            Category::Camera => &mut self.camera,
            Category::Navigation => &mut self.navigation,
        };
        *slot = enabled;
    }

    /// Whether a gesture's rule may match. NEUTRAL is always enabled.
    pub fn gesture_enabled(&self, gesture: Gesture) -> bool {
        match gesture.category() {
            Some(category) => !self.disabled.contains(&(category, gesture.as_str())),
            None => true,
        }
    }

    /// Enable or disable one gesture. Returns false for NEUTRAL, which cannot be disabled.
    pub fn set_gesture(&mut self, gesture: Gesture, enabled: bool) -> bool {
        let Some(category) = gesture.category() else {
            return false;
        };
        if enabled {
            self.disabled.remove(&(category, gesture.as_str()));
        } else {
            self.disabled.insert((category, gesture.as_str()));
        }
        true
    }

    /// Re-enable every gesture. Category flags are untouched.
    pub fn enable_all_gestures(&mut self) {
        self.disabled.clear();
    }

    /// Disabled gestures as `category/gesture` names, sorted.
    pub fn disabled_names(&self) -> Vec<String> {
        self.disabled
            .iter()
            .map(|(c, g)| format!("{}/{}", c.as_str(), g))
            .collect()
    }
}

// ── Determination ──────────────────────────────────────────

/// One category's classification for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryOutcome {
    pub category: Category,
    pub gesture: Gesture,
    /// The category's NEUTRAL (baseline pose) rule matched.
    pub baseline: bool,
    /// Rules that could not be evaluated this frame.
    pub faults: u8,
}

impl CategoryOutcome {
    fn neutral(category: Category) -> Self {
        Self {
            category,
            gesture: Gesture::Neutral,
            baseline: false,
            faults: 0,
        }
    }
}

/// Classify one category. `input` is `None` when the frame has no palm box.
pub fn determine(
    category: Category,
    input: Option<&RuleInput<'_>>,
    policy: &EnabledPolicy,
) -> CategoryOutcome {
    let mut outcome = CategoryOutcome::neutral(category);
    if !policy.category_enabled(category) {
        trace!("{} disabled", category);
        return outcome;
    }
    let Some(input) = input else {
        return outcome;
    };

    let rules = catalog(category);
    if let Some(neutral) = rules.first() {
        match (neutral.predicate)(input) {
            Ok(held) => outcome.baseline = held,
            Err(fault) => {
                trace!("{}:{} not evaluated: {}", category, neutral.gesture, fault);
                outcome.faults += 1;
            }
        }
    }

    for rule in rules.iter().skip(1) {
        if !policy.gesture_enabled(rule.gesture) {
            continue;
        }
        match (rule.predicate)(input) {
            Ok(true) => {
                outcome.gesture = rule.gesture;
                return outcome;
            }
            Ok(false) => {}
            Err(fault) => {
                trace!("{}:{} not evaluated: {}", category, rule.gesture, fault);
                outcome.faults += 1;
            }
        }
    }
    outcome
}

/// All four categories for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub detected: DetectedGestureSet,
    pub outcomes: [CategoryOutcome; 4],
}

impl Classification {
    /// Whether `category`'s baseline pose was held.
    pub fn baseline(&self, category: Category) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.category == category && o.baseline)
    }

    /// Generate s-expression of the baseline flags for IPC.
    pub fn baseline_sexp(&self) -> String {
        let flag = |c| if self.baseline(c) { "t" } else { "nil" };
        format!(
            "(:action {} :movement {} :camera {} :navigation {})",
            flag(Category::Action),
            flag(Category::Movement),
            flag(Category::Camera),
            flag(Category::Navigation),
        )
    }
}

/// Run every determinator. Categories write disjoint slots.
pub fn determine_all(input: Option<&RuleInput<'_>>, policy: &EnabledPolicy) -> Classification {
    let outcomes = Category::ALL.map(|category| determine(category, input, policy));
    let mut detected = DetectedGestureSet::default();
    for outcome in &outcomes {
        detected.set(outcome.category, outcome.gesture);
    }
    if detected.non_neutral_count() > 0 {
        debug!("Detected {}", detected.to_sexp());
    }
    Classification { detected, outcomes }
}

// ── Tests ──────────────────────────────────────────────────
