//! Cross-category resolution.
//!
//! Picks exactly one (category, gesture) pair per frame from the four
//! category results.  Categories are tried in fixed priority order
//! (Navigation > Camera > Movement > Action) and the candidate is checked
//! against a static compatibility table.

use std::fmt;

use tracing::debug;

use super::types::{ActiveGesture, Category, DetectedGestureSet, Gesture};

// ── Compatibility table ────────────────────────────────────

/// A table pattern over (category, gesture) pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// One specific pair.
    Exact(Category, Gesture),
    /// Any non-neutral gesture in the category.
    AnyIn(Category),
    /// Any other category being non-neutral.
    Any,
}

impl Pattern {
    /// Whether this pattern conflicts with the frame for a candidate in `own`.
    ///
    /// The candidate's own category never conflicts with itself.
    fn hits(&self, own: Category, detected: &DetectedGestureSet) -> bool {
        match *self {
            Pattern::Any => detected.non_neutral_count() > 1,
            Pattern::AnyIn(category) => category != own && !detected.get(category).is_neutral(),
            Pattern::Exact(category, gesture) => category != own && detected.get(category) == gesture,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Exact(c, g) => write!(f, "{}/{}", c, g),
            Pattern::AnyIn(c) => write!(f, "{}/*", c),
            Pattern::Any => f.write_str("*/*"),
        }
    }
}

/// One row of the compatibility table.
#[derive(Debug, Clone, Copy)]
pub struct CompatibilityEntry {
    pub category: Category,
    pub gesture: Gesture,
    pub can_coexist: &'static [Pattern],
    pub cannot_coexist: &'static [Pattern],
}

use Category::{Action as A, Camera as C, Movement as M, Navigation as N};
use Pattern::{Any, AnyIn, Exact};

static COMPATIBILITY: [CompatibilityEntry; 7] = [
    CompatibilityEntry {
        category: A,
        gesture: Gesture::Neutral,
        can_coexist: &[
            Exact(M, Gesture::Forward),
            Exact(M, Gesture::Backward),
            Exact(M, Gesture::Left),
            Exact(M, Gesture::Right),
            Exact(M, Gesture::Jump),
            Exact(N, Gesture::Neutral),
        ],
        cannot_coexist: &[
            AnyIn(A),
            AnyIn(C),
            Exact(N, Gesture::Ok),
            Exact(N, Gesture::F),
            Exact(N, Gesture::Esc),
        ],
    },
    CompatibilityEntry {
        category: A,
        gesture: Gesture::Attack,
        can_coexist: &[
            Exact(M, Gesture::Forward),
            Exact(M, Gesture::Backward),
            Exact(M, Gesture::Shift),
        ],
        cannot_coexist: &[
            AnyIn(A),
            AnyIn(C),
            Exact(M, Gesture::Left),
            Exact(M, Gesture::Right),
            Exact(M, Gesture::Jump),
            AnyIn(N),
        ],
    },
    CompatibilityEntry {
        category: M,
        gesture: Gesture::Neutral,
        can_coexist: &[
            Exact(A, Gesture::Neutral),
            Exact(A, Gesture::Attack),
            Exact(A, Gesture::Skill1),
            Exact(A, Gesture::Skill2),
            Exact(A, Gesture::Skill3),
            Exact(A, Gesture::Utility),
            Exact(N, Gesture::Neutral),
        ],
        cannot_coexist: &[
            AnyIn(M),
            AnyIn(C),
            Exact(N, Gesture::Ok),
            Exact(N, Gesture::F),
            Exact(N, Gesture::Esc),
        ],
    },
    CompatibilityEntry {
        category: C,
        gesture: Gesture::Neutral,
        can_coexist: &[Exact(M, Gesture::Forward), Exact(M, Gesture::Backward)],
        cannot_coexist: &[
            AnyIn(A),
            AnyIn(C),
            Exact(M, Gesture::Left),
            Exact(M, Gesture::Right),
            Exact(M, Gesture::Shift),
            Exact(M, Gesture::Jump),
            AnyIn(N),
        ],
    },
    CompatibilityEntry {
        category: N,
        gesture: Gesture::Ok,
        can_coexist: &[],
        cannot_coexist: &[Any],
    },
    CompatibilityEntry {
        category: N,
        gesture: Gesture::F,
        can_coexist: &[],
        cannot_coexist: &[Any],
    },
    CompatibilityEntry {
        category: N,
        gesture: Gesture::Esc,
        can_coexist: &[],
        cannot_coexist: &[Any],
    },
];

/// Table row for a pair, if it has one.
pub fn compatibility(category: Category, gesture: Gesture) -> Option<&'static CompatibilityEntry> {
    COMPATIBILITY
        .iter()
        .find(|e| e.category == category && e.gesture == gesture)
}

/// `cannot_coexist` patterns of `candidate` that the frame violates.
pub fn conflicts(candidate: ActiveGesture, detected: &DetectedGestureSet) -> Vec<Pattern> {
    compatibility(candidate.category, candidate.gesture)
        .map(|entry| {
            entry
                .cannot_coexist
                .iter()
                .copied()
                .filter(|p| p.hits(candidate.category, detected))
                .collect()
        })
        .unwrap_or_default()
}

// ── Policy ─────────────────────────────────────────────────

/// What happens when the top candidate conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolverPolicy {
    /// The highest-priority non-neutral category wins; conflicts are only reported.
    #[default]
    PriorityWins,
    /// Conflicting candidates are skipped in favor of the next category.
    Demote,
}

impl ResolverPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PriorityWins => "priority-wins",
            Self::Demote => "demote",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "priority-wins" => Some(Self::PriorityWins),
            "demote" => Some(Self::Demote),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolverConfig {
    pub policy: ResolverPolicy,
}

// ── Resolution ─────────────────────────────────────────────

/// A candidate's violated patterns.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub candidate: ActiveGesture,
    pub patterns: Vec<Pattern>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub active: ActiveGesture,
    /// Every conflicting candidate that was examined.
    pub conflicts: Vec<Conflict>,
    /// No candidate survived and the NEUTRAL fallback was used.
    pub ambiguous: bool,
}

impl Resolution {
    /// Generate s-expression for IPC diagnostics.
    pub fn to_sexp(&self) -> String {
        let conflicts: Vec<String> = self
            .conflicts
            .iter()
            .map(|c| {
                let patterns: Vec<String> =
                    c.patterns.iter().map(|p| format!("\"{}\"", p)).collect();
                format!("(:candidate \"{}\" :violates ({}))", c.candidate, patterns.join(" "))
            })
            .collect();
        format!(
            "(:active {} :ambiguous {} :conflicts {})",
            self.active.to_sexp(),
            if self.ambiguous { "t" } else { "nil" },
            if conflicts.is_empty() {
                "nil".to_string()
            } else {
                format!("({})", conflicts.join(" "))
            },
        )
    }
}

/// Choose the frame's single active gesture.
pub fn resolve(detected: &DetectedGestureSet, config: &ResolverConfig) -> Resolution {
    let mut found: Vec<Conflict> = Vec::new();
    for category in Category::PRIORITY {
        let gesture = detected.get(category);
        if gesture.is_neutral() {
            continue;
        }
        let candidate = ActiveGesture::new(category, gesture);
        let patterns = conflicts(candidate, detected);
        if patterns.is_empty() {
            return Resolution {
                active: candidate,
                conflicts: found,
                ambiguous: false,
            };
        }
        debug!(
            "Resolver conflict: {} violates {}",
            candidate,
            patterns
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        found.push(Conflict {
            candidate,
            patterns,
        });
        if config.policy == ResolverPolicy::PriorityWins {
            return Resolution {
                active: candidate,
                conflicts: found,
                ambiguous: false,
            };
        }
    }

    let ambiguous = !found.is_empty();
    if ambiguous {
        debug!("Resolver fell back to {}", ActiveGesture::NEUTRAL);
    }
    Resolution {
        active: ActiveGesture::NEUTRAL,
        conflicts: found,
        ambiguous,
    }
}

// ── Tests ──────────────────────────────────────────────────
