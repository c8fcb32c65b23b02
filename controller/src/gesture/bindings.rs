//! Gesture-to-input bindings.
//!
//! Maps a confirmed (category, gesture) pair to the input command a
//! downstream injector should emit.  The table only stores the mapping;
//! nothing here sends input.

use anyhow::{bail, Result};
use tracing::info;

use crate::ipc::codec::escape_string;

use super::types::{ActiveGesture, Category, Gesture};

/// A gesture-to-command binding.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureBinding {
    pub category: Category,
    pub gesture: Gesture,
    /// Input command (e.g. "key-w", "mouse-left").
    pub command: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BindingTable {
    bindings: Vec<GestureBinding>,
}

const DEFAULT_BINDINGS: [(Category, Gesture, &str); 19] = [
    (Category::Action, Gesture::Attack, "mouse-left"),
    (Category::Action, Gesture::Skill1, "key-e"),
    (Category::Action, Gesture::Skill2, "key-r"),
    (Category::Action, Gesture::Skill3, "key-q"),
    (Category::Action, Gesture::Utility, "key-t"),
    (Category::Movement, Gesture::Forward, "key-w"),
    (Category::Movement, Gesture::Backward, "key-s"),
    (Category::Movement, Gesture::Left, "key-a"),
    (Category::Movement, Gesture::Right, "key-d"),
    (Category::Movement, Gesture::Shift, "key-shift"),
    (Category::Movement, Gesture::Jump, "key-space"),
    (Category::Camera, Gesture::PanUp, "camera-pan-up"),
    (Category::Camera, Gesture::PanDown, "camera-pan-down"),
    (Category::Camera, Gesture::PanLeft, "camera-pan-left"),
    (Category::Camera, Gesture::PanRight, "camera-pan-right"),
    (Category::Camera, Gesture::Lock, "mouse-middle"),
    (Category::Navigation, Gesture::Ok, "key-enter"),
    (Category::Navigation, Gesture::F, "key-f"),
    (Category::Navigation, Gesture::Esc, "key-escape"),
];

impl Default for BindingTable {
    fn default() -> Self {
        Self {
            bindings: DEFAULT_BINDINGS
                .iter()
                .map(|(category, gesture, command)| GestureBinding {
                    category: *category,
                    gesture: *gesture,
                    command: command.to_string(),
                })
                .collect(),
        }
    }
}

impl BindingTable {
    /// A table with no bindings.
    pub fn empty() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Bind a gesture, replacing any existing binding for it.
    pub fn bind(&mut self, category: Category, gesture: Gesture, command: &str) -> Result<()> {
        if gesture.is_neutral() {
            bail!("neutral cannot be bound");
        }
        if !category.accepts(gesture) {
            bail!("{} is not a {} gesture", gesture, category);
        }
        if command.is_empty() {
            bail!("empty command");
        }
        self.bindings
            .retain(|b| !(b.category == category && b.gesture == gesture));
        self.bindings.push(GestureBinding {
            category,
            gesture,
            command: command.to_string(),
        });
        info!("Bound {}:{} -> {}", category, gesture, command);
        Ok(())
    }

    /// Remove a binding. Returns true if a binding was removed.
    pub fn unbind(&mut self, category: Category, gesture: Gesture) -> bool {
        let before = self.bindings.len();
        self.bindings
            .retain(|b| !(b.category == category && b.gesture == gesture));
        let removed = self.bindings.len() < before;
        if removed {
            info!("Unbound {}:{}", category, gesture);
        }
        removed
    }

    /// Command bound to an active gesture.
    pub fn command_for(&self, active: ActiveGesture) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.category == active.category && b.gesture == active.gesture)
            .map(|b| b.command.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GestureBinding> {
        self.bindings.iter()
    }

    /// Generate s-expression listing all bindings.
    pub fn bindings_sexp(&self) -> String {
        if self.bindings.is_empty() {
            return "nil".to_string();
        }
        let mut s = String::from("(");
        for (i, b) in self.bindings.iter().enumerate() {
            if i > 0 {
                s.push(' ');
            }
            s.push_str(&format!(
                "(:category :{} :gesture :{} :command \"{}\")",
                b.category,
                b.gesture,
                escape_string(&b.command),
            ));
        }
        s.push(')');
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_gesture() {
        let table = BindingTable::default();
        assert_eq!(table.len(), 19);
        for category in Category::ALL {
            for g in &category.gestures()[1..] {
                assert!(
                    table.command_for(ActiveGesture::new(category, *g)).is_some(),
                    "{}:{} bound",
                    category,
                    g
                );
            }
        }
        assert_eq!(
            table.command_for(ActiveGesture::new(Category::Movement, Gesture::Jump)),
            Some("key-space")
        );
        assert_eq!(table.command_for(ActiveGesture::NEUTRAL), None);
    }

    #[test]
    fn test_bind_replaces() {
        let mut table = BindingTable::default();
        table
            .bind(Category::Action, Gesture::Attack, "mouse-right")
            .expect("bind");
        assert_eq!(table.len(), 19);
        assert_eq!(
            table.command_for(ActiveGesture::new(Category::Action, Gesture::Attack)),
            Some("mouse-right")
        );
    }

    #[test]
    fn test_bind_rejects_mismatched_category() {
        let mut table = BindingTable::empty();
        assert!(table.bind(Category::Camera, Gesture::Attack, "key-x").is_err());
        assert!(table.bind(Category::Action, Gesture::Neutral, "key-x").is_err());
        assert!(table.bind(Category::Action, Gesture::Attack, "").is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_unbind() {
        let mut table = BindingTable::default();
        assert!(table.unbind(Category::Navigation, Gesture::Esc));
        assert!(!table.unbind(Category::Navigation, Gesture::Esc));
        assert_eq!(table.len(), 18);
    }

    #[test]
    fn test_bindings_sexp() {
        let mut table = BindingTable::empty();
        assert_eq!(table.bindings_sexp(), "nil");
        table
            .bind(Category::Navigation, Gesture::Ok, "key-\"enter\"")
            .expect("bind");
        assert_eq!(
            table.bindings_sexp(),
            "((:category :navigation :gesture :ok :command \"key-\\\"enter\\\"\"))"
        );
    }
}
