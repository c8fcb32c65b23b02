//! Gesture vocabulary: categories, gestures and the per-frame sets
//! the pipeline passes between stages.

use std::fmt;

// ── Categories ─────────────────────────────────────────────

/// Control category. Each category classifies independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Action,
    Movement,
    Camera,
    Navigation,
}

impl Category {
    /// All categories in declaration order.
    pub const ALL: [Category; 4] = [
        Category::Action,
        Category::Movement,
        Category::Camera,
        Category::Navigation,
    ];

    /// Categories from highest to lowest resolver priority.
    pub const PRIORITY: [Category; 4] = [
        Category::Navigation,
        Category::Camera,
        Category::Movement,
        Category::Action,
    ];

    /// String representation for IPC.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Movement => "movement",
            Self::Camera => "camera",
            Self::Navigation => "navigation",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "action" => Some(Self::Action),
            "movement" => Some(Self::Movement),
            "camera" => Some(Self::Camera),
            "navigation" => Some(Self::Navigation),
            _ => None,
        }
    }

    /// Gestures this category can report, NEUTRAL first.
    pub fn gestures(&self) -> &'static [Gesture] {
        use Gesture::*;
        match self {
            Self::Action => &[Neutral, Attack, Skill1, Skill2, Skill3, Utility],
            Self::Movement => &[Neutral, Forward, Backward, Left, Right, Shift, Jump],
            Self::Camera => &[Neutral, PanUp, PanDown, PanLeft, PanRight, Lock],
            Self::Navigation => &[Neutral, Ok, F, Esc],
        }
    }

    /// Whether `gesture` belongs to this category.
    pub fn accepts(&self, gesture: Gesture) -> bool {
        self.gestures().contains(&gesture)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Gestures ───────────────────────────────────────────────

/// Recognized gestures. `Neutral` is shared by every category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    Neutral,
    // Action
    Attack,
    Skill1,
    Skill2,
    Skill3,
    Utility,
    // Movement
    Forward,
    Backward,
    Left,
    Right,
    Shift,
    Jump,
    // Camera
    PanUp,
    PanDown,
    PanLeft,
    PanRight,
    Lock,
    // Navigation
    Ok,
    F,
    Esc,
}

impl Gesture {
    /// String representation for IPC.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Attack => "attack",
            Self::Skill1 => "skill-1",
            Self::Skill2 => "skill-2",
            Self::Skill3 => "skill-3",
            Self::Utility => "utility",
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Left => "left",
            Self::Right => "right",
            Self::Shift => "shift",
            Self::Jump => "jump",
            Self::PanUp => "pan-up",
            Self::PanDown => "pan-down",
            Self::PanLeft => "pan-left",
            Self::PanRight => "pan-right",
            Self::Lock => "lock",
            Self::Ok => "ok",
            Self::F => "f",
            Self::Esc => "esc",
        }
    }

    /// Parse an IPC name. Underscored upper-case forms (`SKILL_1`) are accepted too.
    pub fn from_str(s: &str) -> Option<Self> {
        let name = s.to_ascii_lowercase().replace('_', "-");
        Category::ALL
            .iter()
            .flat_map(|c| c.gestures().iter().copied())
            .find(|g| g.as_str() == name)
    }

    /// Owning category; `None` for `Neutral`.
    pub fn category(&self) -> Option<Category> {
        match self {
            Self::Neutral => None,
            Self::Attack | Self::Skill1 | Self::Skill2 | Self::Skill3 | Self::Utility => {
                Some(Category::Action)
            }
            Self::Forward | Self::Backward | Self::Left | Self::Right | Self::Shift | Self::Jump => {
                Some(Category::Movement)
            }
            Self::PanUp | Self::PanDown | Self::PanLeft | Self::PanRight | Self::Lock => {
                Some(Category::Camera)
            }
            Self::Ok | Self::F | Self::Esc => Some(Category::Navigation),
        }
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::Neutral
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Per-frame sets ─────────────────────────────────────────

/// Each category's classification for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedGestureSet {
    pub action: Gesture,
    pub movement: Gesture,
    pub camera: Gesture,
    pub navigation: Gesture,
}

impl Default for DetectedGestureSet {
    fn default() -> Self {
        Self {
            action: Gesture::Neutral,
            movement: Gesture::Neutral,
            camera: Gesture::Neutral,
            navigation: Gesture::Neutral,
        }
    }
}

impl DetectedGestureSet {
    pub fn get(&self, category: Category) -> Gesture {
        match category {
            Category::Action => self.action,
            Category::Movement => self.movement,
            Category::Camera => self.camera,
            Category::Navigation => self.navigation,
        }
    }

    pub fn set(&mut self, category: Category, gesture: Gesture) {
        let slot = match category {
            Category::Action => &mut self.action,
            Category::Movement => &mut self.movement,
            Category::Camera => &mut self.camera,
            Category::Navigation => &mut self.navigation,
        };
        *slot = gesture;
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, category: Category, gesture: Gesture) -> Self {
        self.set(category, gesture);
        self
    }

    /// Number of categories reporting something other than NEUTRAL.
    pub fn non_neutral_count(&self) -> usize {
        Category::ALL
            .iter()
            .filter(|c| !self.get(**c).is_neutral())
            .count()
    }

    /// Generate s-expression for IPC.
    pub fn to_sexp(&self) -> String {
        format!(
            "(:action :{} :movement :{} :camera :{} :navigation :{})",
            self.action, self.movement, self.camera, self.navigation,
        )
    }
}

/// The single (category, gesture) pair chosen for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveGesture {
    pub category: Category,
    pub gesture: Gesture,
}

impl ActiveGesture {
    /// The fallback pair when nothing is active.
    pub const NEUTRAL: ActiveGesture = ActiveGesture {
        category: Category::Action,
        gesture: Gesture::Neutral,
    };

    pub fn new(category: Category, gesture: Gesture) -> Self {
        Self { category, gesture }
    }

    pub fn is_neutral(&self) -> bool {
        self.gesture.is_neutral()
    }

    /// Generate s-expression for IPC.
    pub fn to_sexp(&self) -> String {
        format!("(:category :{} :gesture :{})", self.category, self.gesture)
    }
}

impl fmt::Display for ActiveGesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.gesture)
    }
}

// ── Tests ──────────────────────────────────────────────────
