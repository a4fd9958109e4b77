//! Host-side display state for the live preview.
//!
//! The state machine is synchronous and owns no timers or contexts; the
//! supervisor feeds it attempt-tagged events and it decides what the host
//! shows. Events tagged with a superseded attempt are reported as stale and
//! leave the state untouched.

use std::fmt;

/// Identifies one render attempt. Strictly increasing per display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AttemptId(u64);

impl AttemptId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt-{}", self.0)
    }
}

/// What the host reports about the current render.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum RenderOutcome {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DisplayState {
    /// Nothing has been presented yet, or the last failure was dismissed.
    #[default]
    Idle,
    Loading { attempt: AttemptId },
    Ready { attempt: AttemptId },
    /// `attempt` is `None` when the failure happened before any render
    /// (extraction or generation failed).
    Failed {
        attempt: Option<AttemptId>,
        message: String,
    },
}

impl DisplayState {
    pub fn attempt(&self) -> Option<AttemptId> {
        match self {
            Self::Idle => None,
            Self::Loading { attempt } | Self::Ready { attempt } => Some(*attempt),
            Self::Failed { attempt, .. } => *attempt,
        }
    }

    pub fn outcome(&self) -> Option<RenderOutcome> {
        match self {
            Self::Idle => None,
            Self::Loading { .. } => Some(RenderOutcome::Loading),
            Self::Ready { .. } => Some(RenderOutcome::Ready),
            Self::Failed { message, .. } => Some(RenderOutcome::Failed(message.clone())),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Ready { .. } | Self::Failed { .. })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewportMode {
    #[default]
    Desktop,
    Mobile,
}

impl ViewportMode {
    /// Fixed frame size in CSS pixels; `None` fills the available area.
    pub fn frame_size(self) -> Option<(u32, u32)> {
        match self {
            Self::Desktop => None,
            Self::Mobile => Some((375, 667)),
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Desktop => Self::Mobile,
            Self::Mobile => Self::Desktop,
        }
    }
}

pub const IDLE_PROMPT: &str = "Describe your shop to generate a preview";
pub const ERROR_TITLE: &str = "Preview Error";
pub const RETRY_HINT: &str = "Try regenerating with simpler requirements";

/// What the host draws in the preview area.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Panel {
    /// Explanatory panel shown before anything was presented.
    Placeholder { message: &'static str },
    /// Dismissible explanatory panel replacing the isolated context.
    Error {
        title: &'static str,
        message: String,
        hint: &'static str,
    },
    /// The isolated context, optionally covered by a busy indicator.
    Frame { busy: bool, viewport: ViewportMode },
}

/// Result of feeding one event to the display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Changed(DisplayState),
    Unchanged,
    /// The event belonged to a superseded attempt and was discarded.
    Stale,
}

#[derive(Debug, Default)]
pub struct PreviewDisplay {
    state: DisplayState,
    viewport: ViewportMode,
    last_attempt: u64,
}

impl PreviewDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn viewport(&self) -> ViewportMode {
        self.viewport
    }

    /// Viewport changes are allowed in every state and never touch the
    /// render state.
    pub fn set_viewport(&mut self, viewport: ViewportMode) {
        self.viewport = viewport;
    }

    pub fn toggle_viewport(&mut self) -> ViewportMode {
        self.viewport = self.viewport.toggled();
        self.viewport
    }

    /// Whether `attempt` is the attempt currently on screen.
    pub fn is_current(&self, attempt: AttemptId) -> bool {
        self.last_attempt == attempt.0 && self.state.attempt() == Some(attempt)
    }

    /// Starts a new attempt from any state. Every earlier attempt becomes stale.
    pub fn begin_attempt(&mut self) -> AttemptId {
        self.last_attempt += 1;
        let attempt = AttemptId(self.last_attempt);
        self.state = DisplayState::Loading { attempt };
        attempt
    }

    /// The settle window for `attempt` elapsed without a fault.
    pub fn settle(&mut self, attempt: AttemptId) -> Transition {
        if !self.is_current(attempt) {
            return Transition::Stale;
        }
        match self.state {
            DisplayState::Loading { .. } => self.enter(DisplayState::Ready { attempt }),
            _ => Transition::Unchanged,
        }
    }

    /// A fault arrived from the context running `attempt`. Applies while
    /// loading and after ready; the first fault of an attempt is kept.
    pub fn fault(&mut self, attempt: AttemptId, message: impl Into<String>) -> Transition {
        if !self.is_current(attempt) {
            return Transition::Stale;
        }
        match self.state {
            DisplayState::Loading { .. } | DisplayState::Ready { .. } => {
                self.enter(DisplayState::Failed {
                    attempt: Some(attempt),
                    message: message.into(),
                })
            }
            _ => Transition::Unchanged,
        }
    }

    /// A failure upstream of rendering. Supersedes any attempt on screen.
    pub fn fail_without_attempt(&mut self, message: impl Into<String>) -> Transition {
        self.enter(DisplayState::Failed {
            attempt: None,
            message: message.into(),
        })
    }

    /// Closes the error panel.
    pub fn dismiss(&mut self) -> Transition {
        match self.state {
            DisplayState::Failed { .. } => self.enter(DisplayState::Idle),
            _ => Transition::Unchanged,
        }
    }

    pub fn panel(&self) -> Panel {
        match &self.state {
            DisplayState::Idle => Panel::Placeholder {
                message: IDLE_PROMPT,
            },
            DisplayState::Failed { message, .. } => Panel::Error {
                title: ERROR_TITLE,
                message: message.clone(),
                hint: RETRY_HINT,
            },
            DisplayState::Loading { .. } => Panel::Frame {
                busy: true,
                viewport: self.viewport,
            },
            DisplayState::Ready { .. } => Panel::Frame {
                busy: false,
                viewport: self.viewport,
            },
        }
    }

    fn enter(&mut self, next: DisplayState) -> Transition {
        self.state = next.clone();
        Transition::Changed(next)
    }
}
