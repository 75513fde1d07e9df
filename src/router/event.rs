//! UI events and ticks.

use serde::{Deserialize, Serialize};

/// What the user did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Click on a chart. `x` is `None` when the click missed every point.
    ChartClick { x: Option<f64> },
    /// Step-back button.
    StepBack,
    /// Step-forward button.
    StepForward,
    /// Slider or dropdown value. `None` when the control was cleared.
    Select { value: Option<f64> },
}

impl EventKind {
    /// True if the event carries something to act on.
    #[must_use]
    pub const fn has_payload(&self) -> bool {
        match self {
            Self::ChartClick { x } => x.is_some(),
            Self::Select { value } => value.is_some(),
            Self::StepBack | Self::StepForward => true,
        }
    }
}

/// One event from one control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiEvent {
    /// Id of the control or chart that emitted the event.
    pub source: String,
    pub kind: EventKind,
}

impl UiEvent {
    #[must_use]
    pub fn new(source: impl Into<String>, kind: EventKind) -> Self {
        Self {
            source: source.into(),
            kind,
        }
    }

    #[must_use]
    pub fn click(source: impl Into<String>, x: f64) -> Self {
        Self::new(source, EventKind::ChartClick { x: Some(x) })
    }

    #[must_use]
    pub fn select(source: impl Into<String>, value: f64) -> Self {
        Self::new(source, EventKind::Select { value: Some(value) })
    }

    #[must_use]
    pub fn step_back(source: impl Into<String>) -> Self {
        Self::new(source, EventKind::StepBack)
    }

    #[must_use]
    pub fn step_forward(source: impl Into<String>) -> Self {
        Self::new(source, EventKind::StepForward)
    }
}

/// Events that arrived together and are handled as one wave.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTick {
    pub events: Vec<UiEvent>,
}

impl EventTick {
    #[must_use]
    pub fn new(events: impl IntoIterator<Item = UiEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    /// Tick with a single event.
    #[must_use]
    pub fn single(event: UiEvent) -> Self {
        Self { events: vec![event] }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl From<UiEvent> for EventTick {
    fn from(event: UiEvent) -> Self {
        Self::single(event)
    }
}
