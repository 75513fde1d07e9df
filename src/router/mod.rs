//! Interaction router.
//!
//! Maps UI events onto source-cell writes. Each target cell has one
//! [`Binding`]; when several of its triggers fire in the same tick, the one
//! listed first wins and the rest are ignored.

mod domain;
mod event;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RouterError;

pub use domain::ControlDomain;
pub use event::{EventKind, EventTick, UiEvent};

/// How a target cell is driven by UI controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    /// Source cell written by this binding.
    pub target: String,
    pub domain: ControlDomain,
    /// Event sources that may write the target, highest priority first.
    pub triggers: Vec<String>,
    /// Amount added by step-forward and subtracted by step-back.
    #[serde(default = "default_delta")]
    pub delta: i64,
}

const fn default_delta() -> i64 {
    1
}

impl Binding {
    #[must_use]
    pub fn new(target: impl Into<String>, domain: ControlDomain) -> Self {
        Self {
            target: target.into(),
            domain,
            triggers: Vec::new(),
            delta: default_delta(),
        }
    }

    /// Appends a trigger with lower priority than all previous ones.
    #[must_use]
    pub fn trigger(mut self, source: impl Into<String>) -> Self {
        self.triggers.push(source.into());
        self
    }

    #[must_use]
    pub const fn delta(mut self, delta: i64) -> Self {
        self.delta = delta;
        self
    }

    /// Priority of an event source, `0` being highest. `None` if the source
    /// does not drive this binding.
    #[must_use]
    pub fn priority(&self, source: &str) -> Option<usize> {
        self.triggers.iter().position(|t| t == source)
    }
}

/// Outcome of resolving one binding against one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Write this value to the target cell.
    Write(i64),
    /// No triggering event carried a payload; leave the cell alone.
    Retain,
    /// The winning event was rejected; no write.
    Dropped(RouterError),
}

/// Turns the winning event of a binding into a resolution.
pub trait EventResolver: Send + Sync {
    /// `events` are the tick's events that target `binding`, highest priority
    /// first.
    fn resolve(&self, binding: &Binding, events: &[&UiEvent], current: i64) -> Resolution;
}

/// Default policy.
///
/// - The first event with a payload wins.
/// - Chart clicks snap to the nearest valid value.
/// - Step buttons move by the binding's delta, clamped.
/// - Select values must already be valid, otherwise they are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultResolver;

impl EventResolver for DefaultResolver {
    #[allow(clippy::cast_precision_loss)]
    fn resolve(&self, binding: &Binding, events: &[&UiEvent], current: i64) -> Resolution {
        let Some(event) = events.iter().find(|e| e.kind.has_payload()) else {
            return Resolution::Retain;
        };

        let out_of_domain = |value: f64| {
            Resolution::Dropped(RouterError::OutOfDomain {
                target: binding.target.clone(),
                value,
            })
        };

        match event.kind {
            EventKind::ChartClick { x: Some(x) } => binding
                .domain
                .snap(x)
                .map_or_else(|| out_of_domain(x), Resolution::Write),
            EventKind::StepBack => binding
                .domain
                .offset(current, -binding.delta)
                .map_or_else(|| out_of_domain(current as f64), Resolution::Write),
            EventKind::StepForward => binding
                .domain
                .offset(current, binding.delta)
                .map_or_else(|| out_of_domain(current as f64), Resolution::Write),
            EventKind::Select { value: Some(v) } if binding.domain.contains(v) => {
                #[allow(clippy::cast_possible_truncation)]
                let v = v as i64;
                Resolution::Write(v)
            }
            EventKind::Select { value: Some(v) } => out_of_domain(v),
            EventKind::ChartClick { x: None } | EventKind::Select { value: None } => Resolution::Retain,
        }
    }
}

/// Writes produced by routing one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteOutcome {
    /// `(target cell, value)` pairs, in binding order.
    pub writes: Vec<(String, i64)>,
    /// Events rejected this tick.
    pub dropped: Vec<RouterError>,
}

impl RouteOutcome {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Holds every binding and resolves ticks against them.
#[derive(Debug, Clone, Default)]
pub struct InteractionRouter<R: EventResolver = DefaultResolver> {
    bindings: Vec<Binding>,
    resolver: R,
}

impl InteractionRouter<DefaultResolver> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_resolver(DefaultResolver)
    }
}

impl<R: EventResolver> InteractionRouter<R> {
    #[must_use]
    pub const fn with_resolver(resolver: R) -> Self {
        Self {
            bindings: Vec::new(),
            resolver,
        }
    }

    /// Adds a binding. A later binding for the same target replaces the
    /// earlier one.
    #[must_use]
    pub fn bind(mut self, binding: Binding) -> Self {
        self.bindings.retain(|b| b.target != binding.target);
        self.bindings.push(binding);
        self
    }

    #[must_use]
    pub fn binding(&self, target: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.target == target)
    }

    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Resolves the events of one tick for one target.
    ///
    /// # Errors
    ///
    /// `UnknownTarget` if no binding exists for `target`.
    pub fn resolve(&self, target: &str, events: &[UiEvent], current: i64) -> Result<Resolution, RouterError> {
        let binding = self.binding(target).ok_or_else(|| RouterError::UnknownTarget {
            target: target.to_string(),
        })?;
        Ok(self.resolve_binding(binding, events, current))
    }

    fn resolve_binding(&self, binding: &Binding, events: &[UiEvent], current: i64) -> Resolution {
        let mut relevant: Vec<(usize, &UiEvent)> = events
            .iter()
            .filter_map(|e| binding.priority(&e.source).map(|p| (p, e)))
            .collect();
        // Stable: events from the same source keep arrival order.
        relevant.sort_by_key(|(p, _)| *p);
        let ordered: Vec<&UiEvent> = relevant.into_iter().map(|(_, e)| e).collect();
        self.resolver.resolve(binding, &ordered, current)
    }

    /// Resolves every binding against `tick`.
    ///
    /// `current` returns the present value of a target cell; when it has none
    /// the domain minimum is used.
    pub fn route<F>(&self, tick: &EventTick, current: F) -> RouteOutcome
    where
        F: Fn(&str) -> Option<i64>,
    {
        let mut outcome = RouteOutcome::default();
        for binding in &self.bindings {
            let now = current(&binding.target)
                .or_else(|| binding.domain.min())
                .unwrap_or(0);
            match self.resolve_binding(binding, &tick.events, now) {
                Resolution::Write(value) => outcome.writes.push((binding.target.clone(), value)),
                Resolution::Retain => {}
                Resolution::Dropped(err) => {
                    debug!(error = %err, "event dropped");
                    outcome.dropped.push(err);
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_router() -> InteractionRouter {
        InteractionRouter::new().bind(
            Binding::new("selected_frame", ControlDomain::stepped(0, 3000, 5))
                .trigger("frame-slider")
                .trigger("regions-chart")
                .trigger("step-back")
                .trigger("step-forward")
                .delta(5),
        )
    }

    #[test]
    fn test_click_snaps_to_step() {
        let r = frame_router();
        let res = r
            .resolve("selected_frame", &[UiEvent::click("regions-chart", 123.0)], 0)
            .unwrap();
        assert_eq!(res, Resolution::Write(125));
    }

    #[test]
    fn test_step_back_clamps_at_min() {
        let r = frame_router();
        let res = r.resolve("selected_frame", &[UiEvent::step_back("step-back")], 2).unwrap();
        assert_eq!(res, Resolution::Write(0));
        let res = r
            .resolve("selected_frame", &[UiEvent::step_forward("step-forward")], 100)
            .unwrap();
        assert_eq!(res, Resolution::Write(105));
    }

    #[test]
    fn test_out_of_domain_select_is_dropped() {
        let r = frame_router();
        let res = r
            .resolve("selected_frame", &[UiEvent::select("frame-slider", 4000.0)], 10)
            .unwrap();
        assert!(matches!(res, Resolution::Dropped(RouterError::OutOfDomain { .. })));
    }

    #[test]
    fn test_highest_priority_wins() {
        let r = frame_router();
        let events = [
            UiEvent::click("regions-chart", 500.0),
            UiEvent::select("frame-slider", 40.0),
        ];
        assert_eq!(r.resolve("selected_frame", &events, 0).unwrap(), Resolution::Write(40));
    }

    #[test]
    fn test_empty_payload_falls_through_then_retains() {
        let r = frame_router();
        let events = [
            UiEvent::new("frame-slider", EventKind::Select { value: None }),
            UiEvent::click("regions-chart", 12.0),
        ];
        assert_eq!(r.resolve("selected_frame", &events, 0).unwrap(), Resolution::Write(10));

        let none = [UiEvent::new("regions-chart", EventKind::ChartClick { x: None })];
        assert_eq!(r.resolve("selected_frame", &none, 0).unwrap(), Resolution::Retain);
    }

    #[test]
    fn test_unrelated_sources_are_ignored() {
        let r = frame_router();
        let res = r.resolve("selected_frame", &[UiEvent::click("summary-chart", 7.0)], 0).unwrap();
        assert_eq!(res, Resolution::Retain);
        assert!(matches!(
            r.resolve("nope", &[], 0),
            Err(RouterError::UnknownTarget { .. })
        ));
    }

    #[test]
    fn test_route_collects_writes_and_drops() {
        let r = frame_router().bind(
            Binding::new("selected_snapshot", ControlDomain::enumerated([10, 20, 50]))
                .trigger("snapshot-slider"),
        );
        let tick = EventTick::new([
            UiEvent::step_forward("step-forward"),
            UiEvent::select("snapshot-slider", 30.0),
        ]);
        let outcome = r.route(&tick, |target| match target {
            "selected_frame" => Some(20),
            _ => Some(50),
        });
        assert_eq!(outcome.writes, vec![("selected_frame".to_string(), 25)]);
        assert_eq!(outcome.dropped.len(), 1);
    }
}
