//! Value domains of controls.

use serde::{Deserialize, Serialize};

/// Valid values of a control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlDomain {
    /// `min, min + step, ..` up to `max`.
    Stepped { min: i64, max: i64, step: i64 },
    /// A fixed set of members, kept sorted and deduplicated.
    Enumerated { members: Vec<i64> },
}

impl ControlDomain {
    /// Stepped domain. A non-positive step is treated as 1 and a reversed
    /// range is swapped.
    #[must_use]
    pub fn stepped(min: i64, max: i64, step: i64) -> Self {
        Self::Stepped {
            min: min.min(max),
            max: max.max(min),
            step: step.max(1),
        }
    }

    /// Enumerated domain over the given members.
    #[must_use]
    pub fn enumerated(members: impl IntoIterator<Item = i64>) -> Self {
        let mut members: Vec<i64> = members.into_iter().collect();
        members.sort_unstable();
        members.dedup();
        Self::Enumerated { members }
    }

    /// Smallest valid value, `None` for an empty enumeration.
    #[must_use]
    pub fn min(&self) -> Option<i64> {
        match self {
            Self::Stepped { min, .. } => Some(*min),
            Self::Enumerated { members } => members.first().copied(),
        }
    }

    /// Largest valid value, `None` for an empty enumeration.
    #[must_use]
    pub fn max(&self) -> Option<i64> {
        match self {
            Self::Stepped { max, .. } => Some(*max),
            Self::Enumerated { members } => members.last().copied(),
        }
    }

    /// True if `value` is in range and on-step (stepped) or a member
    /// (enumerated).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn contains(&self, value: f64) -> bool {
        if !value.is_finite() || value.fract() != 0.0 {
            return false;
        }
        match self {
            Self::Stepped { min, max, step } => {
                if value < *min as f64 || value > *max as f64 {
                    return false;
                }
                #[allow(clippy::cast_possible_truncation)]
                let v = value as i64;
                (v - min) % step == 0
            }
            Self::Enumerated { members } => members.iter().any(|&m| m as f64 == value),
        }
    }

    /// Nearest valid value to `x`.
    ///
    /// Stepped: `min + round((x - min) / step) * step`, clamped to the
    /// on-step values of the range.
    /// Enumerated: the closest member; ties go to the lower member.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn snap(&self, x: f64) -> Option<i64> {
        if !x.is_finite() {
            return None;
        }
        match self {
            Self::Stepped { min, max, step } => {
                let last_step = (max - min) / step;
                let steps = ((x - *min as f64) / *step as f64).round().clamp(0.0, last_step as f64);
                Some(min + (steps as i64) * step)
            }
            Self::Enumerated { members } => {
                let mut best: Option<(i64, f64)> = None;
                for &m in members {
                    let d = (m as f64 - x).abs();
                    // Members are sorted, so strict `<` keeps the lower on ties.
                    if best.map_or(true, |(_, bd)| d < bd) {
                        best = Some((m, d));
                    }
                }
                best.map(|(m, _)| m)
            }
        }
    }

    /// Moves `current` by `delta`, clamped to the domain.
    ///
    /// Stepped domains add `delta` directly. Enumerated domains move by
    /// `delta` members from the member nearest to `current`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn offset(&self, current: i64, delta: i64) -> Option<i64> {
        match self {
            Self::Stepped { min, max, .. } => Some(current.saturating_add(delta).clamp(*min, *max)),
            Self::Enumerated { members } => {
                let here = self.snap(current as f64)?;
                let idx = members.iter().position(|&m| m == here)?;
                let last = members.len() - 1;
                let moved = i64::try_from(idx)
                    .unwrap_or(i64::MAX)
                    .saturating_add(delta)
                    .clamp(0, i64::try_from(last).unwrap_or(i64::MAX));
                usize::try_from(moved).ok().and_then(|i| members.get(i).copied())
            }
        }
    }
}
