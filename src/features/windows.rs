use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the schedule treats the tail of the period once the next step would
/// start past the last transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TailPolicy {
    /// Emit one final window realigned to end just after the last transaction,
    /// even if it overlaps the previous window.
    #[default]
    Snap,
    /// Keep uniform spacing and stop. The last transaction may go uncovered
    /// when the step is longer than the window.
    Uniform,
}

impl FromStr for TailPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "snap" => Ok(Self::Snap),
            "uniform" => Ok(Self::Uniform),
            other => Err(format!(
                "unknown tail policy '{}', expected 'snap' or 'uniform'",
                other
            )),
        }
    }
}

/// Window geometry for one extraction run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowParams {
    pub window: Duration,
    pub step: Duration,
    pub tail: TailPolicy,
}

impl WindowParams {
    pub fn from_hours(window_hours: u32, step_hours: u32, tail: TailPolicy) -> Self {
        Self {
            window: Duration::hours(i64::from(window_hours)),
            step: Duration::hours(i64::from(step_hours)),
            tail,
        }
    }

    pub fn validate(&self) -> eyre::Result<()> {
        if self.window <= Duration::zero() {
            return Err(eyre::eyre!("Window duration must be positive"));
        }
        if self.step <= Duration::zero() {
            return Err(eyre::eyre!("Step duration must be positive"));
        }
        Ok(())
    }
}

/// `t + by`, or an error when the result leaves chrono's representable range.
pub fn shift(t: DateTime<Utc>, by: Duration) -> eyre::Result<DateTime<Utc>> {
    t.checked_add_signed(by)
        .ok_or_else(|| eyre::eyre!("Timestamp {} shifted by {} is out of range", t, by))
}

/// Compute window start times covering `[t_min, t_max]`.
///
/// Starts advance by `step` from `t_min`. When the next step would pass `t_max`
/// while the current start is still before it, the run ends; under
/// [`TailPolicy::Snap`] a window that does not cover `t_max` is first followed by
/// one realigned to start at `t_max - window + 1s` (never before `t_min`), so the
/// last transaction always falls inside some window.
pub fn window_starts(
    t_min: DateTime<Utc>,
    t_max: DateTime<Utc>,
    params: &WindowParams,
) -> eyre::Result<Vec<DateTime<Utc>>> {
    params.validate()?;

    let snap_unit = Duration::seconds(1);
    let mut starts = Vec::new();
    let mut current = t_min;

    while current <= t_max {
        starts.push(current);

        let end = shift(current, params.window)?;
        // a step beyond representable time always lands past t_max
        let next = current
            .checked_add_signed(params.step)
            .filter(|next| *next <= t_max);

        match next {
            Some(next) => current = next,
            None if current < t_max => {
                // [current, end) only covers t_max when end is strictly later
                if end > t_max || params.tail == TailPolicy::Uniform {
                    break;
                }
                current = shift(t_max, snap_unit - params.window)?.max(t_min);
            }
            None => break,
        }
    }

    Ok(starts)
}
