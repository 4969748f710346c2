//! Sampling interval and annualization constants.

use std::fmt;
use std::str::FromStr;

pub const SESSION_MINUTES: u32 = 390;
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Minutes(u32),
    Daily,
}

impl Interval {
    /// Bars in one regular US equity session (6.5 hours). A shorter final
    /// bar still counts, so 1h gives 7.
    pub fn bars_per_day(&self) -> f64 {
        match self {
            Interval::Minutes(m) => SESSION_MINUTES.div_ceil(*m) as f64,
            Interval::Daily => 1.0,
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Interval::Minutes(5)
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "1d" || s == "d" || s == "daily" {
            return Ok(Interval::Daily);
        }

        let (number, scale) = if let Some(n) = s.strip_suffix('m') {
            (n, 1)
        } else if let Some(n) = s.strip_suffix('h') {
            (n, 60)
        } else {
            return Err(format!("unsupported interval '{}'", s));
        };

        let minutes = number
            .parse::<u32>()
            .map_err(|_| format!("invalid interval '{}'", s))?
            .checked_mul(scale)
            .ok_or_else(|| format!("invalid interval '{}'", s))?;

        if minutes == 0 || minutes > SESSION_MINUTES {
            return Err(format!(
                "interval '{}' must be between 1m and {}m",
                s, SESSION_MINUTES
            ));
        }
        Ok(Interval::Minutes(minutes))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Minutes(m) => write!(f, "{}m", m),
            Interval::Daily => write!(f, "1d"),
        }
    }
}
