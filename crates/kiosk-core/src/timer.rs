//! Named timers expressed as `[minutes, seconds, milliseconds]` patterns.
//!
//! Every timer the kiosk uses (request timeout, breathing interval, tick
//! period) is configured as a pattern and materialized into a [`Duration`]
//! whenever the active set changes. The server may push a replacement set
//! with any handshake response.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Handshake request timeout.
pub const CALLOUT: &str = "callout";
/// Pause inserted between a directive and the action it spawns.
pub const BREATHE: &str = "breathe";
/// Scheduler tick period used by the driver.
pub const TICK: &str = "tick";

// ---------------------------------------------------------------------------
// TimerPattern
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPattern", into = "[u64; 3]")]
pub struct TimerPattern {
    pub minutes: u64,
    pub seconds: u64,
    pub millis: u64,
}

impl TimerPattern {
    pub const fn new(minutes: u64, seconds: u64, millis: u64) -> Self {
        Self {
            minutes,
            seconds,
            millis,
        }
    }

    /// Total milliseconds, or `None` if the sum does not fit in a `u64`.
    pub fn checked_millis(&self) -> Option<u64> {
        self.minutes
            .checked_mul(60_000)?
            .checked_add(self.seconds.checked_mul(1_000)?)?
            .checked_add(self.millis)
    }

    /// Total milliseconds, saturating at `u64::MAX`. Deserialized patterns
    /// are rejected before they can saturate.
    pub fn as_millis(&self) -> u64 {
        self.checked_millis().unwrap_or(u64::MAX)
    }

    pub fn resolve(&self) -> Duration {
        Duration::from_millis(self.as_millis())
    }
}

impl fmt::Display for TimerPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.minutes, self.seconds, self.millis)
    }
}

impl From<TimerPattern> for [u64; 3] {
    fn from(p: TimerPattern) -> Self {
        [p.minutes, p.seconds, p.millis]
    }
}

impl From<[u64; 3]> for TimerPattern {
    fn from([minutes, seconds, millis]: [u64; 3]) -> Self {
        Self::new(minutes, seconds, millis)
    }
}

/// The server sends SLEEP patterns as a JSON-encoded string (`"[0,30,0]"`)
/// while configuration files use a plain array; both are accepted.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPattern {
    Triple([u64; 3]),
    Encoded(String),
}

impl TryFrom<RawPattern> for TimerPattern {
    type Error = String;

    fn try_from(raw: RawPattern) -> std::result::Result<Self, Self::Error> {
        let pattern: TimerPattern = match raw {
            RawPattern::Triple(t) => t.into(),
            RawPattern::Encoded(s) => serde_json::from_str::<[u64; 3]>(s.trim())
                .map(Into::into)
                .map_err(|e| format!("invalid timer pattern {s:?}: {e}"))?,
        };
        match pattern.checked_millis() {
            Some(_) => Ok(pattern),
            None => Err(format!("timer pattern {pattern} overflows a millisecond count")),
        }
    }
}

// ---------------------------------------------------------------------------
// Timer / TimerSet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    pub pattern: TimerPattern,
    /// Resolved milliseconds. Always recomputed from `pattern`; whatever the
    /// wire carries here is ignored.
    #[serde(default)]
    pub value: u64,
}

impl Timer {
    pub fn new(pattern: TimerPattern) -> Self {
        Self {
            pattern,
            value: pattern.as_millis(),
        }
    }
}

pub type TimerSet = BTreeMap<String, Timer>;

// ---------------------------------------------------------------------------
// TimerTable
// ---------------------------------------------------------------------------

/// The active timer configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimerTable {
    timers: TimerSet,
}

impl TimerTable {
    pub fn new(set: TimerSet) -> Self {
        let mut table = Self::default();
        table.apply(set);
        table
    }

    /// Replace the active set. Values are re-derived from patterns; names
    /// missing from `set` disappear.
    pub fn apply(&mut self, set: TimerSet) {
        self.timers = set
            .into_iter()
            .map(|(name, timer)| {
                let resolved = Timer::new(timer.pattern);
                tracing::debug!(
                    timer = %name,
                    pattern = %resolved.pattern,
                    seconds = resolved.value as f64 / 1000.0,
                    "timer resolved"
                );
                (name, resolved)
            })
            .collect();
    }

    pub fn get(&self, name: &str) -> Option<Duration> {
        self.timers
            .get(name)
            .map(|t| Duration::from_millis(t.value))
    }

    pub fn get_or(&self, name: &str, fallback: Duration) -> Duration {
        self.get(name).unwrap_or(fallback)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Timer)> {
        self.timers.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(entries: &[(&str, [u64; 3])]) -> TimerSet {
        entries
            .iter()
            .map(|(n, p)| (n.to_string(), Timer::new((*p).into())))
            .collect()
    }

    #[test]
    fn resolve_combines_components() {
        assert_eq!(TimerPattern::new(1, 2, 3).as_millis(), 62_003);
        assert_eq!(TimerPattern::new(0, 30, 0).resolve(), Duration::from_secs(30));
    }

    #[test]
    fn resolve_zero_is_zero() {
        assert_eq!(TimerPattern::new(0, 0, 0).resolve(), Duration::ZERO);
    }

    #[test]
    fn resolve_matches_formula_over_a_range() {
        for m in [0u64, 1, 7, 59] {
            for s in [0u64, 1, 30, 59] {
                for ms in [0u64, 1, 250, 999] {
                    let p = TimerPattern::new(m, s, ms);
                    assert_eq!(p.as_millis(), m * 60_000 + s * 1_000 + ms);
                }
            }
        }
    }

    #[test]
    fn pattern_accepts_array_and_encoded_string() {
        let a: TimerPattern = serde_json::from_str("[0, 5, 0]").unwrap();
        let b: TimerPattern = serde_json::from_str("\"[0,5,0]\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "[0,5,0]");
    }

    #[test]
    fn pattern_rejects_overflowing_components() {
        for raw in ["[18446744073709551615, 0, 0]", "\"[0,18446744073709551615,0]\""] {
            let err = serde_json::from_str::<TimerPattern>(raw).unwrap_err();
            assert!(err.to_string().contains("overflows"), "{raw}: {err}");
        }
        // A lone huge millis component still fits.
        let p: TimerPattern = serde_json::from_str("[0, 0, 18446744073709551615]").unwrap();
        assert_eq!(p.as_millis(), u64::MAX);
    }

    #[test]
    fn as_millis_saturates_for_hand_built_patterns() {
        let p = TimerPattern::new(u64::MAX, 0, 0);
        assert_eq!(p.checked_millis(), None);
        assert_eq!(p.as_millis(), u64::MAX);
        assert_eq!(p.resolve(), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn pattern_rejects_garbage_string() {
        let err = serde_json::from_str::<TimerPattern>("\"soon\"");
        assert!(err.is_err());
    }

    #[test]
    fn apply_recomputes_stale_values() {
        let json = r#"{"breathe": {"pattern": [0, 2, 0], "value": 999999}}"#;
        let incoming: TimerSet = serde_json::from_str(json).unwrap();
        let table = TimerTable::new(incoming);
        assert_eq!(table.get(BREATHE), Some(Duration::from_secs(2)));
    }

    #[test]
    fn apply_replaces_whole_set() {
        let mut table = TimerTable::new(set(&[(CALLOUT, [0, 30, 0]), (BREATHE, [0, 1, 0])]));
        table.apply(set(&[(BREATHE, [0, 3, 0])]));
        assert_eq!(table.get(CALLOUT), None);
        assert_eq!(table.get(BREATHE), Some(Duration::from_secs(3)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn apply_is_idempotent() {
        let incoming = set(&[(TICK, [0, 0, 250])]);
        let mut a = TimerTable::default();
        a.apply(incoming.clone());
        let snapshot = a.clone();
        a.apply(incoming);
        assert_eq!(a, snapshot);
    }
}
