use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde::Deserialize;

/// A timestamp as reporters emit it: epoch milliseconds or ISO-8601 text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NativeTime {
    Millis(f64),
    Text(String),
}

impl NativeTime {
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            NativeTime::Millis(ms) => Utc.timestamp_millis_opt(ms.round() as i64).single(),
            NativeTime::Text(text) => DateTime::parse_from_rfc3339(text.trim())
                .ok()
                .map(|t| t.with_timezone(&Utc)),
        }
    }
}

/// Resolve a run's (start, end), falling back to the current time for either
/// end the reporter left out or wrote unreadably.
pub fn resolve_window(
    start: Option<&NativeTime>,
    end: Option<&NativeTime>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let now = Utc::now();
    let start = start.and_then(NativeTime::to_utc).unwrap_or(now);
    let end = end.and_then(NativeTime::to_utc).unwrap_or(now);
    (start, end)
}

/// The instant `duration_ms` before `end`, or `end` itself if that is out of range.
pub fn started_before(end: DateTime<Utc>, duration_ms: u64) -> DateTime<Utc> {
    i64::try_from(duration_ms)
        .ok()
        .and_then(TimeDelta::try_milliseconds)
        .and_then(|delta| end.checked_sub_signed(delta))
        .unwrap_or(end)
}

/// Native fractional milliseconds to whole milliseconds.
pub fn millis(duration: Option<f64>) -> u64 {
    match duration {
        Some(d) if d.is_finite() && d > 0.0 => d.round() as u64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_epoch_and_iso() {
        let epoch = NativeTime::Millis(1_700_000_000_000.0).to_utc().unwrap();
        let iso = NativeTime::Text("2023-11-14T22:13:20.000Z".into()).to_utc().unwrap();
        assert_eq!(epoch, iso);
    }

    #[test]
    fn unreadable_text_is_none() {
        assert!(NativeTime::Text("yesterday".into()).to_utc().is_none());
    }

    #[test]
    fn started_before_saturates() {
        let end = NativeTime::Millis(1_000.0).to_utc().unwrap();
        assert_eq!((end - started_before(end, 250)).num_milliseconds(), 250);
        assert_eq!(started_before(end, u64::MAX), end);
    }

    #[test]
    fn millis_rounds_and_clamps() {
        assert_eq!(millis(Some(4.6)), 5);
        assert_eq!(millis(Some(-3.0)), 0);
        assert_eq!(millis(Some(f64::NAN)), 0);
        assert_eq!(millis(None), 0);
    }
}
