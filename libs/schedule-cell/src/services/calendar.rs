use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::ScheduleError;

const GAP_PROBE_MINUTES: i64 = 15;
const GAP_PROBE_LIMIT: i64 = 4 * 60;

pub fn parse_hour(field: &str, value: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ScheduleError::Validation(format!("{} must be HH:mm, got '{}'", field, value)))
}

/// Resolves a local wall-clock time to a UTC instant.
///
/// Ambiguous times take the earliest instant. Times inside a DST gap move
/// forward to the first local time that exists.
pub fn local_instant(tz: Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    let wanted = date.and_time(time);

    let mut probe = Duration::zero();
    while probe <= Duration::minutes(GAP_PROBE_LIMIT) {
        let Some(shifted) = wanted.checked_add_signed(probe) else {
            break;
        };
        if let Some(resolved) = tz.from_local_datetime(&shifted).earliest() {
            if !probe.is_zero() {
                warn!("Local time {} does not exist in {}, using {}", wanted, tz, shifted);
            }
            return resolved.with_timezone(&Utc);
        }
        probe += Duration::minutes(GAP_PROBE_MINUTES);
    }

    warn!("Could not resolve {} in {}, treating it as UTC", wanted, tz);
    Utc.from_utc_datetime(&wanted)
}

pub fn day_start(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    local_instant(tz, date, NaiveTime::MIN)
}

/// `[start of date, start of the following day)` in the clinic zone.
pub fn day_bounds(tz: Tz, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let next = date.succ_opt().unwrap_or(date);
    (day_start(tz, date), day_start(tz, next))
}

pub fn local_date(tz: Tz, instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}
