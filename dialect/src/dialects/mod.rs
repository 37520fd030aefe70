//! The five engine tables and the helpers they share

pub mod generic;
pub mod mssql;
pub mod oracle;
pub mod postgres;
pub mod sqlite;

use chrono::{NaiveDateTime, TimeDelta};
use polydb_core::Value;

use crate::format::hex;

pub(crate) fn keep(value: Value) -> Value {
    value
}

/// `X'0A1B'`
pub(crate) fn hex_literal(bytes: &[u8]) -> String {
    format!("X'{}'", hex(bytes))
}

/// `'2024-05-01 13:45:00.250'`
pub(crate) fn quoted_datetime(value: &NaiveDateTime) -> String {
    format!("'{}'", value.format("%Y-%m-%d %H:%M:%S%.f"))
}

/// Split a duration into sign, days, hours, minutes, seconds, microseconds
pub(crate) fn duration_parts(value: &TimeDelta) -> (bool, i64, i64, i64, i64, i64) {
    let negative = *value < TimeDelta::zero();
    let value = value.abs();
    let seconds = value.num_seconds();
    let micros = i64::from(value.subsec_nanos()) / 1_000;
    (
        negative,
        seconds / 86_400,
        seconds % 86_400 / 3_600,
        seconds % 3_600 / 60,
        seconds % 60,
        micros,
    )
}

/// `INTERVAL '1 02:03:04.000005' DAY TO SECOND`
pub(crate) fn day_to_second_literal(value: &TimeDelta) -> Option<String> {
    let (negative, days, hours, minutes, seconds, micros) = duration_parts(value);
    Some(format!(
        "INTERVAL '{}{} {:02}:{:02}:{:02}.{:06}' DAY TO SECOND",
        if negative { "-" } else { "" },
        days,
        hours,
        minutes,
        seconds,
        micros
    ))
}

/// Total microseconds, saturating on overflow
pub(crate) fn total_micros(value: &TimeDelta) -> i64 {
    value.num_microseconds().unwrap_or(if *value < TimeDelta::zero() {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// `key=value` pair for semicolon-separated connection strings
pub(crate) fn pair(out: &mut Vec<String>, key: &str, value: impl std::fmt::Display) {
    out.push(format!("{key}={value}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_to_second() {
        let span = TimeDelta::days(1)
            + TimeDelta::hours(2)
            + TimeDelta::minutes(3)
            + TimeDelta::seconds(4)
            + TimeDelta::microseconds(5);
        assert_eq!(
            day_to_second_literal(&span).as_deref(),
            Some("INTERVAL '1 02:03:04.000005' DAY TO SECOND")
        );
        assert_eq!(
            day_to_second_literal(&-TimeDelta::minutes(90)).as_deref(),
            Some("INTERVAL '-0 01:30:00.000000' DAY TO SECOND")
        );
    }

    #[test]
    fn test_quoted_datetime_fraction() {
        let dt = NaiveDateTime::parse_from_str("2024-05-01 13:45:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        assert_eq!(quoted_datetime(&dt), "'2024-05-01 13:45:00'");
    }
}
