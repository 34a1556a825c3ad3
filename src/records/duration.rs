//! ISO 8601 duration parsing for the `time_spent` field.
//!
//! Accepts the designator forms that make sense for logged practice time:
//! `PnW`, `PnD`, `PTnHnMnS` and combinations like `P1DT2H30M`. A fraction is
//! allowed in any component (`PT0.5H`). Calendar-ambiguous designators
//! (years, months) are rejected, as are signs and lowercase designators.

use chrono::Duration;

const SECS_PER_WEEK: f64 = 604_800.0;
const SECS_PER_DAY: f64 = 86_400.0;

/// Parse an ISO 8601 duration. `None` on any malformed input; a successfully
/// parsed zero duration (`P0D`, `PT0S`) is returned as zero and left to the
/// caller to reject.
pub fn parse(input: &str) -> Option<Duration> {
    let rest = input.strip_prefix('P')?;
    if rest.is_empty() {
        return None;
    }

    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };
    // "PT" with nothing after the T is malformed
    if time_part.is_some_and(str::is_empty) {
        return None;
    }

    let mut seconds = 0.0;
    if !date_part.is_empty() {
        if date_part.ends_with('W') {
            // weeks cannot be combined with other designators
            seconds += scan(date_part, &[('W', SECS_PER_WEEK)])?;
            if time_part.is_some() {
                return None;
            }
        } else {
            seconds += scan(date_part, &[('D', SECS_PER_DAY)])?;
        }
    }
    if let Some(time) = time_part {
        seconds += scan(time, &[('H', 3600.0), ('M', 60.0), ('S', 1.0)])?;
    }

    if !seconds.is_finite() {
        return None;
    }
    Some(Duration::milliseconds((seconds * 1000.0).round() as i64))
}

/// Scan `part` as a sequence of number+designator pairs. Designators must
/// appear in the order given, each at most once.
fn scan(part: &str, units: &[(char, f64)]) -> Option<f64> {
    let mut total = 0.0;
    let mut rest = part;
    let mut next_unit = 0;
    while !rest.is_empty() {
        let digits_end = rest.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
        if digits_end == 0 {
            return None;
        }
        let value: f64 = rest[..digits_end].parse().ok()?;
        let designator = rest[digits_end..].chars().next()?;
        let position = units[next_unit..]
            .iter()
            .position(|(unit, _)| *unit == designator)?
            + next_unit;
        total += value * units[position].1;
        next_unit = position + 1;
        rest = &rest[digits_end + designator.len_utf8()..];
    }
    Some(total)
}
