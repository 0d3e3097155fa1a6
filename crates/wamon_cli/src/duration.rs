//! Parsing for `--since` windows such as `24h`, `90m` or `1h30m`.

use chrono::Duration;
use once_cell::sync::Lazy;
use regex::Regex;

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:\d+(?:\.\d*)?|\.\d+)(?:ns|us|µs|ms|s|m|h))+$")
        .expect("valid duration regex")
});
static SEGMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|ms|s|m|h)").expect("valid segment regex")
});

/// Parses a Go-style duration string into a non-negative `Duration`.
///
/// A bare `0` is accepted; every other value needs a unit per number.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let value = input.trim();
    if value == "0" {
        return Ok(Duration::zero());
    }
    if value.is_empty() {
        return Err("duration cannot be empty".to_string());
    }

    if !DURATION_RE.is_match(value) {
        return Err(format!(
            "invalid duration `{value}`; expected forms like 24h, 90m, 1h30m"
        ));
    }

    let mut total_nanos = 0f64;
    for captures in SEGMENT_RE.captures_iter(value) {
        let amount: f64 = captures[1]
            .parse()
            .map_err(|_| format!("invalid number in duration `{value}`"))?;
        total_nanos += amount * unit_nanos(&captures[2]);
    }

    if !total_nanos.is_finite() || total_nanos > i64::MAX as f64 {
        return Err(format!("duration `{value}` is too large"));
    }
    Ok(Duration::nanoseconds(total_nanos.round() as i64))
}

fn unit_nanos(unit: &str) -> f64 {
    match unit {
        "ns" => 1.0,
        "us" | "µs" => 1e3,
        "ms" => 1e6,
        "s" => 1e9,
        "m" => 60.0 * 1e9,
        _ => 3600.0 * 1e9,
    }
}
