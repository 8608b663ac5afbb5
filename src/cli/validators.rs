//! CLI argument validators.

use crate::constants::MAX_JOBS;

/// Parse a duration in seconds.
///
/// Accepts plain seconds (`1780`, `90.5`) or unit-suffixed parts in any
/// combination of `h`, `m` and `s` (`29m40s`, `1h`, `1h2m3.5s`).
pub fn parse_duration(s: &str) -> Result<f64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("duration must not be empty".to_string());
    }

    let seconds = if let Ok(value) = s.parse::<f64>() {
        value
    } else {
        parse_suffixed(s)?
    };

    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(format!("duration must be positive, got '{s}'"));
    }
    Ok(seconds)
}

fn parse_suffixed(s: &str) -> Result<f64, String> {
    let mut total = 0.0;
    let mut number = String::new();

    for c in s.chars() {
        if c.is_ascii_digit() || c == '.' {
            number.push(c);
            continue;
        }

        let scale = match c.to_ascii_lowercase() {
            'h' => 3600.0,
            'm' => 60.0,
            's' => 1.0,
            _ => return Err(format!("'{s}' is not a valid duration (unexpected '{c}')")),
        };
        let value: f64 = number
            .parse()
            .map_err(|_| format!("'{s}' is not a valid duration"))?;
        total += value * scale;
        number.clear();
    }

    if !number.is_empty() {
        return Err(format!("'{s}' is missing a unit after '{number}'"));
    }
    Ok(total)
}

/// Parse a worker count in `1..=MAX_JOBS`.
pub fn parse_jobs(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(1..=MAX_JOBS).contains(&value) {
        return Err(format!("jobs must be between 1 and {MAX_JOBS}, got {value}"));
    }

    Ok(value)
}
