use thiserror::Error;

/// Record amounts are integer cents, so ₹12.34 is stored as 1234.
pub type Cents = i64;

/// Largest amount a single record may carry (100 billion currency units).
/// Keeps sums over any realistic number of records far from `Cents::MAX`.
pub const MAX_AMOUNT_CENTS: Cents = 10_000_000_000_000;

/// Render cents with exactly two decimals: 1234 -> "12.34", -5 -> "-0.05".
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Render a fractional balance (in currency units) to two decimals.
/// Values that round to zero never print as "-0.00".
pub fn format_units(units: f64) -> String {
    let rounded = (units * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0.00".to_string();
    }
    format!("{:.2}", rounded)
}

pub fn cents_to_units(cents: Cents) -> f64 {
    cents as f64 / 100.0
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCentsError {
    #[error("invalid money format: '{0}'")]
    InvalidFormat(String),
}

/// Parse decimal text into cents. Digits past the second decimal are dropped.
/// "50" -> 5000, "12.5" -> 1250, ".75" -> 75
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let trimmed = input.trim();
    let invalid = || ParseCentsError::InvalidFormat(input.to_string());

    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (digits, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) {
        return Err(invalid());
    }

    let units: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };

    let mut fraction: String = fraction.chars().take(2).collect();
    while fraction.len() < 2 {
        fraction.push('0');
    }
    let sub: i64 = fraction.parse().map_err(|_| invalid())?;

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(sub))
        .ok_or_else(invalid)?;
    Ok(if negative { -cents } else { cents })
}
