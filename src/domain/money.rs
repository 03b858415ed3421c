use thiserror::Error;

/// Money is represented as integer cents to avoid floating-point drift in sums.
/// $50.00 is stored as 5000.
pub type Cents = i64;

/// Largest magnitude accepted from user input (ten trillion units).
pub const MAX_ABS_CENTS: Cents = 1_000_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("invalid money format: {0:?}")]
    InvalidFormat(String),

    #[error("amount is not a finite number")]
    NotFinite,

    #[error("amount is out of range")]
    OutOfRange,
}

/// Format cents as a plain decimal string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
}

/// Format cents for display with a currency sign in front of the digits.
/// Example: 5000 -> "$50.00", -1234 -> "-$12.34"
pub fn format_currency(cents: Cents) -> String {
    let plain = format_cents(cents);
    match plain.strip_prefix('-') {
        Some(digits) => format!("-${}", digits),
        None => format!("${}", plain),
    }
}

/// Parse decimal text into cents.
///
/// Accepts an optional leading `-`, an optional `$`, whole units and up to
/// two fractional digits; further digits are truncated.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "$100" -> 10000
pub fn parse_cents(input: &str) -> Result<Cents, MoneyError> {
    let invalid = || MoneyError::InvalidFormat(input.to_string());

    let trimmed = input.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let rest = rest.strip_prefix('$').unwrap_or(rest);

    let (units_str, fraction_str) = match rest.split_once('.') {
        Some((units, fraction)) => (units, fraction),
        None => (rest, ""),
    };

    if units_str.is_empty() && fraction_str.is_empty() {
        return Err(invalid());
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(units_str) || !all_digits(fraction_str) {
        return Err(invalid());
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| MoneyError::OutOfRange)?
    };

    let fraction: i64 = match fraction_str.len() {
        0 => 0,
        // "5" means fifty cents
        1 => fraction_str.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => fraction_str[..2].parse().map_err(|_| invalid())?,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction))
        .filter(|c| *c <= MAX_ABS_CENTS)
        .ok_or(MoneyError::OutOfRange)?;

    Ok(if negative { -cents } else { cents })
}

/// Convert a floating-point amount, as handed over by an input layer, into
/// cents rounded to the nearest cent.
pub fn cents_from_f64(amount: f64) -> Result<Cents, MoneyError> {
    if !amount.is_finite() {
        return Err(MoneyError::NotFinite);
    }
    let scaled = (amount * 100.0).round();
    if scaled.abs() > MAX_ABS_CENTS as f64 {
        return Err(MoneyError::OutOfRange);
    }
    Ok(scaled as Cents)
}

/// Inverse of [`cents_from_f64`], exact for every two-decimal amount in range.
pub fn cents_to_f64(cents: Cents) -> f64 {
    cents as f64 / 100.0
}
