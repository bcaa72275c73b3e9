//! Locale-tolerant numeric parsing and small statistics helpers.

/// Parse a human-formatted number as scraped from the page.
///
/// The viewer renders values with locale-dependent separators and various
/// Unicode spaces. Policy: strip whitespace variants, keep only digits,
/// signs, commas and dots; if both comma and dot occur the commas are
/// thousands separators; a lone comma is the decimal separator. Returns
/// `None` unless the result is finite.
pub fn parse_locale_number(raw: &str) -> Option<f64> {
    let mut s: String = raw
        .chars()
        .filter(|c| {
            !c.is_whitespace()
                && !matches!(
                    c,
                    '\u{00A0}' | '\u{202F}' | '\u{2007}' | '\u{2009}' | '\u{200A}' | '\u{2060}'
                )
        })
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ',' | '.'))
        .collect();

    let has_dot = s.contains('.');
    let has_comma = s.contains(',');

    if has_dot && has_comma {
        // e.g. "2,209.9" → drop commas
        s.retain(|c| c != ',');
    } else if has_comma {
        // e.g. "2209,9" → comma is the decimal separator
        s = s.replace(',', ".");
    }

    match s.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(n),
        _ => None,
    }
}

/// Arithmetic mean; 0 for an empty slice.
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Linear-interpolated quantile at fraction `p` over the ascending sort.
///
/// Index is `p * (n-1)`; the value is interpolated between the floor and
/// ceiling neighbors by the fractional part. Returns NaN for empty input.
pub fn quantile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);

    let idx = (v.len() - 1) as f64 * p;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        return v[lo];
    }
    let h = idx - lo as f64;
    v[lo] * (1.0 - h) + v[hi] * h
}

/// Median via [`quantile`] at 0.5.
pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

/// Min-max normalize into `[0, 1]`.
///
/// Degenerate vectors (all values identical, or non-finite bounds) map
/// every value to 1.0 so a fully-uniform metric penalizes nobody.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if !min.is_finite() || !max.is_finite() || max == min {
        return vec![1.0; values.len()];
    }
    values.iter().map(|v| (v - min) / (max - min)).collect()
}

/// Flip a normalized vector when lower source values are better.
///
/// Popularity is never passed through this.
pub fn orient(normalized: &[f64], lower_is_better: bool) -> Vec<f64> {
    if lower_is_better {
        normalized.iter().map(|v| 1.0 - v).collect()
    } else {
        normalized.to_vec()
    }
}
