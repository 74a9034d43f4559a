//! Lenient number parsing and fixed-point formatting for attribute and
//! readout text.

/// Parses the longest numeric prefix of `text`, so `"12px"` yields `12.0`.
/// Leading whitespace is skipped. Returns `None` when there is no prefix.
pub fn parse_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    if text[end..].starts_with("Infinity") {
        return text[..end + "Infinity".len()]
            .replace("Infinity", "inf")
            .parse()
            .ok();
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    text[..end].parse().ok()
}

/// Integer counterpart of [`parse_float`]; fractions are truncated.
pub fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digits = count_digits(&bytes[sign..]);
    if digits == 0 {
        return None;
    }
    text[..sign + digits].parse().ok()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Most fraction digits [`to_fixed`] writes. Larger requests are clamped.
pub const MAX_FRACTION_DIGITS: usize = 100;

/// Fraction digits needed to write any finite `f64` exactly.
const EXACT_FRACTION_DIGITS: usize = 1074;

/// Formats `value` with `digits` fraction digits, at most
/// [`MAX_FRACTION_DIGITS`]. The result is the nearest decimal to the stored
/// binary value. Only values that sit exactly halfway round away from zero
/// (`2.5` → `"3"`), so `0.15` stays `"0.1"` because it is stored just below.
pub fn to_fixed(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let digits = digits.min(MAX_FRACTION_DIGITS);
    let magnitude = value.abs();
    let exact = format!("{:.*}", EXACT_FRACTION_DIGITS, magnitude);

    let body = match exact.split_once('.') {
        Some((int, fraction)) if is_half(&fraction[digits..]) => {
            let truncated = if digits == 0 {
                int.to_string()
            } else {
                format!("{int}.{}", &fraction[..digits])
            };
            increment_last_digit(&truncated)
        }
        _ => format!("{:.*}", digits, magnitude),
    };

    if value < 0.0 {
        format!("-{body}")
    } else {
        body
    }
}

/// True when the dropped digits are exactly one half of the last kept place.
fn is_half(dropped: &str) -> bool {
    dropped
        .strip_prefix('5')
        .is_some_and(|rest| rest.bytes().all(|b| b == b'0'))
}

fn increment_last_digit(fixed: &str) -> String {
    let mut chars: Vec<char> = fixed.chars().collect();
    let mut carry = true;
    for c in chars.iter_mut().rev() {
        match *c {
            '.' => {}
            '9' => *c = '0',
            d => {
                *c = char::from(d as u8 + 1);
                carry = false;
                break;
            }
        }
    }

    let mut out = String::with_capacity(chars.len() + 1);
    if carry {
        out.push('1');
    }
    out.extend(chars);
    out
}
