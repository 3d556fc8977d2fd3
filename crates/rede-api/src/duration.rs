//! Duration strings as stored in the `login.tempoexpiracao` config value:
//! a sequence of decimal numbers with an optional fraction and a unit suffix,
//! e.g. `40m`, `1h30m`, `1.5h`, `300ms`. Valid units are `ns`, `us` (or
//! `µs`), `ms`, `s`, `m` and `h`.

use chrono::TimeDelta;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Fallback applied when the stored TTL is missing or unusable.
pub const DEFAULT_TTL: TimeDelta = TimeDelta::minutes(40);

/// Parses a duration string. Returns `None` for anything malformed.
pub fn parse(input: &str) -> Option<TimeDelta> {
    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    if rest == "0" {
        return Some(TimeDelta::zero());
    }
    if rest.is_empty() {
        return None;
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, after) = rest.split_at(int_len);
        rest = after;

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
            frac_part = &after_dot[..frac_len];
            rest = &after_dot[frac_len..];
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }

        let unit_len = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (unit, after) = rest.split_at(unit_len);
        rest = after;
        let scale = unit_scale(unit)?;

        let whole: i128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().ok()?
        };
        total = total.checked_add(whole.checked_mul(scale)?)?;

        if !frac_part.is_empty() {
            let digits = &frac_part[..frac_part.len().min(18)];
            let frac: i128 = digits.parse().ok()?;
            total = total.checked_add(frac * scale / 10_i128.pow(digits.len() as u32))?;
        }
    }

    if negative {
        total = -total;
    }
    let nanos = i64::try_from(total).ok()?;
    Some(TimeDelta::nanoseconds(nanos))
}

fn unit_scale(unit: &str) -> Option<i128> {
    let scale = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        _ => return None,
    };
    Some(scale)
}

/// Session lifetime from a config value. Malformed, zero or negative values
/// fall back to [`DEFAULT_TTL`].
pub fn session_ttl(raw: &str) -> TimeDelta {
    match parse(raw.trim()) {
        Some(ttl) if ttl > TimeDelta::zero() => ttl,
        _ => {
            tracing::warn!(value = raw, "Unusable session TTL, using default");
            DEFAULT_TTL
        }
    }
}
