//! Retry-After parsing and backoff/jitter math, split out for unit testing
//! without needing a live HTTP call.

use std::time::Duration;

use rand::Rng;

/// Parses an RFC 7231 `Retry-After` header value: either an integer number
/// of seconds, or an HTTP-date. Returns `None` for anything invalid, past,
/// or non-positive. The result is clamped to `max`.
pub fn parse_retry_after(value: Option<&str>, max: Duration) -> Option<Duration> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(seconds) = value.parse::<f64>() {
        if seconds > 0.0 {
            return Some(clamp(Duration::from_secs_f64(seconds), max));
        }
        return None;
    }

    let parsed = httpdate::parse_http_date(value).ok()?;
    let now = std::time::SystemTime::now();
    let delta = parsed.duration_since(now).ok()?;
    if delta.is_zero() {
        return None;
    }
    Some(clamp(delta, max))
}

fn clamp(d: Duration, max: Duration) -> Duration {
    if d > max {
        max
    } else {
        d
    }
}

/// Exponential backoff: `base * 2^(attempt-1)`, capped at `max`. `attempt`
/// is 1-indexed (the delay before the *second* attempt uses `attempt=1`).
pub fn exponential_backoff(base: Duration, attempt: u32, max: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    let scaled = base.saturating_mul(factor);
    if scaled > max {
        max
    } else {
        scaled
    }
}

/// Adds jitter up to `min(configured_jitter, base * 0.5)`, matching the
/// "thundering herd" mitigation in the original retry loop.
pub fn with_jitter(base: Duration, configured_jitter: Duration) -> Duration {
    let cap = configured_jitter.min(base.mul_f64(0.5));
    if cap.is_zero() {
        return base;
    }
    let jitter = rand::thread_rng().gen_range(0.0..=cap.as_secs_f64());
    base + Duration::from_secs_f64(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_seconds_within_max_is_used_verbatim() {
        let d = parse_retry_after(Some("3"), Duration::from_secs(60)).unwrap();
        assert_eq!(d, Duration::from_secs(3));
    }

    #[test]
    fn retry_after_beyond_max_is_clamped() {
        let d = parse_retry_after(Some("120"), Duration::from_secs(60)).unwrap();
        assert_eq!(d, Duration::from_secs(60));
    }

    #[test]
    fn retry_after_zero_or_negative_is_none() {
        assert!(parse_retry_after(Some("0"), Duration::from_secs(60)).is_none());
        assert!(parse_retry_after(Some("-5"), Duration::from_secs(60)).is_none());
    }

    #[test]
    fn retry_after_missing_or_garbage_is_none() {
        assert!(parse_retry_after(None, Duration::from_secs(60)).is_none());
        assert!(parse_retry_after(Some("not-a-date"), Duration::from_secs(60)).is_none());
    }

    #[test]
    fn exponential_backoff_doubles_then_caps() {
        let base = Duration::from_secs(1);
        let max = Duration::from_secs(10);
        assert_eq!(exponential_backoff(base, 1, max), Duration::from_secs(1));
        assert_eq!(exponential_backoff(base, 2, max), Duration::from_secs(2));
        assert_eq!(exponential_backoff(base, 3, max), Duration::from_secs(4));
        assert_eq!(exponential_backoff(base, 10, max), max);
    }

    #[test]
    fn jitter_never_exceeds_configured_cap_or_half_base() {
        let base = Duration::from_secs(4);
        let configured = Duration::from_secs(10);
        for _ in 0..100 {
            let d = with_jitter(base, configured);
            assert!(d >= base);
            assert!(d <= base + base.mul_f64(0.5));
        }
    }
}
