use chrono::{DateTime, SecondsFormat, Utc};

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current UTC time as an ISO-8601 string with millisecond precision
/// (`2026-10-19T08:30:00.000Z`).
pub fn now_iso() -> String {
    to_iso(Utc::now())
}

/// Format a UTC instant the way every stored timestamp is formatted.
pub fn to_iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored ISO-8601 timestamp. Offsets other than `Z` are normalized to UTC.
pub fn parse_iso(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random suffix appended to every generated id.
const ID_SUFFIX_LEN: usize = 8;

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Generate an opaque record id: base-36 millisecond timestamp followed by a
/// random base-36 suffix.
///
/// Ids sort roughly by creation time but callers must not rely on it.
pub fn generate_id() -> String {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let mut id = to_base36(now_millis().max(0) as u64);
    for _ in 0..ID_SUFFIX_LEN {
        id.push(BASE36[rng.gen_range(0..BASE36.len())] as char);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn test_generate_id_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| id.chars().all(|c| c.is_ascii_alphanumeric())));
    }

    #[test]
    fn test_iso_round_trip() {
        let now = now_iso();
        assert!(now.ends_with('Z'));
        let parsed = parse_iso(&now).unwrap();
        assert_eq!(to_iso(parsed), now);
    }

    #[test]
    fn test_parse_iso_rejects_garbage() {
        assert!(parse_iso("yesterday").is_none());
    }
}
