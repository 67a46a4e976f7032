//! Password markers
//!
//! Passwords are not hashed. A stored marker is either the plain password
//! itself (fixture style) or `hashed_<password>_<base36 millis>`; the suffix
//! only makes markers differ between accounts sharing a password.

use chrono::Utc;

const MARKER_PREFIX: &str = "hashed_";

/// Build a marker for the given password
pub fn mark_password(password: &str) -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    format!("{MARKER_PREFIX}{password}_{}", to_base36(millis))
}

/// Check a password against a stored marker
pub fn verify_password(password: &str, marker: &str) -> bool {
    if password.is_empty() {
        return false;
    }
    if marker == password {
        return true;
    }

    marker
        .strip_prefix(MARKER_PREFIX)
        .and_then(|rest| rest.rsplit_once('_'))
        .map(|(stored, suffix)| {
            stored == password
                && !suffix.is_empty()
                && suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        })
        .unwrap_or(false)
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_round_trip() {
        let marker = mark_password("test123");
        assert!(marker.starts_with("hashed_test123_"));
        assert!(verify_password("test123", &marker));
        assert!(!verify_password("test12", &marker));
        assert!(!verify_password("wrong", &marker));
    }

    #[test]
    fn test_plain_marker() {
        assert!(verify_password("admin123", "admin123"));
        assert!(!verify_password("admin", "admin123"));
    }

    #[test]
    fn test_password_with_underscore() {
        let marker = mark_password("my_pass");
        assert!(verify_password("my_pass", &marker));
        assert!(!verify_password("my", &marker));
    }

    #[test]
    fn test_empty_password_never_matches() {
        assert!(!verify_password("", ""));
        assert!(!verify_password("", &mark_password("")));
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
