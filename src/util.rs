use std::time::SystemTime;

/// The current time, formatted for the RPL_CREATED reply.
pub fn time_str() -> String {
    humantime::format_rfc3339_seconds(SystemTime::now()).to_string()
}

/// Lowercase version of a nickname or channel name, used as key in the server directories.
///
/// Names are compared with the `ascii` casemapping: only ASCII letters are folded.
pub fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Whether `s` can be used as a nickname.
///
/// <https://tools.ietf.org/html/rfc2812.html#section-2.3.1>
pub fn is_valid_nickname(s: &str, max_len: usize) -> bool {
    let bytes = s.as_bytes();
    let is_valid_nickname_char = |&c: &u8| {
        c.is_ascii_alphanumeric()
            // "[", "]", "\", "`", "_", "^", "{", "|", "}"
            || (0x5b <= c && c <= 0x60)
            || (0x7b <= c && c <= 0x7d)
            || c == b'-'
    };
    !bytes.is_empty()
        && bytes.len() <= max_len
        && bytes.iter().all(is_valid_nickname_char)
        && bytes[0] != b'-'
        && !bytes[0].is_ascii_digit()
}

/// Whether `s` can be used as a channel name.
///
/// <https://tools.ietf.org/html/rfc2811.html#section-2.1>
pub fn is_valid_channel_name(s: &str, max_len: usize) -> bool {
    let ctrl_g = 7 as char;
    s.starts_with('#')
        && 1 < s.len()
        && s.len() <= max_len
        && s.chars().all(|c| c != ' ' && c != ',' && c != ctrl_g)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nickname_validation() {
        assert!(is_valid_nickname("alice", 9));
        assert!(is_valid_nickname("[ab]-c`", 9));
        assert!(is_valid_nickname("Q", 9));
        assert!(!is_valid_nickname("", 9));
        assert!(!is_valid_nickname("9lives", 9));
        assert!(!is_valid_nickname("-dash", 9));
        assert!(!is_valid_nickname("way_too_long", 9));
        assert!(!is_valid_nickname("a.b", 9));
        assert!(!is_valid_nickname("#chan", 9));
    }

    #[test]
    fn test_channel_name_validation() {
        assert!(is_valid_channel_name("#rust", 50));
        assert!(is_valid_channel_name("#été", 50));
        assert!(!is_valid_channel_name("#", 50));
        assert!(!is_valid_channel_name("rust", 50));
        assert!(!is_valid_channel_name("#a,b", 50));
        assert!(!is_valid_channel_name("#a\u{7}b", 50));
        assert!(!is_valid_channel_name(&format!("#{}", "x".repeat(50)), 50));
    }

    #[test]
    fn test_key_folds_ascii_only() {
        assert_eq!(key("Alice"), "alice");
        assert_eq!(key("#Rust"), "#rust");
        assert_eq!(key("ÉTÉ"), "ÉtÉ");
    }
}
