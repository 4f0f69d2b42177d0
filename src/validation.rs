//! Input syntax checks. All predicates are pure; callers turn `false` into
//! a field-level error message.

use lazy_static::lazy_static;
use regex::Regex;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const THEMES: [&str; 3] = ["light", "dark", "system"];
pub const PUSH_CHANNELS: [&str; 3] = ["wechat", "qywechat", "none"];

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[a-zA-Z0-9_\x{4e00}-\x{9fa5}]{2,20}$").unwrap();
    static ref TIME_RE: Regex = Regex::new(r"^([01]?[0-9]|2[0-3]):[0-5][0-9]$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^1[3-9][0-9]{9}$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// 2-20 characters drawn from ASCII letters, digits, underscore and CJK ideographs.
pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

/// Length is counted in UTF-16 code units, the unit browsers count in, so a
/// client-side check and this one agree on the same input.
pub fn is_valid_password(password: &str) -> bool {
    password.encode_utf16().count() >= MIN_PASSWORD_LEN
}

/// `HH:MM`, hour 0-23 (leading zero optional), minute 00-59.
pub fn is_valid_time_format(time: &str) -> bool {
    TIME_RE.is_match(time)
}

/// Mainland China mobile number.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn is_valid_theme(theme: &str) -> bool {
    THEMES.contains(&theme)
}

pub fn is_valid_push_channel(channel: &str) -> bool {
    PUSH_CHANNELS.contains(&channel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        for ok in ["a@b.com", "first.last@sub.example.org", "x+tag@d.io"] {
            assert!(is_valid_email(ok), "{ok} should be valid");
        }
        for bad in ["", "plain", "no-at.example.com", "a@nodot", "a b@c.com", "@b.com", "a@b."] {
            assert!(!is_valid_email(bad), "{bad} should be invalid");
        }
    }

    #[test]
    fn username_rules() {
        assert!(is_valid_username("ab"));
        assert!(!is_valid_username("a"));
        assert!(is_valid_username("用户名"));
        assert!(is_valid_username("alice_01"));
        assert!(is_valid_username(&"a".repeat(20)));
        assert!(!is_valid_username(&"a".repeat(21)));
        assert!(!is_valid_username("al ice"));
        assert!(!is_valid_username("alice!"));
    }

    #[test]
    fn password_length() {
        assert!(!is_valid_password("12345"));
        assert!(is_valid_password("123456"));
        assert!(!is_valid_password(""));
        // astral-plane characters are two units each
        assert!(is_valid_password("😀😀😀"));
        assert!(!is_valid_password("😀😀"));
        assert!(!is_valid_password("密码密码密"));
        assert!(is_valid_password("密码密码密码"));
    }

    #[test]
    fn time_format() {
        for ok in ["00:00", "9:05", "09:05", "23:59", "19:30"] {
            assert!(is_valid_time_format(ok), "{ok} should be valid");
        }
        for bad in ["24:00", "12:60", "1230", "12:5", "ab:cd", ""] {
            assert!(!is_valid_time_format(bad), "{bad} should be invalid");
        }
    }

    #[test]
    fn phone_theme_channel() {
        assert!(is_valid_phone("13812345678"));
        assert!(!is_valid_phone("12812345678"));
        assert!(!is_valid_phone("1381234567"));
        assert!(is_valid_theme("dark"));
        assert!(!is_valid_theme("blue"));
        assert!(is_valid_push_channel("qywechat"));
        assert!(!is_valid_push_channel("email"));
    }
}
