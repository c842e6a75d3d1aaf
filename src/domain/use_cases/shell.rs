//! POSIX shell quoting for commands sent to the router.

/// Wrap `s` in single quotes, escaping internal `'` as `'\''`.
///
/// # Examples
///
/// ```
/// use xkeen_domains::domain::use_cases::shell;
///
/// assert_eq!(shell::escape("hello"), "'hello'");
/// assert_eq!(shell::escape("it's"), "'it'\\''s'");
/// ```
#[must_use]
pub fn escape(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}
