//! Shared utilities

/// Truncate a string to `max` characters, appending "..." if truncated.
/// Operates on Unicode char boundaries, not bytes.
pub fn truncate_chars(s: &str, max: usize) -> String {
    let mut chars = s.chars();
    let truncated: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

/// What to print when cumulative streamed text changes from `printed` to `current`.
///
/// Normally the new text extends the old one and only the suffix is printed.
/// If the backend rewrote earlier text, the whole new text is returned and
/// `restart` is set so the caller can start a fresh line.
pub fn streaming_delta<'a>(printed: &str, current: &'a str) -> (bool, &'a str) {
    match current.strip_prefix(printed) {
        Some(suffix) => (false, suffix),
        None => (true, current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn test_streaming_delta_extends() {
        assert_eq!(streaming_delta("Hel", "Hello"), (false, "lo"));
        assert_eq!(streaming_delta("", "Hi"), (false, "Hi"));
        assert_eq!(streaming_delta("Hi", "Hi"), (false, ""));
    }

    #[test]
    fn test_streaming_delta_rewrite() {
        assert_eq!(streaming_delta("Hello", "Help"), (true, "Help"));
    }
}
