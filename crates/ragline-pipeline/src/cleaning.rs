//! Question normalisation and validation.

/// Punctuation and symbols kept by [`clean_question`], besides ASCII letters,
/// digits and whitespace.
const ALLOWED_SYMBOLS: &str = ".,?!-'\"()[]{}:;@#$£%&*+/\\=_~`|<>";

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace() || ALLOWED_SYMBOLS.contains(c)
}

/// Strip disallowed characters, collapse whitespace runs to one space, trim,
/// and cut to at most `max_chars` characters. Idempotent.
pub fn clean_question(raw: &str, max_chars: usize) -> String {
    let filtered: String = raw.chars().filter(|&c| is_allowed(c)).collect();
    let collapsed = filtered.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(max_chars).collect();
    // A cut can land right after a space.
    truncated.trim_end().to_string()
}

/// A cleaned question is answerable when it has at least `min_chars` characters.
pub fn is_valid_question(cleaned: &str, min_chars: usize) -> bool {
    !cleaned.is_empty() && cleaned.chars().count() >= min_chars.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 180;

    #[test]
    fn strips_and_collapses() {
        assert_eq!(clean_question("  What's   the\tbattery\n life? 🔋 ", MAX), "What's the battery life?");
        assert_eq!(clean_question("price in £ & $?", MAX), "price in £ & $?");
        assert_eq!(clean_question("café ☕", MAX), "caf");
    }

    #[test]
    fn truncates_to_limit() {
        let long = "a".repeat(500);
        assert_eq!(clean_question(&long, MAX).chars().count(), 180);
        let spaced = format!("{} tail", "b".repeat(179));
        assert_eq!(clean_question(&spaced, MAX), "b".repeat(179));
    }

    #[test]
    fn idempotent_and_never_longer() {
        let near_limit = format!("{}  {}", "x".repeat(179), "y".repeat(20));
        let repeated = "word ".repeat(100);
        let inputs = [
            "",
            "   ",
            "hello",
            "Hello,   WORLD!!  ",
            "\u{00a0}non\u{2003}breaking\u{00a0}",
            "emoji 😀 and ünïcödé",
            "<script>alert('x')</script>",
            near_limit.as_str(),
            repeated.as_str(),
        ];
        for input in inputs {
            let once = clean_question(input, MAX);
            assert_eq!(clean_question(&once, MAX), once, "input {input:?}");
            assert!(once.chars().count() <= MAX);
            assert!(once.chars().count() <= input.chars().count());
        }
    }

    #[test]
    fn validation_thresholds() {
        assert!(!is_valid_question("", 2));
        assert!(!is_valid_question("a", 2));
        assert!(is_valid_question("ab", 2));
        assert!(is_valid_question("why?", 2));
    }
}
