//! Label measurement and word wrapping.

/// Measures rendered text width.
///
/// Implemented by drawing surfaces; [`ApproxTextMeasure`] is a headless
/// fallback.
pub trait TextMeasure {
    /// Width of `text` at `font_size`, in world units.
    fn measure_text(&self, text: &str, font_size: f64) -> f64;
}

/// Fixed-advance estimate: every char is `advance * font_size` wide.
#[derive(Debug, Clone, Copy)]
pub struct ApproxTextMeasure {
    pub advance: f64,
}

impl Default for ApproxTextMeasure {
    fn default() -> Self {
        Self { advance: 0.6 }
    }
}

impl TextMeasure for ApproxTextMeasure {
    fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * self.advance
    }
}

/// Greedy word wrap.
///
/// Explicit newlines always break. A word wider than `max_width` sits on a
/// line of its own rather than being split.
pub fn wrap_text(
    text: &str,
    max_width: f64,
    font_size: f64,
    measure: &dyn TextMeasure,
) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if measure.measure_text(&candidate, font_size) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One unit per char.
    struct Mono;

    impl TextMeasure for Mono {
        fn measure_text(&self, text: &str, _font_size: f64) -> f64 {
            text.chars().count() as f64
        }
    }

    #[test]
    fn test_wraps_at_word_boundaries() {
        let lines = wrap_text("review the purchase order", 12.0, 12.0, &Mono);
        assert_eq!(lines, vec!["review the", "purchase", "order"]);
    }

    #[test]
    fn test_long_word_kept_whole() {
        let lines = wrap_text("a supercalifragilistic b", 5.0, 12.0, &Mono);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn test_explicit_newlines() {
        let lines = wrap_text("first\nsecond line", 100.0, 12.0, &Mono);
        assert_eq!(lines, vec!["first", "second line"]);
    }

    #[test]
    fn test_empty_text_single_line() {
        assert_eq!(wrap_text("", 10.0, 12.0, &Mono), vec![String::new()]);
    }

    #[test]
    fn test_approx_measure() {
        let m = ApproxTextMeasure::default();
        assert!((m.measure_text("abcd", 10.0) - 24.0).abs() < 1e-10);
    }
}
