//! Display-width aware string helpers.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Terminal columns `s` occupies.
pub fn width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Cut `s` to at most `max` columns, ending in `…` when something was dropped.
pub fn truncate(s: &str, max: usize) -> String {
    if width(s) <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_strings_untouched() {
        assert_eq!(truncate("Radio City", 20), "Radio City");
    }

    #[test]
    fn test_truncates_with_ellipsis() {
        assert_eq!(truncate("Radio Mirchi 98.3", 8), "Radio M…");
        assert_eq!(width(&truncate("Radio Mirchi 98.3", 8)), 8);
    }

    #[test]
    fn test_wide_chars_count_double() {
        // Devanagari is narrow, CJK is wide.
        let s = "日本語ラジオ";
        let t = truncate(s, 5);
        assert!(width(&t) <= 5);
        assert!(t.ends_with('…'));
    }

    #[test]
    fn test_zero_width_budget() {
        assert_eq!(truncate("abc", 0), "");
    }
}
