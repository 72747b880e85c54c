use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Number of user-perceived characters (grapheme clusters). Name length
/// limits are counted in these.
pub fn char_count(s: &str) -> usize {
    s.graphemes(true).count()
}

/// Terminal cells needed to show `s`. A tab is counted as four cells.
pub fn display_width(s: &str) -> usize {
    let tabs = s.matches('\t').count();
    s.split('\t').map(|part| part.width()).sum::<usize>() + tabs * 4
}

/// Shorten `s` to at most `max_cells` cells. A shortened string ends in `…`,
/// which takes one of those cells.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    match max_cells {
        0 => String::new(),
        _ if display_width(s) <= max_cells => s.to_string(),
        1 => "\u{2026}".to_string(),
        _ => {
            let budget = max_cells - 1;
            let mut used = 0;
            let kept: String = s
                .graphemes(true)
                .take_while(|g| {
                    used += display_width(g);
                    used <= budget
                })
                .collect();
            kept + "\u{2026}"
        }
    }
}

/// Pad `s` with spaces on the right to `cells` display cells.
pub fn pad_to_width(s: &str, cells: usize) -> String {
    let w = display_width(s);
    if w >= cells {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(cells - w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_count_uses_graphemes() {
        assert_eq!(char_count("abc"), 3);
        assert_eq!(char_count("café"), 4);
        // family emoji is one grapheme made of several code points
        assert_eq!(char_count("👨‍👩‍👧"), 1);
    }

    #[test]
    fn truncate_ascii() {
        assert_eq!(truncate_to_width("Blueberries", 6), "Blueb…");
        assert_eq!(truncate_to_width("Kiwi", 6), "Kiwi");
        assert_eq!(truncate_to_width("Kiwi", 0), "");
    }

    #[test]
    fn truncate_wide_chars() {
        // each CJK character is two cells wide
        assert_eq!(truncate_to_width("豆腐豆腐", 5), "豆腐…");
    }

    #[test]
    fn pad_counts_cells() {
        assert_eq!(pad_to_width("ab", 4), "ab  ");
        assert_eq!(pad_to_width("豆", 3), "豆 ");
        assert_eq!(pad_to_width("abcdef", 3), "abcdef");
    }
}
