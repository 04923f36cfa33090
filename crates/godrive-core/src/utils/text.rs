//! Width-aware text helpers for terminal output.
//!
//! Widths are display columns, so accented names ("João") and CJK text line up.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";

/// Truncate `text` to at most `max_width` columns, ending with "..." when cut.
///
/// # Examples
/// ```
/// use godrive_core::utils::text::truncate_text;
/// assert_eq!(truncate_text("Autoescola Central", 10), "Autoesc...");
/// assert_eq!(truncate_text("Ana", 10), "Ana");
/// ```
pub fn truncate_text(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }

    if max_width <= ELLIPSIS.len() {
        return ELLIPSIS[..max_width].to_string();
    }

    let target_width = max_width - ELLIPSIS.len();
    let mut result = String::new();
    let mut current_width = 0;

    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if current_width + ch_width > target_width {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }

    result.push_str(ELLIPSIS);
    result
}

/// Wrap text at word boundaries so no line exceeds `max_width` columns.
///
/// Words wider than a line are split by character.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_width = 0;

    for word in text.split_whitespace() {
        let word_width = word.width();
        let needed = if current_line.is_empty() {
            word_width
        } else {
            current_width + 1 + word_width
        };

        if needed <= max_width {
            if !current_line.is_empty() {
                current_line.push(' ');
            }
            current_line.push_str(word);
            current_width = needed;
            continue;
        }

        if !current_line.is_empty() {
            lines.push(std::mem::take(&mut current_line));
            current_width = 0;
        }

        if word_width <= max_width {
            current_line.push_str(word);
            current_width = word_width;
            continue;
        }

        for ch in word.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if current_width + ch_width > max_width && !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
                current_width = 0;
            }
            current_line.push(ch);
            current_width += ch_width;
        }
    }

    if !current_line.is_empty() || lines.is_empty() {
        lines.push(current_line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("Hello", 10), "Hello");
        assert_eq!(truncate_text("Hello World!", 8), "Hello...");
        assert_eq!(truncate_text("", 5), "");
        assert_eq!(truncate_text("Hello", 2), "..");
    }

    #[test]
    fn test_truncate_text_counts_columns() {
        // each ideograph is two columns wide
        assert_eq!(truncate_text("運転教習所です", 9), "運転教...");
        assert_eq!(truncate_text("João Gonçalves", 14), "João Gonçalves");
    }

    #[test]
    fn test_wrap_text() {
        let wrapped = wrap_text("Paciente e focado em baliza", 10);
        assert_eq!(wrapped, vec!["Paciente e", "focado em", "baliza"]);

        assert_eq!(wrap_text("", 10), vec![""]);
        assert_eq!(wrap_text("superlongword", 5), vec!["super", "longw", "ord"]);
    }
}
