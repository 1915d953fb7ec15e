// Output formatting: terminal tables for records, distributions and catalogs.

pub mod terminal;

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Board and company names are mostly CJK text, so this counts characters,
/// never bytes.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

/// Terminal column width of `text`: CJK and full-width characters take two
/// columns, everything else one.
pub fn display_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

/// Left-align `text` in a column of `width` terminal cells.
pub fn pad_right(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(display_width(text));
    format!("{text}{}", " ".repeat(pad))
}

fn char_width(c: char) -> usize {
    match c as u32 {
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6 => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate_chars("贵州茅台股份", 4), "贵州茅台...");
        assert_eq!(truncate_chars("Moutai", 10), "Moutai");
    }

    #[test]
    fn test_width_of_mixed_text() {
        assert_eq!(display_width("ABC"), 3);
        assert_eq!(display_width("白酒"), 4);
        assert_eq!(display_width("锂电池，储能"), 12);
        assert_eq!(pad_right("白酒", 6), "白酒  ");
        assert_eq!(pad_right("toolong", 3), "toolong");
    }
}
