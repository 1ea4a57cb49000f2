//! Character script classification

/// Whether `c` is a kanji-class (CJK ideograph) character.
///
/// Covers the unified ideograph blocks, extension A, the compatibility
/// block and the supplementary ideographic plane. Kana, the iteration mark
/// `々` and punctuation are not kanji-class.
pub fn is_kanji(c: char) -> bool {
    matches!(
        c,
        '\u{4E00}'..='\u{9FFF}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{2FA1F}'
    )
}

/// Kanji-class characters of `word`, in order
pub fn kanji_of(word: &str) -> impl Iterator<Item = char> + '_ {
    word.chars().filter(|c| is_kanji(*c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_kanji() {
        assert!(is_kanji('木'));
        assert!(is_kanji('林'));
        assert!(is_kanji('𠮷'));
        assert!(!is_kanji('き'));
        assert!(!is_kanji('キ'));
        assert!(!is_kanji('々'));
        assert!(!is_kanji('a'));
    }

    #[test]
    fn test_kanji_of_keeps_order() {
        let kanji: Vec<char> = kanji_of("食べ物").collect();
        assert_eq!(kanji, vec!['食', '物']);
    }
}
