//! Name ordering for deck lists.
//!
//! Approximates Japanese locale collation without an ICU dependency:
//! katakana sorts together with the matching hiragana, full-width ASCII is
//! folded to half-width, Latin letters compare case-insensitively, and
//! character classes are ordered symbols, digits, Latin, kana, kanji, other.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CharClass {
    Symbol,
    Digit,
    Latin,
    Kana,
    Kanji,
    Other,
}

fn fold(c: char) -> char {
    let code = c as u32;
    let folded = match code {
        // Full-width ASCII variants.
        0xFF01..=0xFF5E => code - 0xFEE0,
        // Katakana to hiragana.
        0x30A1..=0x30F6 => code - 0x60,
        _ => code,
    };
    char::from_u32(folded)
        .unwrap_or(c)
        .to_ascii_lowercase()
}

fn classify(c: char) -> CharClass {
    match c as u32 {
        0x30..=0x39 => CharClass::Digit,
        0x41..=0x5A | 0x61..=0x7A => CharClass::Latin,
        0x00..=0x7F => CharClass::Symbol,
        // Hiragana, katakana, prolonged sound mark, half-width katakana.
        0x3041..=0x309F | 0x30A0..=0x30FF | 0xFF66..=0xFF9F => CharClass::Kana,
        0x3000..=0x303F => CharClass::Symbol,
        0x4E00..=0x9FFF | 0x3400..=0x4DBF => CharClass::Kanji,
        _ => CharClass::Other,
    }
}

fn sort_key(s: &str) -> Vec<(CharClass, char)> {
    s.chars()
        .map(fold)
        .map(|c| (classify(c), c))
        .collect()
}

/// Compare two names using the folded key, falling back to code points.
pub fn compare(a: &str, b: &str) -> Ordering {
    sort_key(a).cmp(&sort_key(b)).then_with(|| a.cmp(b))
}
