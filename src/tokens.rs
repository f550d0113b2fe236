/// Characters that end a token, in addition to whitespace
const TOKEN_SEPARATORS: &[char] = &[
    ',', '.', ';', ':', '!', '?', '(', ')', '[', ']', '{', '}', '"', '\'', '\u{201C}', '\u{201D}',
    '\u{2018}', '\u{2019}',
];

/// Rough token count of a text blob.
///
/// Splits on runs of whitespace and common punctuation (straight and curly
/// quotes included) and counts the non-empty pieces. This is an
/// approximation and has nothing to do with any model tokenizer.
pub fn estimate_token_count(text: Option<&str>) -> usize {
    let Some(text) = text else {
        return 0;
    };

    text.split(|c: char| c.is_whitespace() || TOKEN_SEPARATORS.contains(&c))
        .filter(|piece| !piece.is_empty())
        .count()
}
