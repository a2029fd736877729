/// Returns true for CJK ideographs, which are tokenized one character at a time.
pub fn is_cjk_char(c: char) -> bool {
    matches!(
        c as u32,
        0x3400..=0x4DBF     // Extension A
            | 0x4E00..=0x9FFF   // Unified Ideographs
            | 0xF900..=0xFAFF   // Compatibility Ideographs
            | 0x20000..=0x2EBEF // Extensions B-F
            | 0x2F800..=0x2FA1F // Compatibility Supplement
            | 0x30000..=0x3134F // Extension G
    )
}

/// Split text into word tokens.
///
/// Each CJK ideograph becomes its own token; everything else is split on
/// whitespace. Token order follows the input.
pub fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut buffer = String::new();

    for c in text.chars() {
        if is_cjk_char(c) {
            flush(&mut buffer, &mut words);
            words.push(c.to_string());
        } else {
            buffer.push(c);
        }
    }
    flush(&mut buffer, &mut words);

    words
}

fn flush(buffer: &mut String, words: &mut Vec<String>) {
    if buffer.is_empty() {
        return;
    }
    words.extend(buffer.split_whitespace().map(str::to_string));
    buffer.clear();
}
