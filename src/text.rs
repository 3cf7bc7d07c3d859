//! Recognized-text normalization.
//!
//! OCR output for subtitle bitmaps is noisy in predictable ways: italic
//! capital I comes back as a slash or pipe, accented letters are misread,
//! and stray symbols appear at glyph edges. [`clean_text`] repairs and strips
//! those; [`wrap_text`] re-flows the result into at most two display lines.
//! [`normalize`] runs both and decides whether anything usable is left.
//!
//! # Example
//!
//! ```
//! use vobsrt::text::{clean_text, normalize, wrap_text};
//!
//! assert_eq!(clean_text("  |t's  caf\u{e9} ~ time!  "), "It's cafe - time!");
//! assert_eq!(wrap_text("one two three", 7), "one two\nthree");
//! assert_eq!(normalize("  . ", 42), None);
//! ```

/// Default maximum characters per subtitle line.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 42;

/// Cleaned text shorter than this many characters counts as "no text".
pub const MIN_TEXT_LENGTH: usize = 2;

/// Maximum lines in one subtitle.
pub const MAX_LINES: usize = 2;

/// Punctuation kept by [`clean_text`] in addition to word characters and
/// whitespace.
const KEPT_PUNCTUATION: &str = ".,!?;:()-\"'";

/// Replacement for a commonly misrecognized character.
///
/// No replacement contains a character that itself has a replacement
/// and survives stripping, which keeps [`clean_text`] idempotent.
fn substitute(c: char) -> Option<&'static str> {
    let replacement = match c {
        '/' | '\\' | '|' => "I",
        '~' => "-",

        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'ç' | 'ć' | 'č' => "c",
        'Ç' | 'Ć' | 'Č' => "C",
        'ď' | 'đ' => "d",
        'Ď' | 'Đ' => "D",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => "E",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' => "i",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'Į' => "I",
        'ł' => "l",
        'Ł' => "L",
        'ñ' | 'ń' | 'ň' => "n",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => "O",
        'ř' => "r",
        'Ř' => "R",
        'ś' | 'š' | 'ş' => "s",
        'Ś' | 'Š' | 'Ş' => "S",
        'ť' | 'ţ' => "t",
        'Ť' | 'Ţ' => "T",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' => "U",
        'ý' | 'ÿ' => "y",
        'Ý' | 'Ÿ' => "Y",
        'ź' | 'ż' | 'ž' => "z",
        'Ź' | 'Ż' | 'Ž' => "Z",
        'ß' => "ss",
        'æ' => "ae",
        'Æ' => "AE",
        'œ' => "oe",
        'Œ' => "OE",

        '°' => "o",
        '¢' => "c",
        '£' => "E",
        '¥' => "Y",
        '§' => "S",
        '©' => "O",
        '®' => "R",
        '±' => "+",
        '⁰' => "0",
        '¹' => "1",
        '²' => "2",
        '³' => "3",
        '⁴' => "4",
        '⁵' => "5",
        '⁶' => "6",
        '⁷' => "7",
        '⁸' => "8",
        '⁹' => "9",
        '¼' => "1/4",
        '½' => "1/2",
        '¾' => "3/4",

        // Typographic punctuation that tesseract emits for plain quotes
        // and dashes.
        '‘' | '’' | '‚' | '′' => "'",
        '“' | '”' | '„' | '″' => "\"",
        '‐' | '‑' | '‒' | '–' | '—' => "-",
        '…' => "...",
        _ => return None,
    };
    Some(replacement)
}

fn is_kept(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c.is_whitespace() || KEPT_PUNCTUATION.contains(c)
}

/// Repair and strip raw recognized text.
///
/// Applies the misrecognition table, removes every character that is not
/// an ASCII word character, whitespace, or one of `. , ! ? ; : ( ) - " '`,
/// collapses whitespace runs to a single space, and trims. Empty input is
/// returned unchanged.
///
/// Cleaning is idempotent: `clean_text(&clean_text(s)) == clean_text(s)`.
pub fn clean_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut substituted = String::with_capacity(raw.len());
    for c in raw.chars() {
        match substitute(c) {
            Some(replacement) => substituted.push_str(replacement),
            None => substituted.push(c),
        }
    }

    let stripped: String = substituted.chars().filter(|&c| is_kept(c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Re-flow text into at most [`MAX_LINES`] lines of `max_length` characters.
///
/// Words are packed greedily. A word longer than `max_length` is broken
/// after `max_length - 1` characters with a trailing hyphen and continues
/// on the next line. Lines beyond the second are dropped: the second line
/// is the first line of re-wrapping everything not on the first.
///
/// Lengths are counted in characters. A `max_length` of zero is treated as
/// one.
pub fn wrap_text(text: &str, max_length: usize) -> String {
    let max_length = max_length.max(1);
    let mut lines = greedy_lines(text, max_length);
    lines.truncate(MAX_LINES);
    lines.join("\n")
}

fn greedy_lines(text: &str, max_length: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_length = 0;

    for word in text.split_whitespace() {
        let word_length = word.chars().count();

        if current_length > 0 && current_length + 1 + word_length <= max_length {
            current.push(' ');
            current.push_str(word);
            current_length += 1 + word_length;
            continue;
        }

        if current_length > 0 {
            lines.push(std::mem::take(&mut current));
        }

        let mut rest: Vec<char> = word.chars().collect();
        while rest.len() > max_length {
            let piece = (max_length - 1).max(1);
            let mut broken: String = rest[..piece].iter().collect();
            broken.push('-');
            lines.push(broken);
            rest.drain(..piece);
        }
        current = rest.into_iter().collect();
        current_length = current.chars().count();
    }

    if current_length > 0 {
        lines.push(current);
    }
    lines
}

/// Clean and wrap one recognition result.
///
/// Returns `None` when fewer than [`MIN_TEXT_LENGTH`] characters survive
/// cleaning; such slots produce no subtitle.
pub fn normalize(raw: &str, max_length: usize) -> Option<String> {
    let cleaned = clean_text(raw);
    if cleaned.trim().chars().count() < MIN_TEXT_LENGTH {
        return None;
    }
    Some(wrap_text(&cleaned, max_length))
}
