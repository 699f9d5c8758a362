use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

const LABEL_MAX_CHARS: usize = 15;
const LABEL_KEEP_CHARS: usize = 13;

/// Names longer than 15 characters keep their first 13 plus "...".
pub fn truncate_label(name: &str) -> String {
    if name.chars().count() > LABEL_MAX_CHARS {
        let head = name.chars().take(LABEL_KEEP_CHARS).collect::<String>();
        format!("{head}...")
    } else {
        name.to_owned()
    }
}

/// Accent- and case-insensitive sort key.
pub fn collation_key(text: &str) -> String {
    text.nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn timestamp_millis() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}
