use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_SYMBOLS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\W+").unwrap());
static FOOTNOTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\w+\]").unwrap());
static NUMBERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+/?\d*").unwrap());

/// En dash and the mojibake it turns into when UTF-8 is read as cp1252.
const DASH_ARTIFACTS: [&str; 2] = ["â€“", "–"];

/// A single named cleaning step for country labels.
pub struct NameTransform {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

/// Steps run in this order. Footnote removal must precede number removal,
/// otherwise `[12]` would be reduced to `[]` and survive.
pub const NAME_TRANSFORMS: [NameTransform; 5] = [
    NameTransform {
        name: "strip_leading_symbols",
        apply: strip_leading_symbols,
    },
    NameTransform {
        name: "strip_footnotes",
        apply: strip_footnotes,
    },
    NameTransform {
        name: "strip_numbers",
        apply: strip_numbers,
    },
    NameTransform {
        name: "strip_dash_artifacts",
        apply: strip_dash_artifacts,
    },
    NameTransform {
        name: "trim",
        apply: trim,
    },
];

pub fn strip_leading_symbols(s: &str) -> String {
    LEADING_SYMBOLS.replace(s, "").into_owned()
}

pub fn strip_footnotes(s: &str) -> String {
    FOOTNOTES.replace_all(s, "").into_owned()
}

pub fn strip_numbers(s: &str) -> String {
    NUMBERS.replace_all(s, "").into_owned()
}

pub fn strip_dash_artifacts(s: &str) -> String {
    DASH_ARTIFACTS
        .iter()
        .fold(s.to_string(), |acc, dash| acc.replace(dash, ""))
}

pub fn trim(s: &str) -> String {
    s.trim().to_string()
}

fn clean_pass(s: &str) -> String {
    NAME_TRANSFORMS
        .iter()
        .fold(s.to_string(), |acc, t| (t.apply)(&acc))
}

/// Clean a scraped country label for display.
///
/// A single pass can expose new material for an earlier step (digits
/// removed in front of a symbol leave that symbol leading), so passes repeat
/// until nothing changes. Every step only deletes text, which bounds the loop.
pub fn normalize_name(raw: &str) -> String {
    let mut current = clean_pass(raw);
    loop {
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Join key: normalized, lower-cased and trimmed. Never shown to users.
pub fn join_key(name: &str) -> String {
    normalize_name(name).to_lowercase().trim().to_string()
}
