//! Value normalization
//!
//! Makes two independently authored values comparable. Both functions are
//! pure; the comparator runs every value through [`normalize`] and then
//! judges equality with [`fuzzy_eq`].

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_properties::{GeneralCategory, GeneralCategoryGroup, UnicodeGeneralCategory};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

static CDATA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("valid regex"));

// Matched after case folding, hence the lowercase `t` and `z`
static TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})t\d{2}:\d{2}:\d{2}(?:\.\d+)?z?$").expect("valid regex")
});

/// Canonicalize a value for comparison
///
/// Collapses whitespace runs (newlines included) to one space, unwraps CDATA
/// sections, lowercases, trims, decodes HTML entities and cuts a full
/// timestamp down to its date.
pub fn normalize(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text, " ");
    let unwrapped = CDATA.replace_all(&collapsed, "$1");
    let folded = unwrapped.to_lowercase();
    let decoded = html_escape::decode_html_entities(folded.trim()).into_owned();

    match TIMESTAMP.captures(&decoded) {
        Some(caps) => caps[1].to_string(),
        None => decoded,
    }
}

/// Equality over alphanumeric content only
///
/// Punctuation and whitespace are skipped on both sides; letters compare
/// case-insensitively. Only letters (general category `L*`) and decimal
/// digits (`Nd`) count. Superscripts, fractions, roman numeral signs and
/// combining marks are skipped like punctuation, while precomposed accented
/// and non-Latin letters are compared strictly.
pub fn fuzzy_eq(a: &str, b: &str) -> bool {
    let mut left = alphanumerics(a);
    let mut right = alphanumerics(b);

    loop {
        match (left.next(), right.next()) {
            (Some(x), Some(y)) if x == y => continue,
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// Sort key agreeing with [`fuzzy_eq`]
///
/// The alphanumeric content of the normalized value. Two values that
/// `fuzzy_eq` accepts after [`normalize`] share a key, so sorting on it keeps
/// such values at the same position on both sides.
pub fn comparison_key(text: &str) -> String {
    alphanumerics(&normalize(text)).collect()
}

fn alphanumerics(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().filter(|c| is_compared(*c)).flat_map(char::to_lowercase)
}

fn is_compared(c: char) -> bool {
    c.general_category_group() == GeneralCategoryGroup::Letter
        || c.general_category() == GeneralCategory::DecimalNumber
}
