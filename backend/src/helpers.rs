use std::collections::HashSet;

use regex::Regex;
use lazy_static::lazy_static;

lazy_static! {
    // Dashes separate words.
    pub static ref RE_ADDITIONAL_WORD_LIMITS: Regex = Regex::new(r"--|—|–").unwrap();

    // Markup tokens, comments, hyphens and blockquote markers don't count as words.
    pub static ref RE_NO_WORD_LIMITS: Regex = Regex::new(r"(?m)\[.+?\]|/\*.+?\*/|-|^>").unwrap();

    pub static ref RE_NON_LETTERS: Regex = Regex::new(r"\[.+?\]|/\*.+?\*/|\n|\r").unwrap();

    // [lang=de-CH]
    pub static ref RE_LANGUAGE_TAG: Regex = Regex::new(r"\[lang=(.*?)\]").unwrap();

    pub static ref RE_DIGITS: Regex = Regex::new(r"[0-9]+").unwrap();
}

/// Split a divided string into a list of unique, trimmed, non-empty items.
///
/// `string_to_list("Sam ; Ana;;Sam", ";")` is `["Sam", "Ana"]`.
pub fn string_to_list(text: &str, divider: &str) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut elements: Vec<String> = Vec::new();
    for item in text.split(divider) {
        let item = item.trim();
        if item.is_empty() || seen.contains(item) {
            continue;
        }
        seen.insert(item);
        elements.push(item.to_string());
    }
    elements
}

pub fn list_to_string<S: AsRef<str>>(elements: &[S], divider: &str) -> String {
    elements
        .iter()
        .map(|e| e.as_ref())
        .collect::<Vec<&str>>()
        .join(divider)
}

/// The smallest positive integer, as a string, not used as an ID yet.
pub fn create_id<I, S>(elements: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let used: HashSet<String> = elements.into_iter().map(|e| e.as_ref().to_string()).collect();
    let mut i: usize = 1;
    while used.contains(&i.to_string()) {
        i += 1;
    }
    i.to_string()
}

/// The first run of digits in `text`, e.g. `"ScID:12"` gives `"12"`.
pub fn first_digits(text: &str) -> Option<String> {
    RE_DIGITS.find(text).map(|m| m.as_str().to_string())
}

/// Highest numeric ID, or 0 if there is none.
pub fn max_numeric_id<I, S>(ids: I) -> usize
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ids.into_iter()
        .filter_map(|id| id.as_ref().parse::<usize>().ok())
        .max()
        .unwrap_or(0)
}

pub fn count_words(text: &str) -> usize {
    let text = RE_ADDITIONAL_WORD_LIMITS.replace_all(text, " ");
    let text = RE_NO_WORD_LIMITS.replace_all(&text, "");
    text.split_whitespace().count()
}

pub fn count_letters(text: &str) -> usize {
    RE_NON_LETTERS.replace_all(text, "").chars().count()
}

/// Language codes of all `[lang=xx]` tokens in `text`, in order of appearance.
pub fn language_tags(text: &str) -> Vec<String> {
    RE_LANGUAGE_TAG
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Keep the first `max_chars` characters, appending "..." when something was cut.
pub fn clip_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() > max_chars {
        let clipped: String = title.chars().take(max_chars).collect();
        format!("{}...", clipped)
    } else {
        title.to_string()
    }
}
