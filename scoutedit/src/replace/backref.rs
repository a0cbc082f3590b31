use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// `$!N` tokens in a replacement template
static BACKREF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$!(\d+)").unwrap());

/// Expands `$!N` tokens in `template` from the captures of one match.
///
/// `$!0` is the whole match. A token whose index is out of range for the
/// pattern is left in place verbatim; a group that exists but did not take
/// part in this match expands to the empty string.
pub fn expand_backrefs(template: &str, caps: &Captures<'_>) -> String {
    BACKREF
        .replace_all(template, |token: &Captures<'_>| {
            match token[1].parse::<usize>() {
                Ok(index) if index < caps.len() => {
                    caps.get(index).map_or("", |m| m.as_str()).to_string()
                }
                _ => token[0].to_string(),
            }
        })
        .into_owned()
}

/// Whether `template` contains any `$!N` token
pub fn has_backrefs(template: &str) -> bool {
    BACKREF.is_match(template)
}
