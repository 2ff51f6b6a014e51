//! Comment normalisation.
//!
//! Comments are reproduced as written except for two things: trailing whitespace is
//! dropped and `#text` becomes `# text`. Shebangs (`#!`), doubled hashes (`##`) and
//! `#:` markers keep their shape.

use std::borrow::Cow;

pub fn normalize_comment(comment: &str) -> Cow<'_, str> {
    let trimmed = comment.trim_end();
    let Some(body) = trimmed.strip_prefix('#') else {
        return Cow::Borrowed(trimmed);
    };

    match body.chars().next() {
        None => Cow::Borrowed(trimmed),
        Some(ch) if ch.is_whitespace() || matches!(ch, '!' | '#' | ':') => Cow::Borrowed(trimmed),
        Some(_) => Cow::Owned(format!("# {body}")),
    }
}
