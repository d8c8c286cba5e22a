//! Filesystem-safe identifiers derived from free text.

use regex::Regex;
use std::sync::LazyLock;

/// Separator substituted for whitespace runs.
pub const SLUG_SEPARATOR: &str = "_";

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("static regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Turns arbitrary text into a lowercase identifier made of word characters,
/// hyphens and `_`.
///
/// Pure and idempotent: `slugify(&slugify(x)) == slugify(x)`.
pub fn slugify(text: &str) -> String {
    let stripped = NON_WORD.replace_all(text, "");
    let lowered = stripped.trim().to_lowercase();
    let joined = WHITESPACE.replace_all(&lowered, SLUG_SEPARATOR);
    NON_WORD.replace_all(&joined, "").into_owned()
}
