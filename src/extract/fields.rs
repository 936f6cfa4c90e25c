use std::sync::LazyLock;

use regex::Regex;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new("Ноутбук.*").unwrap());
static NON_ALNUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").unwrap());

/// Product title: everything from the "Ноутбук" category marker to the end
/// of the line. Cards whose description never mentions the marker keep an
/// empty name; callers must tolerate that.
pub fn normalize_name(text: &str) -> String {
    NAME_RE
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Price in whole rubles. Listing price text is noisy ("4 200 000 ₽", NBSP
/// thousands separators, appended currency codes), so everything outside
/// ASCII letters and digits is stripped first and any remainder that still
/// does not parse as a number counts as 0.
pub fn normalize_price(text: &str) -> u32 {
    let stripped = NON_ALNUM_RE.replace_all(text, "");
    stripped.parse().unwrap_or(0)
}
