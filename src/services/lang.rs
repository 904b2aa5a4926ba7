//! Picking a translation direction from the text itself

use crate::extraction::is_cjk;

/// Above this share of CJK characters the text is treated as CJK
pub const CJK_THRESHOLD: f32 = 0.3;

/// Share of CJK characters among the non-whitespace characters
pub fn cjk_ratio(text: &str) -> f32 {
    let mut total = 0usize;
    let mut cjk = 0usize;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if is_cjk(c) {
            cjk += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    cjk as f32 / total as f32
}

/// Mostly-CJK text goes to `alternate`, everything else to `default`
pub fn choose_target<'a>(text: &str, default: &'a str, alternate: &'a str) -> &'a str {
    if cjk_ratio(text) > CJK_THRESHOLD {
        alternate
    } else {
        default
    }
}
