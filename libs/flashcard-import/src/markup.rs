//! Conversion of field HTML into plain text.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static BREAK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|h[1-6]|tr|blockquote)\s*>")
        .expect("valid line break pattern")
});

static SCRIPT_STYLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("valid script/style pattern")
});

static IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<img\b[^>]*>").expect("valid image pattern"));

static ALT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\balt\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid alt pattern")
});

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?[A-Za-z!][^>]*>").expect("valid tag pattern"));

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:(amp|lt|gt|quot|apos|nbsp)|#([0-9]{1,7})|#[xX]([0-9a-fA-F]{1,6}));")
        .expect("valid entity pattern")
});

static SPACE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\S\n]+").expect("valid space pattern"));

static BLANK_LINES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank line pattern"));

/// Placeholder left where an image used to be.
pub const IMAGE_PLACEHOLDER: &str = "[image]";

/// Strip presentation markup, keeping line structure.
///
/// Text without tag-like constructs (`<x…>`) or character references passes
/// through unchanged, so cleaning such output again is a no-op. Escaped tags
/// such as `&lt;b&gt;` decode into real tags and are stripped by a second pass.
pub fn clean_markup(html: &str) -> String {
    let text = BREAK_RE.replace_all(html, "\n");
    let text = SCRIPT_STYLE_RE.replace_all(&text, "");
    let text = IMAGE_RE.replace_all(&text, |caps: &Captures| image_placeholder(&caps[0]));
    let text = TAG_RE.replace_all(&text, "");
    let text = decode_entities(&text);
    collapse_whitespace(&text)
}

/// Decode named and numeric character references in a single pass.
pub fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            if let Some(name) = caps.get(1) {
                return match name.as_str() {
                    "amp" => "&",
                    "lt" => "<",
                    "gt" => ">",
                    "quot" => "\"",
                    "apos" => "'",
                    _ => " ",
                }
                .to_string();
            }
            let code = match (caps.get(2), caps.get(3)) {
                (Some(dec), _) => dec.as_str().parse::<u32>().ok(),
                (_, Some(hex)) => u32::from_str_radix(hex.as_str(), 16).ok(),
                _ => None,
            };
            code.and_then(char::from_u32)
                .filter(|c: &char| !c.is_control() || matches!(*c, '\n' | '\t'))
                .map(|c| c.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn image_placeholder(tag: &str) -> String {
    let alt = ALT_RE
        .captures(tag)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim())
        .filter(|alt| !alt.is_empty());
    match alt {
        Some(alt) => format!("[image: {alt}]"),
        None => IMAGE_PLACEHOLDER.to_string(),
    }
}

fn collapse_whitespace(text: &str) -> String {
    let lines: Vec<String> = text
        .split('\n')
        .map(|line| SPACE_RUN_RE.replace_all(line, " ").trim().to_string())
        .collect();
    let joined = lines.join("\n");
    BLANK_LINES_RE
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}
