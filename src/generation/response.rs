//! Interpreting raw generation output

use once_cell::sync::Lazy;
use regex::Regex;

static FENCE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[\w+#.-]*").expect("Valid regex pattern"));

static SOURCE_MARKER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)(^\s*(import|export|function|const|let|var|class|interface|type|async|return)\b|=>|</?[A-Za-z][\w.]*[\s/>]|^\s*[.#@]?[\w-]+\s*\{|^\s*[\{\[])",
    )
    .expect("Valid regex pattern")
});

/// Remove every code fence marker (with its language tag) and trim.
pub fn strip_code_fences(text: &str) -> String {
    FENCE_REGEX.replace_all(text, "").trim().to_string()
}

/// Heuristic: does `text` read as project source rather than a chat answer?
///
/// Keyword and shape markers only; plain prose returns false. This is a weak
/// signal and can misjudge unusual output, so callers must treat `false` as
/// "do not touch the files" rather than as an error.
pub fn looks_like_source(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && SOURCE_MARKER_REGEX.is_match(text)
}
