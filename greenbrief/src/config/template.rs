//! Prompt template rendering.
//!
//! Templates use `{placeholder}` markers. Rendering is strict: a
//! placeholder without a matching variable is an error, so typos surface
//! at configuration-validation time rather than as garbled prompts.

use crate::errors::TemplateError;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        let re = Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_]*)\}").unwrap();
        re
    })
}

/// Returns the distinct placeholders in a template, in first-use order.
#[must_use]
pub fn placeholders(template: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for captures in placeholder_re().captures_iter(template) {
        let name = &captures[1];
        if !seen.iter().any(|s| s == name) {
            seen.push(name.to_string());
        }
    }
    seen
}

/// Substitutes variables into a template.
///
/// # Errors
///
/// Returns `TemplateError` on the first placeholder with no matching
/// variable.
pub fn render(
    template: &str,
    vars: &HashMap<String, String>,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for captures in placeholder_re().captures_iter(template) {
        #[allow(clippy::unwrap_used)]
        let whole = captures.get(0).unwrap();
        let name = &captures[1];

        let value = vars
            .get(name)
            .ok_or_else(|| TemplateError::new(name))?;

        out.push_str(&template[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}
