//! Prompt template resolution
//!
//! Substitutes `{input}` and `{step.field}` placeholders in a prompt
//! template from the run context. Resolution is a pure function of the
//! template and context and it never fails: a placeholder that cannot be
//! resolved (unknown step, missing field, malformed syntax) is left
//! verbatim in the output. [`find_unresolved`] makes that permissive
//! pass-through observable so callers can log or reject it.

use crate::workflow::context::{Context, INPUT_KEY};

/// Resolve all placeholders in `template` against `context`.
///
/// `{input}` substitutes the current input text; `{name.field}` splits
/// on the first `.` and substitutes the step record field when both
/// exist. Everything else passes through unchanged, including unmatched
/// braces. A template with no placeholders is returned as-is.
pub fn resolve(template: &str, context: &Context) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        result.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        match after_open.find('}') {
            Some(close) => {
                let placeholder = &after_open[..close];
                match lookup(placeholder, context) {
                    Some(value) => result.push_str(value),
                    None => {
                        // Pass-through: keep the literal placeholder text
                        result.push('{');
                        result.push_str(placeholder);
                        result.push('}');
                    }
                }
                rest = &after_open[close + 1..];
            }
            None => {
                // Unterminated brace: keep the remainder verbatim
                result.push_str(&rest[open..]);
                return result;
            }
        }
    }

    result.push_str(rest);
    result
}

/// Placeholders in `template` that would not resolve against `context`.
///
/// Returned in template order, duplicates included. An empty result
/// means [`resolve`] performs full substitution.
pub fn find_unresolved(template: &str, context: &Context) -> Vec<String> {
    let mut unresolved = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let after_open = &rest[open + 1..];
        match after_open.find('}') {
            Some(close) => {
                let placeholder = &after_open[..close];
                if lookup(placeholder, context).is_none() {
                    unresolved.push(placeholder.to_string());
                }
                rest = &after_open[close + 1..];
            }
            None => break,
        }
    }

    unresolved
}

/// Resolve one placeholder body. Only the first `.` separates step name
/// from field; step names therefore must not contain a dot.
fn lookup<'a>(placeholder: &str, context: &'a Context) -> Option<&'a str> {
    if placeholder == INPUT_KEY {
        return Some(context.input());
    }
    let (name, field) = placeholder.split_once('.')?;
    context.field(name, field)
}
