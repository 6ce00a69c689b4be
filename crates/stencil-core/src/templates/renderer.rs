//! Template rendering with the module helper filters
//!
//! Templates use Tera syntax. Two helper filters are always registered:
//!
//! ```text
//! {{ name | Title }}    -> "Alice" for name = "alice"
//! {{ name | ToLower }}  -> "alice" for name = "ALICE"
//! ```

use crate::config::ProjectContext;
use std::collections::HashMap;
use std::error::Error as _;
use tera::{Context, Tera, Value};

/// Render `template` against `data`
pub fn render(template: &str, data: &Context) -> tera::Result<String> {
    // Fresh instance per render: Tera::render_str needs `&mut self`
    let mut tera = Tera::default();
    register_helpers(&mut tera);
    tera.render_str(template, data)
}

/// Register the helper filters on a Tera instance
pub fn register_helpers(tera: &mut Tera) {
    tera.register_filter("Title", title_filter);
    tera.register_filter("ToLower", lower_filter);
}

/// Build the data passed to every template of a module
///
/// Project context values and module params are exposed as top-level keys
/// (params win on conflict), and also as the `context` and `params` maps.
pub fn template_data(params: &HashMap<String, String>, context: &ProjectContext) -> Context {
    let mut data = Context::new();
    for (key, value) in context.as_map() {
        data.insert(key.as_str(), value);
    }
    for (key, value) in params {
        data.insert(key.as_str(), value);
    }
    data.insert("context", context.as_map());
    data.insert("params", params);
    data
}

/// Flatten a Tera error and its causes into one line
pub fn describe_error(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Upper-case the first letter of every word
///
/// Letters, digits and underscores belong to a word; anything else
/// separates words.
pub fn title_case(input: &str) -> String {
    let mut previous = ' ';
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        if is_separator(previous) {
            output.extend(c.to_uppercase());
        } else {
            output.push(c);
        }
        previous = c;
    }
    output
}

fn is_separator(c: char) -> bool {
    if c.is_ascii() {
        !(c.is_ascii_alphanumeric() || c == '_')
    } else if c.is_alphanumeric() {
        false
    } else {
        c.is_whitespace()
    }
}

fn title_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("Filter `Title` expects a string"))?;
    Ok(Value::String(title_case(s)))
}

fn lower_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("Filter `ToLower` expects a string"))?;
    Ok(Value::String(s.to_lowercase()))
}
