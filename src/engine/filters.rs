//! Escaping helpers registered for every render.

use std::collections::HashMap;
use tera::Value;

/// Escape text for an HTML text or attribute context.
#[must_use]
pub fn escape_html_str(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 8);
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// String form of a value as echoed into a page.
///
/// `null` prints nothing, strings print as-is, and arrays and objects print
/// as JSON.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// The `escape_html` filter emitted for every `{{ }}` echo.
///
/// # Errors
///
/// Never fails; the signature is dictated by [`tera::Filter`].
pub fn escape_html(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(escape_html_str(&display_value(value))))
}

/// The `escape_html` function emitted for every `{{ }}` echo.
///
/// Compiled views call it as `escape_html(value=<expr>)`, so operators in the
/// expression are evaluated before escaping. A missing `value` prints nothing.
///
/// # Errors
///
/// Never fails; the signature is dictated by [`tera::Function`].
pub fn escape_html_function(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let value = args.get("value").unwrap_or(&Value::Null);
    Ok(Value::String(escape_html_str(&display_value(value))))
}
