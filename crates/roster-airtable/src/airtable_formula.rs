//! Exact-match `filterByFormula` builders.

/// Builds `{Field}=value` for a numeric field.
pub fn match_field(field: &str, value: u64) -> String {
    let field = escape_field_name(field);
    format!("{{{field}}}={value}")
}

fn escape_field_name(field: &str) -> String {
    field.replace('}', "\\}")
}
