use super::value::ErrorCode;

/// Format a number for display.
///
/// Uses the shortest decimal form that round-trips (`4`, `3.14`, `-0.5`),
/// independent of locale. Non-finite values render as the malformed token.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        ErrorCode::MalformedExpression.token().to_string()
    } else if n == 0.0 {
        // Avoid "-0".
        "0".to_string()
    } else {
        n.to_string()
    }
}
