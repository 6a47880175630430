//! Numeric literals are validated against the grammar before conversion: `f64::from_str`
//! alone would also accept `inf`, `NaN`, exponents and a leading `+`, none of which
//! Marlin understands.

/// Parses `'-'? ( [0-9]+ ( '.' [0-9]* )? | '.' [0-9]+ )`.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let digits = text.strip_prefix('-').unwrap_or(text);

    let mut int = 0;
    let mut dec = 0;
    let mut seen_dot = false;
    for b in digits.bytes() {
        match b {
            b'0'..=b'9' if seen_dot => dec += 1,
            b'0'..=b'9' => int += 1,
            b'.' if !seen_dot => seen_dot = true,
            _ => return None,
        }
    }
    if int == 0 && dec == 0 {
        return None;
    }
    text.parse().ok()
}
