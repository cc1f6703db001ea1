//! Dotted-numeric version comparison

use std::cmp::Ordering;

/// Compare two dotted-numeric version strings componentwise, left to right.
///
/// Missing trailing components count as zero, so `"1.2"` and `"1.2.0"` are
/// equal. Components are unbounded in count and magnitude; a component that is
/// not a plain decimal number coerces to zero.
///
/// Examples:
/// - `compare("1.2.0", "1.1.9")` -> `Greater`
/// - `compare("1.2", "1.2.0")` -> `Equal`
/// - `compare("1.9", "1.10")` -> `Less`
pub fn compare(a: &str, b: &str) -> Ordering {
    let a: Vec<&str> = a.split('.').collect();
    let b: Vec<&str> = b.split('.').collect();

    for i in 0..a.len().max(b.len()) {
        let lhs = a.get(i).copied().unwrap_or("");
        let rhs = b.get(i).copied().unwrap_or("");
        match compare_component(lhs, rhs) {
            Ordering::Equal => continue,
            decided => return decided,
        }
    }

    Ordering::Equal
}

/// Reduce a component to its canonical digit string: strip leading zeros,
/// coerce anything non-numeric (or empty) to "0".
fn canonical(component: &str) -> &str {
    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return "0";
    }
    let stripped = component.trim_start_matches('0');
    if stripped.is_empty() { "0" } else { stripped }
}

/// Numeric-string comparison: a longer canonical digit string is the larger
/// number, equal lengths fall back to lexicographic order. Avoids any
/// fixed-width integer parse, so component magnitude is unbounded.
fn compare_component(a: &str, b: &str) -> Ordering {
    let (a, b) = (canonical(a), canonical(b));
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
