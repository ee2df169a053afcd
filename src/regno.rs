//! Registration number format check.
//!
//! A registration number is `YY` (21-24), a branch class (`B` or `M`), a two-letter
//! department code and a four-digit serial, e.g. `22BCE1234`.

use regex::Regex;
use std::sync::OnceLock;

/// Hint shown next to the search field while the input does not validate.
pub const FORMAT_HINT: &str = "Format: YYBXX0000 (YY: 21-24, B: Branch, XX: Dept)";

static PATTERN: OnceLock<Regex> = OnceLock::new();

fn pattern() -> &'static Regex {
    PATTERN.get_or_init(|| {
        Regex::new(r"^(21|22|23|24)[BM][A-Z]{2}[0-9]{4}$").expect("registration number pattern")
    })
}

/// Case-sensitive, whole-string check. Callers upper-case user input first.
pub fn is_valid(reg_no: &str) -> bool {
    pattern().is_match(reg_no)
}

/// Trim and upper-case raw operator input.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}
