//! Inspection code → training label taxonomy.
//!
//! Lookup goes from most to least specific: exact code, 3-char prefix,
//! 2-char prefix. Codes that already are a canonical label pass through.

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const UNKNOWN_LABEL: &str = "UNKNOWN";
/// Reserved for "no damage" samples.
pub const NONE_LABEL: &str = "NONE";

/// Prefix lengths tried after the exact lookup, longest first.
const PREFIX_LENGTHS: [usize; 2] = [3, 2];

const CODE_TABLE: &[(&str, &str)] = &[
    // Wurzeln
    ("BAA", "WURZELN"),
    ("BAB", "WURZELN"),
    ("BAC", "WURZELN"),
    ("BAD", "WURZELN"),
    ("BAE", "WURZELN"),
    // Risse
    ("BAF", "RISS"),
    ("BAG", "RISS"),
    ("BAH", "RISS"),
    ("BAI", "RISS"),
    ("BAJ", "RISS"),
    ("BAK", "RISS"),
    // Versatz
    ("BBA", "VERSATZ"),
    ("BBB", "VERSATZ"),
    ("BBC", "VERSATZ"),
    ("BBD", "VERSATZ"),
    // Anschlüsse
    ("BCA", "ANSCHLUSS"),
    ("BCB", "ANSCHLUSS"),
    ("BCC", "ANSCHLUSS"),
    ("BCD", "ANSCHLUSS"),
    // Ablagerungen
    ("BDA", "ABLAGERUNG"),
    ("BDB", "ABLAGERUNG"),
    ("BDC", "ABLAGERUNG"),
    ("BDD", "ABLAGERUNG"),
    // Deformation
    ("BEA", "DEFORMATION"),
    ("BEB", "DEFORMATION"),
    ("BEC", "DEFORMATION"),
    // Korrosion
    ("BFA", "KORROSION"),
    ("BFB", "KORROSION"),
];

static CODE_TO_LABEL: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| CODE_TABLE.iter().copied().collect());

/// Map an inspection code such as `BAB` or `BAFa` to its training label.
pub fn label_for_code(code: &str) -> &'static str {
    let code = code.trim().to_uppercase();
    if code.is_empty() {
        return UNKNOWN_LABEL;
    }

    if let Some(label) = CODE_TO_LABEL.get(code.as_str()) {
        return *label;
    }

    for len in PREFIX_LENGTHS {
        if let Some(prefix) = code.get(..len) {
            if let Some(label) = CODE_TO_LABEL.get(prefix) {
                return *label;
            }
        }
    }

    if code == NONE_LABEL {
        return NONE_LABEL;
    }
    CODE_TABLE
        .iter()
        .map(|(_, label)| *label)
        .find(|label| *label == code)
        .unwrap_or(UNKNOWN_LABEL)
}

/// Trim and uppercase; a missing or blank label becomes `UNKNOWN`.
pub fn normalize_label(raw: Option<&str>) -> String {
    match raw.map(|l| l.trim().to_uppercase()) {
        Some(label) if !label.is_empty() => label,
        _ => UNKNOWN_LABEL.to_string(),
    }
}
