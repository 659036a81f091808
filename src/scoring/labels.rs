// src/scoring/labels.rs

/// Domain terms whose presence marks a profile as maternal/neonatal capable
/// for bootstrap labelling.
pub const CAPABILITY_KEYWORDS: [&str; 7] = [
    "maternal",
    "neonatal",
    "ob-gyn",
    "pregnancy",
    "delivery",
    "midwife",
    "icu",
];

/// Heuristic positive label: the lower-cased text contains any capability
/// keyword as a substring. Not human-verified.
pub fn bootstrap_label(text: &str) -> bool {
    let lowered = text.to_lowercase();
    CAPABILITY_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_label_is_case_insensitive_substring() {
        assert!(bootstrap_label("Comprehensive MATERNAL care"));
        assert!(bootstrap_label("24x7 NICU and labour ward"));
        assert!(bootstrap_label("Ob-Gyn outpatient clinic"));
        assert!(!bootstrap_label("General medicine, dental"));
        assert!(!bootstrap_label(""));
    }
}
