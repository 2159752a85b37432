use crate::models::Severity;

pub struct KeywordTier {
    pub severity: Severity,
    pub keywords: &'static [&'static str],
}

// Tiers must be ordered highest severity first: the first tier with any
// match wins and lower tiers are not scanned.
pub const CHURN_TIERS: &[KeywordTier] = &[
    KeywordTier {
        severity: Severity::High,
        keywords: &[
            "cancel",
            "canceling",
            "disconnect",
            "terminate",
            "switching",
            "competitor",
            "terrible",
            "worst",
            "done",
            "fed up",
        ],
    },
    KeywordTier {
        severity: Severity::Medium,
        keywords: &[
            "frustrated",
            "upset",
            "angry",
            "disappointed",
            "unhappy",
            "problem",
            "issue",
            "complaint",
        ],
    },
    KeywordTier {
        severity: Severity::Low,
        keywords: &["concerned", "worried", "question", "wondering", "confused"],
    },
];

// Reduced single-tier list used by the batch screener.
pub const BATCH_KEYWORDS: &[&str] = &[
    "cancel",
    "canceling",
    "disconnect",
    "terminate",
    "switching",
    "competitor",
    "terrible",
    "worst",
];

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordMatch {
    pub found: bool,
    pub keywords: Vec<String>,
    pub severity: Severity,
}

impl KeywordMatch {
    fn none() -> Self {
        KeywordMatch {
            found: false,
            keywords: Vec::new(),
            severity: Severity::Low,
        }
    }
}

pub fn scan(text: &str, tiers: &[KeywordTier]) -> KeywordMatch {
    if text.is_empty() {
        return KeywordMatch::none();
    }
    let lower = text.to_lowercase();
    for tier in tiers {
        let hits: Vec<String> = tier
            .keywords
            .iter()
            .copied()
            .filter(|keyword| lower.contains(*keyword))
            .map(str::to_string)
            .collect();
        if !hits.is_empty() {
            return KeywordMatch {
                found: true,
                keywords: hits,
                severity: tier.severity,
            };
        }
    }
    KeywordMatch::none()
}

pub fn scan_churn(text: &str) -> KeywordMatch {
    scan(text, CHURN_TIERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_transcript_is_high_severity() {
        let hit = scan_churn("I want to cancel my service, this is terrible");
        assert!(hit.found);
        assert_eq!(hit.severity, Severity::High);
        assert_eq!(hit.keywords, vec!["cancel", "terrible"]);
    }

    #[test]
    fn higher_tier_match_suppresses_lower_tiers() {
        let hit = scan_churn("so frustrated, I will cancel");
        assert_eq!(hit.severity, Severity::High);
        // Only the winning tier's hits are reported.
        assert_eq!(hit.keywords, vec!["cancel"]);
    }

    #[test]
    fn medium_tier_wins_when_no_high_match() {
        let hit = scan_churn("I am frustrated and a bit worried");
        assert_eq!(hit.severity, Severity::Medium);
        assert_eq!(hit.keywords, vec!["frustrated"]);
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let hit = scan_churn("CANCELLING my plan today");
        assert!(hit.found);
        assert_eq!(hit.severity, Severity::High);
        assert!(hit.keywords.contains(&"cancel".to_string()));
    }

    #[test]
    fn empty_text_matches_nothing() {
        let hit = scan_churn("");
        assert!(!hit.found);
        assert!(hit.keywords.is_empty());
        assert_eq!(hit.severity, Severity::Low);
    }

    #[test]
    fn clean_text_matches_nothing() {
        let hit = scan_churn("thanks for the quick help today");
        assert!(!hit.found);
    }
}
