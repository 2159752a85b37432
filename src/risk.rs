use crate::models::{CallHistory, ChurnSignal, RiskLevel, Severity};

pub const HIGH_RISK_THRESHOLD: u8 = 70;
pub const MEDIUM_RISK_THRESHOLD: u8 = 40;

const HIGH_SIGNAL_WEIGHT: u32 = 30;
const MEDIUM_SIGNAL_WEIGHT: u32 = 15;
const LOW_SIGNAL_WEIGHT: u32 = 5;

pub fn score_risk(signals: &[ChurnSignal], history: &CallHistory) -> u8 {
    let mut score: u32 = 0;

    for signal in signals {
        score += match signal.severity {
            Severity::High => HIGH_SIGNAL_WEIGHT,
            Severity::Medium => MEDIUM_SIGNAL_WEIGHT,
            Severity::Low => LOW_SIGNAL_WEIGHT,
        };
    }

    // Frequency bonus uses the higher matching threshold only.
    if history.technical_calls > 5 {
        score += 20;
    } else if history.technical_calls > 3 {
        score += 10;
    }

    score.min(100) as u8
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        if score >= HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else if score >= MEDIUM_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn threshold(self) -> u8 {
        match self {
            RiskLevel::High => HIGH_RISK_THRESHOLD,
            RiskLevel::Medium => MEDIUM_RISK_THRESHOLD,
            RiskLevel::Low => 0,
        }
    }
}

const PLAN_VALUES: &[(&str, u32)] = &[
    ("enterprise", 5000),
    ("business", 3000),
    ("premium", 2000),
    ("standard", 1200),
    ("basic", 600),
];

const DEFAULT_PLAN_VALUE: u32 = 1200;

pub fn account_value(service_plan: &str) -> u32 {
    let plan = service_plan.to_lowercase();
    for (name, value) in PLAN_VALUES {
        if plan.contains(name) {
            return *value;
        }
    }
    DEFAULT_PLAN_VALUE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SignalType;

    fn signal(severity: Severity) -> ChurnSignal {
        ChurnSignal {
            signal_type: SignalType::TranscriptKeyword,
            severity,
            evidence: "test".to_string(),
            timestamp: None,
            call_id: None,
            posts: Vec::new(),
        }
    }

    fn history(total: usize, technical: usize) -> CallHistory {
        CallHistory {
            total_calls: total,
            technical_calls: technical,
            billing_calls: 0,
            recent_call_times: Vec::new(),
        }
    }

    #[test]
    fn frequency_bonus_alone_stays_low_risk() {
        let score = score_risk(&[], &history(6, 6));
        assert_eq!(score, 20);
        assert_eq!(RiskLevel::from_score(score), RiskLevel::Low);
    }

    #[test]
    fn frequency_bonus_uses_higher_threshold_only() {
        assert_eq!(score_risk(&[], &history(4, 4)), 10);
        assert_eq!(score_risk(&[], &history(6, 6)), 20);
        assert_eq!(score_risk(&[], &history(3, 3)), 0);
    }

    #[test]
    fn high_signals_clamp_at_one_hundred() {
        let signals = vec![
            signal(Severity::High),
            signal(Severity::High),
            signal(Severity::High),
        ];
        let score = score_risk(&signals, &history(6, 6));
        assert_eq!(score, 100);
        assert_eq!(RiskLevel::from_score(score), RiskLevel::High);
    }

    #[test]
    fn severity_weights_accumulate() {
        let signals = vec![
            signal(Severity::High),
            signal(Severity::Medium),
            signal(Severity::Low),
        ];
        assert_eq!(score_risk(&signals, &history(2, 0)), 50);
    }

    #[test]
    fn level_is_monotonic_in_score() {
        let mut previous = RiskLevel::from_score(0);
        for score in 0..=100u8 {
            let level = RiskLevel::from_score(score);
            assert!(level >= previous);
            previous = level;
        }
    }

    #[test]
    fn level_thresholds() {
        assert_eq!(RiskLevel::from_score(39), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(40), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(69), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(70), RiskLevel::High);
    }

    #[test]
    fn plan_value_matches_substring_case_insensitive() {
        assert_eq!(account_value("Enterprise Plus"), 5000);
        assert_eq!(account_value("basic mobile"), 600);
        assert_eq!(account_value("Family Bundle"), 1200);
    }
}
