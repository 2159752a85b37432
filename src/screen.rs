use std::collections::HashMap;

use crate::keywords::BATCH_KEYWORDS;
use crate::models::{
    AtRiskCustomer, CustomerActivity, CustomerProfile, RiskLevel, ScreenReport, ScreenSummary,
};
use crate::risk;

// The batch path is a deliberately coarser scoring policy than the
// single-customer risk scorer; the weights are independent.
const KEYWORD_WEIGHT: u32 = 25;
const HIGH_FREQUENCY_BONUS: u32 = 30;
const TECHNICAL_BONUS: u32 = 35;
const BILLING_BONUS: u32 = 25;

fn quick_churn_score(transcripts: &str) -> u32 {
    let lower = transcripts.to_lowercase();
    let hits = BATCH_KEYWORDS
        .iter()
        .filter(|keyword| lower.contains(**keyword))
        .count() as u32;
    (hits * KEYWORD_WEIGHT).min(100)
}

/// Screens all recently-active customers and returns the at-risk list,
/// filtered to `min_level`, sorted by score descending, truncated to `limit`.
pub fn screen_batch(
    activity: &[CustomerActivity],
    profiles: &[CustomerProfile],
    lookback_hours: i64,
    min_level: RiskLevel,
    limit: usize,
) -> ScreenReport {
    let by_id: HashMap<&str, &CustomerProfile> = profiles
        .iter()
        .map(|profile| (profile.customer_id.as_str(), profile))
        .collect();

    let mut at_risk: Vec<AtRiskCustomer> = Vec::new();
    let mut analyzed = 0usize;

    for row in activity {
        // Every row with recent calls counts as analyzed, even when the
        // profile join misses and no score can be produced.
        analyzed += 1;
        let Some(profile) = by_id.get(row.customer_id.as_str()) else {
            continue;
        };

        let mut score = quick_churn_score(&row.combined_transcripts);
        let mut primary_issue = String::from("General concerns");

        // Later rules overwrite the label; the score stays additive.
        if row.total_calls >= 5 {
            score += HIGH_FREQUENCY_BONUS;
            primary_issue = format!(
                "{} calls in {} days - high contact frequency",
                row.total_calls,
                lookback_hours / 24
            );
        }
        if row.technical_calls >= 3 {
            score += TECHNICAL_BONUS;
            primary_issue = "Recurring technical issues".to_string();
        }
        if row.total_calls - row.technical_calls >= 2 {
            score += BILLING_BONUS;
            primary_issue = "Billing concerns".to_string();
        }

        let score = score.min(100) as u8;
        if score < min_level.threshold() {
            continue;
        }

        at_risk.push(AtRiskCustomer {
            customer_id: profile.customer_id.clone(),
            name: profile.name.clone(),
            location: profile.location.clone(),
            risk_score: score,
            risk_level: RiskLevel::from_score(score),
            primary_issue,
            account_value: risk::account_value(&profile.service_plan),
            last_activity: row.last_call,
        });
    }

    let summary = ScreenSummary {
        total_customers: profiles.len(),
        analyzed,
        high_risk: at_risk
            .iter()
            .filter(|c| c.risk_level == RiskLevel::High)
            .count(),
        medium_risk: at_risk
            .iter()
            .filter(|c| c.risk_level == RiskLevel::Medium)
            .count(),
        low_risk: at_risk
            .iter()
            .filter(|c| c.risk_level == RiskLevel::Low)
            .count(),
        revenue_at_risk: at_risk
            .iter()
            .filter(|c| c.risk_level >= RiskLevel::Medium)
            .map(|c| u64::from(c.account_value))
            .sum(),
    };

    // Stable sort keeps input order among ties.
    at_risk.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
    at_risk.truncate(limit);

    ScreenReport { summary, at_risk }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn profile(customer_id: &str, plan: &str) -> CustomerProfile {
        CustomerProfile {
            customer_id: customer_id.to_string(),
            name: format!("Customer {customer_id}"),
            location: "Austin, TX".to_string(),
            service_plan: plan.to_string(),
            account_status: "active".to_string(),
        }
    }

    fn activity(
        customer_id: &str,
        total: i64,
        technical: i64,
        transcripts: &str,
    ) -> CustomerActivity {
        CustomerActivity {
            customer_id: customer_id.to_string(),
            total_calls: total,
            technical_calls: technical,
            combined_transcripts: transcripts.to_string(),
            last_call: Utc::now() - Duration::hours(5),
        }
    }

    #[test]
    fn keyword_hits_weigh_twenty_five_each() {
        assert_eq!(quick_churn_score("I will cancel, this is terrible"), 50);
        assert_eq!(quick_churn_score("nothing to see"), 0);
    }

    #[test]
    fn keyword_score_caps_at_one_hundred() {
        let text = "cancel disconnect terminate switching competitor terrible worst";
        assert_eq!(quick_churn_score(text), 100);
    }

    #[test]
    fn primary_issue_is_last_matching_rule() {
        // 6 total / 3 technical / 3 inferred billing: all three rules fire,
        // the billing label wins even though frequency fired first.
        let rows = vec![activity("A", 6, 3, "plain transcript")];
        let profiles = vec![profile("A", "Standard")];
        let report = screen_batch(&rows, &profiles, 720, RiskLevel::Low, 10);
        assert_eq!(report.at_risk[0].primary_issue, "Billing concerns");
        assert_eq!(report.at_risk[0].risk_score, 90);
        assert_eq!(report.at_risk[0].risk_level, RiskLevel::High);
    }

    #[test]
    fn technical_label_when_no_billing_calls() {
        let rows = vec![activity("A", 3, 3, "plain transcript")];
        let profiles = vec![profile("A", "Standard")];
        let report = screen_batch(&rows, &profiles, 720, RiskLevel::Low, 10);
        assert_eq!(report.at_risk[0].primary_issue, "Recurring technical issues");
        assert_eq!(report.at_risk[0].risk_score, 35);
    }

    #[test]
    fn threshold_excludes_scores_below_it() {
        // One keyword (25) + frequency (30) + billing (25) = 80; and a
        // customer at 65 (keyword 25 + frequency 30 + nothing else... use
        // technical-only 35 + frequency 30 = 65) stays out at the high bar.
        let rows = vec![
            activity("A", 5, 0, "cancel now"),
            activity("B", 5, 5, "plain transcript"),
        ];
        let profiles = vec![profile("A", "Standard"), profile("B", "Standard")];
        let report = screen_batch(&rows, &profiles, 720, RiskLevel::High, 10);
        assert_eq!(report.at_risk.len(), 1);
        assert_eq!(report.at_risk[0].customer_id, "A");
        assert_eq!(report.at_risk[0].risk_score, 80);
        // B scored 65, below the high threshold of 70.
        assert!(report.at_risk.iter().all(|c| c.risk_score >= 70));
    }

    #[test]
    fn limit_truncates_after_sorting() {
        let rows = vec![
            activity("A", 5, 0, ""),
            activity("B", 6, 3, ""),
            activity("C", 5, 3, "cancel"),
        ];
        let profiles = vec![
            profile("A", "Basic"),
            profile("B", "Premium"),
            profile("C", "Enterprise"),
        ];
        let report = screen_batch(&rows, &profiles, 720, RiskLevel::Low, 2);
        assert_eq!(report.at_risk.len(), 2);
        assert!(report.at_risk[0].risk_score >= report.at_risk[1].risk_score);
        assert_eq!(report.at_risk[0].customer_id, "C");
    }

    #[test]
    fn summary_counts_and_revenue_cover_the_filtered_set() {
        let rows = vec![
            activity("A", 6, 3, "cancel"), // 25+30+35+25 -> 100 high
            activity("B", 5, 0, ""),       // 30+25 -> 55 medium
            activity("C", 1, 0, ""),       // 0 low
        ];
        let profiles = vec![
            profile("A", "Enterprise Plus"),
            profile("B", "Business"),
            profile("C", "Basic"),
        ];
        let report = screen_batch(&rows, &profiles, 720, RiskLevel::Low, 10);
        assert_eq!(report.summary.total_customers, 3);
        assert_eq!(report.summary.analyzed, 3);
        assert_eq!(report.summary.high_risk, 1);
        assert_eq!(report.summary.medium_risk, 1);
        assert_eq!(report.summary.low_risk, 1);
        assert_eq!(report.summary.revenue_at_risk, 8000);
    }

    #[test]
    fn activity_without_profile_is_counted_but_not_scored() {
        let rows = vec![activity("GHOST", 9, 9, "cancel")];
        let report = screen_batch(&rows, &[], 720, RiskLevel::Low, 10);
        assert_eq!(report.summary.analyzed, 1);
        assert!(report.at_risk.is_empty());
    }

    #[test]
    fn analyzed_counts_every_active_row() {
        let rows = vec![
            activity("A", 6, 3, "cancel"),
            activity("ORPHAN", 2, 0, ""),
        ];
        let profiles = vec![profile("A", "Standard")];
        let report = screen_batch(&rows, &profiles, 720, RiskLevel::Low, 10);
        assert_eq!(report.summary.analyzed, 2);
        assert_eq!(report.at_risk.len(), 1);
    }
}
