use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::keywords;
use crate::models::{
    CallHistory, CallRecord, CallSentiment, ChurnSignal, CustomerProfile, Severity, SignalType,
    SocialPost,
};

const NEGATIVE_CATEGORIES: &[&str] =
    &["Service Issue", "Billing Issue", "Customer Service Complaint"];

const REPEAT_ISSUE_MIN: usize = 3;
const REPEAT_ISSUE_HIGH: usize = 5;
const FREQUENCY_MIN: usize = 8;
const FREQUENCY_HIGH: usize = 12;

pub fn call_history(calls: &[CallRecord]) -> CallHistory {
    let mut recent: Vec<DateTime<Utc>> = calls.iter().map(|call| call.started_at).collect();
    recent.sort_by(|a, b| b.cmp(a));
    recent.truncate(5);

    CallHistory {
        total_calls: calls.len(),
        technical_calls: calls
            .iter()
            .filter(|call| call.call_reason == "technical_support")
            .count(),
        billing_calls: calls
            .iter()
            .filter(|call| call.call_reason == "billing_inquiry")
            .count(),
        recent_call_times: recent,
    }
}

/// Collects churn signals for one customer's lookback window. `ai_analyses`
/// is only passed when a batched LLM sentiment pass actually succeeded; the
/// keyword fallback never contributes extra signals.
pub fn collect_signals(
    calls: &[CallRecord],
    profile: &CustomerProfile,
    posts: &[SocialPost],
    since: DateTime<Utc>,
    lookback_hours: i64,
    ai_analyses: Option<&[CallSentiment]>,
) -> Vec<ChurnSignal> {
    let mut signals = Vec::new();

    for call in calls {
        let hit = keywords::scan_churn(&call.transcript);
        if hit.found {
            signals.push(ChurnSignal {
                signal_type: SignalType::TranscriptKeyword,
                severity: hit.severity,
                evidence: format!(
                    "Used words: \"{}\" in call about {}",
                    hit.keywords.join("\", \""),
                    call.call_reason
                ),
                timestamp: Some(call.started_at),
                call_id: Some(call.call_id),
                posts: Vec::new(),
            });
        }
    }

    let mut by_reason: HashMap<&str, usize> = HashMap::new();
    for call in calls {
        *by_reason.entry(call.call_reason.as_str()).or_insert(0) += 1;
    }
    let mut reasons: Vec<(&str, usize)> = by_reason.into_iter().collect();
    reasons.sort();
    for (reason, count) in reasons {
        if count >= REPEAT_ISSUE_MIN {
            signals.push(ChurnSignal {
                signal_type: SignalType::RepeatIssue,
                severity: if count >= REPEAT_ISSUE_HIGH {
                    Severity::High
                } else {
                    Severity::Medium
                },
                evidence: format!(
                    "{count} calls about {} - possible unresolved problem",
                    reason.replace('_', " ")
                ),
                timestamp: None,
                call_id: None,
                posts: Vec::new(),
            });
        }
    }

    if calls.len() >= FREQUENCY_MIN {
        signals.push(ChurnSignal {
            signal_type: SignalType::CallFrequency,
            severity: if calls.len() >= FREQUENCY_HIGH {
                Severity::High
            } else {
                Severity::Medium
            },
            evidence: format!(
                "{} calls in {lookback_hours} hours - unusually high contact frequency",
                calls.len()
            ),
            timestamp: None,
            call_id: None,
            posts: Vec::new(),
        });
    }

    // Trend over the keyword-scored journey; earliest vs latest call.
    let journey = crate::sentiment::build_journey(calls, None);
    if let (Some(first), Some(last)) = (journey.first(), journey.last()) {
        if first.score >= last.score + 20 {
            signals.push(ChurnSignal {
                signal_type: SignalType::SentimentDecline,
                severity: if first.score >= last.score + 40 {
                    Severity::High
                } else {
                    Severity::Medium
                },
                evidence: format!(
                    "Sentiment declined from {} to {} across {} calls",
                    first.score,
                    last.score,
                    journey.len()
                ),
                timestamp: Some(last.timestamp),
                call_id: last.call_id,
                posts: Vec::new(),
            });
        }
    }

    let matching: Vec<&SocialPost> = posts
        .iter()
        .filter(|post| {
            post.timestamp >= since
                && post.location.contains(&profile.location)
                && NEGATIVE_CATEGORIES.contains(&post.category.as_str())
        })
        .collect();
    if !matching.is_empty() {
        signals.push(ChurnSignal {
            signal_type: SignalType::SocialNegative,
            severity: if matching.len() >= 3 {
                Severity::High
            } else {
                Severity::Medium
            },
            evidence: format!(
                "{} negative social media posts from {} area match timeframe",
                matching.len(),
                profile.location
            ),
            timestamp: None,
            call_id: None,
            posts: matching.into_iter().take(3).cloned().collect(),
        });
    }

    for analysis in ai_analyses.unwrap_or_default() {
        if analysis.score < 50 && !analysis.churn_indicators.is_empty() {
            signals.push(ChurnSignal {
                signal_type: SignalType::TranscriptKeyword,
                severity: if analysis.score < 30 {
                    Severity::High
                } else {
                    Severity::Medium
                },
                evidence: format!(
                    "AI flagged call #{}: {} ({})",
                    analysis.call_number,
                    analysis.churn_indicators.join(", "),
                    analysis.reasoning
                ),
                timestamp: None,
                call_id: Some(analysis.call_id),
                posts: Vec::new(),
            });
        }
    }

    signals
}
