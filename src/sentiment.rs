use std::collections::HashMap;

use crate::keywords;
use crate::models::{CallRecord, CallSentiment, SentimentPoint, Severity};

pub fn label_for_score(score: u8) -> &'static str {
    if score >= 70 {
        "positive"
    } else if score >= 50 {
        "neutral"
    } else if score >= 30 {
        "negative"
    } else {
        "very_negative"
    }
}

fn keyword_point(call: &CallRecord) -> SentimentPoint {
    let hit = keywords::scan_churn(&call.transcript);
    let score: i32 = if !hit.found {
        85
    } else {
        75 - match hit.severity {
            Severity::High => 30,
            Severity::Medium => 15,
            Severity::Low => 5,
        }
    };
    let score = score.clamp(0, 100) as u8;
    SentimentPoint {
        call_id: Some(call.call_id),
        timestamp: call.started_at,
        score,
        sentiment: label_for_score(score).to_string(),
        reasoning: None,
        churn_indicators: Vec::new(),
    }
}

/// One sentiment point per call, chronological. When `analyses` is present
/// (a successful LLM pass) each point carries the AI-derived fields verbatim;
/// otherwise the transcript keyword scan drives the score.
pub fn build_journey(
    calls: &[CallRecord],
    analyses: Option<&[CallSentiment]>,
) -> Vec<SentimentPoint> {
    let by_call: HashMap<i64, &CallSentiment> = analyses
        .unwrap_or_default()
        .iter()
        .map(|analysis| (analysis.call_id, analysis))
        .collect();

    let mut points: Vec<SentimentPoint> = calls
        .iter()
        .map(|call| match by_call.get(&call.call_id) {
            Some(analysis) => SentimentPoint {
                call_id: Some(call.call_id),
                timestamp: call.started_at,
                score: analysis.score.min(100),
                sentiment: analysis.sentiment.clone(),
                reasoning: (!analysis.reasoning.is_empty()).then(|| analysis.reasoning.clone()),
                churn_indicators: analysis.churn_indicators.clone(),
            },
            None => keyword_point(call),
        })
        .collect();

    points.sort_by_key(|point| point.timestamp);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn call(call_id: i64, hours_ago: i64, transcript: &str) -> CallRecord {
        let started_at = Utc::now() - Duration::hours(hours_ago);
        CallRecord {
            call_id,
            customer_id: "CUST-001".to_string(),
            started_at,
            ended_at: started_at + Duration::minutes(12),
            call_reason: "technical_support".to_string(),
            transcript: transcript.to_string(),
        }
    }

    #[test]
    fn keyword_journey_scores_by_severity() {
        let calls = vec![
            call(1, 3, "everything works, thanks"),
            call(2, 2, "I am frustrated with the outage"),
            call(3, 1, "cancel my account"),
        ];
        let journey = build_journey(&calls, None);
        assert_eq!(journey.len(), 3);
        assert_eq!(journey[0].score, 85);
        assert_eq!(journey[0].sentiment, "positive");
        assert_eq!(journey[1].score, 60);
        assert_eq!(journey[1].sentiment, "neutral");
        assert_eq!(journey[2].score, 45);
        assert_eq!(journey[2].sentiment, "negative");
    }

    #[test]
    fn journey_is_chronological_regardless_of_fetch_order() {
        // Fetched newest-first, as the data source returns them.
        let calls = vec![call(3, 1, "ok"), call(2, 5, "ok"), call(1, 9, "ok")];
        let journey = build_journey(&calls, None);
        let ids: Vec<i64> = journey.iter().filter_map(|p| p.call_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn keyword_journey_is_deterministic() {
        let calls = vec![call(1, 4, "worst service ever"), call(2, 2, "fine now")];
        assert_eq!(build_journey(&calls, None), build_journey(&calls, None));
    }

    #[test]
    fn ai_analyses_carry_through_verbatim() {
        let calls = vec![call(7, 2, "cancel everything")];
        let analyses = vec![CallSentiment {
            call_id: 7,
            call_number: 1,
            score: 22,
            sentiment: "very_negative".to_string(),
            reasoning: "explicit cancellation demand".to_string(),
            churn_indicators: vec!["cancellation request".to_string()],
        }];
        let journey = build_journey(&calls, Some(&analyses));
        assert_eq!(journey[0].score, 22);
        assert_eq!(journey[0].sentiment, "very_negative");
        assert_eq!(
            journey[0].reasoning.as_deref(),
            Some("explicit cancellation demand")
        );
        assert_eq!(journey[0].churn_indicators, vec!["cancellation request"]);
    }

    #[test]
    fn calls_missing_from_analyses_use_keyword_score() {
        let calls = vec![call(1, 2, "all good"), call(2, 1, "all good")];
        let analyses = vec![CallSentiment {
            call_id: 1,
            call_number: 1,
            score: 40,
            sentiment: "negative".to_string(),
            reasoning: String::new(),
            churn_indicators: Vec::new(),
        }];
        let journey = build_journey(&calls, Some(&analyses));
        assert_eq!(journey[0].score, 40);
        assert_eq!(journey[1].score, 85);
    }

    #[test]
    fn label_bands() {
        assert_eq!(label_for_score(70), "positive");
        assert_eq!(label_for_score(69), "neutral");
        assert_eq!(label_for_score(50), "neutral");
        assert_eq!(label_for_score(49), "negative");
        assert_eq!(label_for_score(30), "negative");
        assert_eq!(label_for_score(29), "very_negative");
    }
}
