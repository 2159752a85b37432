use std::fmt::Write;

use crate::models::{CallSentiment, ChurnAssessment};

pub fn build_report(
    assessment: &ChurnAssessment,
    call_sentiments: Option<&[CallSentiment]>,
    lookback_hours: i64,
) -> String {
    let mut output = String::new();
    let profile = &assessment.profile;

    let _ = writeln!(output, "# Churn Risk Assessment");
    let _ = writeln!(
        output,
        "Customer {} ({}) - last {} hours",
        profile.name, profile.customer_id, lookback_hours
    );
    let _ = writeln!(
        output,
        "Plan: {} | Location: {} | Status: {} | Est. value: ${}/year",
        profile.service_plan, profile.location, profile.account_status, assessment.account_value
    );
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "## Risk: {} ({}/100)",
        assessment.risk_level, assessment.risk_score
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Churn Signals");
    if assessment.signals.is_empty() {
        let _ = writeln!(output, "No churn signals in this window.");
    } else {
        for signal in &assessment.signals {
            let _ = writeln!(
                output,
                "- [{}] {}",
                signal.severity.to_string().to_uppercase(),
                signal.evidence
            );
            for post in &signal.posts {
                let _ = writeln!(
                    output,
                    "  - {} on {}: {}",
                    post.username, post.platform, post.comment
                );
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Sentiment Journey");
    if assessment.sentiment_journey.is_empty() {
        let _ = writeln!(output, "No calls in this window.");
    } else {
        for point in &assessment.sentiment_journey {
            let _ = write!(
                output,
                "- {}: {} ({})",
                point.timestamp.format("%Y-%m-%d %H:%M"),
                point.score,
                point.sentiment
            );
            if let Some(reasoning) = &point.reasoning {
                let _ = write!(output, " - {reasoning}");
            }
            let _ = writeln!(output);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Call History");
    let history = &assessment.call_history;
    let _ = writeln!(
        output,
        "{} calls total ({} technical, {} billing)",
        history.total_calls, history.technical_calls, history.billing_calls
    );
    for time in &history.recent_call_times {
        let _ = writeln!(output, "- {}", time.format("%Y-%m-%d %H:%M"));
    }

    if let Some(sentiments) = call_sentiments {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Per-Call Analysis");
        for analysis in sentiments {
            let _ = writeln!(
                output,
                "- Call #{} (id {}): {} ({}) - {}",
                analysis.call_number,
                analysis.call_id,
                analysis.score,
                analysis.sentiment,
                analysis.reasoning
            );
            if !analysis.churn_indicators.is_empty() {
                let _ = writeln!(
                    output,
                    "  Indicators: {}",
                    analysis.churn_indicators.join(", ")
                );
            }
        }
    }

    if let Some(strategy) = &assessment.retention_strategy {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Retention Strategy");
        let _ = writeln!(output, "Root cause: {}", strategy.root_cause);
        let _ = writeln!(output, "Actions:");
        for action in &strategy.recommended_actions {
            let _ = writeln!(output, "- {action}");
        }
        let _ = writeln!(output, "Talking points:");
        for point in &strategy.talking_points {
            let _ = writeln!(output, "- {point}");
        }
        let _ = writeln!(
            output,
            "Estimated cost ${:.0} against ${:.0} lifetime value; success probability {:.0}%",
            strategy.estimated_cost,
            strategy.customer_lifetime_value,
            strategy.success_probability * 100.0
        );
    }

    output
}
