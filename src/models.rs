use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub call_id: i64,
    pub customer_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub call_reason: String,
    pub transcript: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    pub id: i64,
    pub username: String,
    pub platform: String,
    pub comment: String,
    pub location: String,
    pub timestamp: DateTime<Utc>,
    pub category: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    TranscriptKeyword,
    RepeatIssue,
    CallFrequency,
    SocialNegative,
    SentimentDecline,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChurnSignal {
    pub signal_type: SignalType,
    pub severity: Severity,
    pub evidence: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub call_id: Option<i64>,
    pub posts: Vec<SocialPost>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CallHistory {
    pub total_calls: usize,
    pub technical_calls: usize,
    pub billing_calls: usize,
    pub recent_call_times: Vec<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentPoint {
    pub call_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub score: u8,
    pub sentiment: String,
    pub reasoning: Option<String>,
    pub churn_indicators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerProfile {
    pub customer_id: String,
    pub name: String,
    pub location: String,
    pub service_plan: String,
    pub account_status: String,
}

/// One per-call sentiment analysis, either LLM-derived or keyword fallback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallSentiment {
    pub call_id: i64,
    pub call_number: usize,
    pub score: u8,
    pub sentiment: String,
    pub reasoning: String,
    pub churn_indicators: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionStrategy {
    pub root_cause: String,
    pub recommended_actions: Vec<String>,
    pub talking_points: Vec<String>,
    #[serde(default)]
    pub estimated_cost: f64,
    #[serde(default)]
    pub customer_lifetime_value: f64,
    #[serde(default)]
    pub success_probability: f64,
}

#[derive(Debug, Clone)]
pub struct ChurnAssessment {
    pub profile: CustomerProfile,
    pub account_value: u32,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub signals: Vec<ChurnSignal>,
    pub sentiment_journey: Vec<SentimentPoint>,
    pub call_history: CallHistory,
    pub retention_strategy: Option<RetentionStrategy>,
}

/// Aggregate call activity for one customer, produced by the batch SQL path.
#[derive(Debug, Clone)]
pub struct CustomerActivity {
    pub customer_id: String,
    pub total_calls: i64,
    pub technical_calls: i64,
    pub combined_transcripts: String,
    pub last_call: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtRiskCustomer {
    pub customer_id: String,
    pub name: String,
    pub location: String,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub primary_issue: String,
    pub account_value: u32,
    pub last_activity: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenSummary {
    pub total_customers: usize,
    pub analyzed: usize,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
    pub revenue_at_risk: u64,
}

#[derive(Debug, Clone)]
pub struct ScreenReport {
    pub summary: ScreenSummary,
    pub at_risk: Vec<AtRiskCustomer>,
}
