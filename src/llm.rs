use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::keywords;
use crate::models::{
    CallHistory, CallRecord, CallSentiment, ChurnSignal, CustomerProfile, RetentionStrategy,
    Severity,
};
use crate::sentiment::label_for_score;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

// Per-call transcript budget in the batched prompt, in characters.
const TRANSCRIPT_BUDGET: usize = 1500;

// Hard deadline per Messages API request; a hung request must surface as an
// error so the keyword fallback can take over.
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    api_key: String,
    model: String,
}

impl LlmClient {
    /// Returns `None` when no API key is configured; the caller then takes
    /// the keyword fallback path.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())?;
        let model =
            std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Some(Self {
            http: build_http()?,
            api_key,
            model,
        })
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "messages": [{"role": "user", "content": prompt}],
        });

        let res = self
            .http
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .context("send completion request")?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            bail!("completion request failed: {status} - {text}");
        }

        let json: Value = res.json().await.context("decode completion response")?;
        json.pointer("/content/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("completion response missing text content"))
    }

    /// One batched request scoring every call; any failure is returned as an
    /// error so the caller can fall back atomically for the whole batch.
    pub async fn analyze_call_sentiments(
        &self,
        calls: &[CallRecord],
    ) -> Result<Vec<CallSentiment>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }
        let text = self.complete(&sentiment_prompt(calls), 2000).await?;
        parse_call_sentiments(&text, calls)
    }

    /// Best-effort retention plan for a medium/high-risk customer.
    pub async fn retention_strategy(
        &self,
        profile: &CustomerProfile,
        signals: &[ChurnSignal],
        history: &CallHistory,
        account_value: u32,
    ) -> Result<RetentionStrategy> {
        let prompt = retention_prompt(profile, signals, history, account_value);
        let text = self.complete(&prompt, 2000).await?;
        let payload = extract_json(&text).context("no JSON payload in retention response")?;
        serde_json::from_str(&payload).context("malformed retention strategy")
    }
}

fn build_http() -> Option<Client> {
    Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .ok()
}

/// Analyzes every call with the LLM when a client is available, falling back
/// to the deterministic keyword path for the whole batch on any failure.
/// The bool reports whether the LLM pass actually succeeded.
pub async fn call_sentiments(
    client: Option<&LlmClient>,
    calls: &[CallRecord],
) -> (Vec<CallSentiment>, bool) {
    if let Some(client) = client {
        match client.analyze_call_sentiments(calls).await {
            Ok(batch) => return (batch, true),
            Err(err) => {
                warn!(error = %err, "batched sentiment analysis failed, using keyword fallback");
            }
        }
    }
    (fallback_sentiments(calls), false)
}

/// Deterministic per-call sentiment from the keyword classifier. Never fails.
pub fn fallback_sentiments(calls: &[CallRecord]) -> Vec<CallSentiment> {
    calls
        .iter()
        .enumerate()
        .map(|(index, call)| {
            let hit = keywords::scan_churn(&call.transcript);
            let score = if !hit.found {
                75
            } else {
                match hit.severity {
                    Severity::Low => 65,
                    Severity::Medium => 50,
                    Severity::High => 25,
                }
            };
            let reasoning = if hit.found {
                format!("Transcript mentions: {}", hit.keywords.join(", "))
            } else {
                "No churn vocabulary in transcript".to_string()
            };
            CallSentiment {
                call_id: call.call_id,
                call_number: index + 1,
                score,
                sentiment: label_for_score(score).to_string(),
                reasoning,
                churn_indicators: hit.keywords,
            }
        })
        .collect()
}

fn truncated(transcript: &str) -> String {
    if transcript.chars().count() <= TRANSCRIPT_BUDGET {
        return transcript.to_string();
    }
    let cut: String = transcript.chars().take(TRANSCRIPT_BUDGET).collect();
    format!("{cut}...[truncated]")
}

fn sentiment_prompt(calls: &[CallRecord]) -> String {
    use std::fmt::Write;

    let mut prompt = String::from(
        "You are a telecom customer-support analyst. Score the customer's \
         sentiment in each of the following support calls.\n\n",
    );
    for (index, call) in calls.iter().enumerate() {
        let _ = write!(
            prompt,
            "Call {number} ({reason}, {date}):\n{transcript}\n\n",
            number = index + 1,
            reason = call.call_reason,
            date = call.started_at.format("%Y-%m-%d %H:%M"),
            transcript = truncated(&call.transcript),
        );
    }
    prompt.push_str(
        "Respond with ONLY a JSON array, one object per call in the same \
         order, shaped exactly like:\n\
         [{\"callNumber\": 1, \"score\": <0-100, 0 = very negative>, \
         \"sentiment\": \"<very_positive|positive|neutral|negative|very_negative>\", \
         \"reasoning\": \"<one sentence>\", \
         \"churnIndicators\": [\"<explicit churn signals, empty if none>\"]}]\n\
         No prose before or after the array.",
    );
    prompt
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCallSentiment {
    call_number: usize,
    score: f64,
    sentiment: String,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    churn_indicators: Option<Vec<String>>,
}

fn parse_call_sentiments(text: &str, calls: &[CallRecord]) -> Result<Vec<CallSentiment>> {
    let payload = extract_json(text).context("no JSON payload in completion")?;
    let raw: Vec<RawCallSentiment> =
        serde_json::from_str(&payload).context("malformed sentiment array")?;
    if raw.len() != calls.len() {
        bail!("expected {} call analyses, got {}", calls.len(), raw.len());
    }

    let mut seen = vec![false; calls.len()];
    let mut out = Vec::with_capacity(raw.len());
    for item in raw {
        let index = item
            .call_number
            .checked_sub(1)
            .filter(|index| *index < calls.len())
            .ok_or_else(|| anyhow!("call number {} out of range", item.call_number))?;
        if std::mem::replace(&mut seen[index], true) {
            bail!("duplicate analysis for call {}", item.call_number);
        }
        if !(0.0..=100.0).contains(&item.score) {
            bail!("score {} out of range for call {}", item.score, item.call_number);
        }
        out.push(CallSentiment {
            call_id: calls[index].call_id,
            call_number: item.call_number,
            score: item.score.round() as u8,
            sentiment: item.sentiment,
            reasoning: item.reasoning.unwrap_or_default(),
            churn_indicators: item.churn_indicators.unwrap_or_default(),
        });
    }
    out.sort_by_key(|analysis| analysis.call_number);
    Ok(out)
}

fn retention_prompt(
    profile: &CustomerProfile,
    signals: &[ChurnSignal],
    history: &CallHistory,
    account_value: u32,
) -> String {
    let summary: String = signals
        .iter()
        .map(|signal| format!("- {}: {}\n", signal.severity.to_string().to_uppercase(), signal.evidence))
        .collect();

    format!(
        "You are a customer retention expert analyzing a telecom customer at \
         risk of churning.\n\n\
         Customer Profile:\n\
         - Name: {name}\n\
         - Service Plan: {plan}\n\
         - Location: {location}\n\
         - Account Value: ${value}/year\n\n\
         Recent Activity:\n\
         - Total Calls: {total}\n\
         - Technical Support Calls: {technical}\n\
         - Billing Inquiry Calls: {billing}\n\n\
         Churn Risk Signals:\n{summary}\n\
         Provide a retention strategy in JSON format with:\n\
         {{\"rootCause\": \"<main reason for churn risk>\", \
         \"recommendedActions\": [\"<3-4 immediate actions>\"], \
         \"talkingPoints\": [\"<3-4 points for the outreach call>\"], \
         \"estimatedCost\": <dollars>, \
         \"customerLifetimeValue\": {clv}, \
         \"successProbability\": <0-1>}}\n\
         Focus on practical, actionable recommendations.",
        name = profile.name,
        plan = profile.service_plan,
        location = profile.location,
        value = account_value,
        total = history.total_calls,
        technical = history.technical_calls,
        billing = history.billing_calls,
        summary = summary,
        clv = account_value * 3,
    )
}

/// Extracts the first balanced JSON object or array from free text, which
/// may be wrapped in prose or markdown code fences.
pub fn extract_json(text: &str) -> Option<String> {
    let start = text.find(['{', '['])?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(text[start..start + offset + 1].to_string());
                }
            }
            _ => {}
        }
    }
    None
}
