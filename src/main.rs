use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

mod db;
mod keywords;
mod llm;
mod models;
mod report;
mod risk;
mod screen;
mod sentiment;
mod signals;
mod social;

use models::{ChurnAssessment, RiskLevel};
use social::SocialCache;

#[derive(Parser)]
#[command(name = "churnwatch")]
#[command(about = "Churn risk early warning over support call transcripts", long_about = None)]
struct Cli {
    /// Social media CSV snapshot correlated against customer locations
    #[arg(long, default_value = "data/social_media_data.csv")]
    social_csv: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import call transcripts from a CSV file
    ImportCalls {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Score churn risk for one customer
    Analyze {
        #[arg(long)]
        customer: String,
        #[arg(long, default_value_t = 720)]
        hours: i64,
        /// Augment scoring with per-call LLM sentiment analysis
        #[arg(long)]
        with_ai: bool,
        /// Generate a retention strategy when risk is medium or high
        #[arg(long)]
        retention: bool,
        /// Write the markdown report here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Screen all recently active customers for churn risk
    Screen {
        #[arg(long, default_value_t = 720)]
        hours: i64,
        #[arg(long, value_enum, default_value_t = RiskLevel::Medium)]
        risk_threshold: RiskLevel,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    let social = SocialCache::new(cli.social_csv.clone());

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::ImportCalls { csv } => {
            let inserted = db::import_calls(&pool, &csv).await?;
            println!("Inserted {inserted} calls from {}.", csv.display());
        }
        Commands::Analyze {
            customer,
            hours,
            with_ai,
            retention,
            out,
        } => {
            if customer.trim().is_empty() {
                bail!("customer id must not be empty");
            }
            let since = Utc::now() - Duration::hours(hours.max(1));

            let profile = db::fetch_customer(&pool, &customer)
                .await?
                .with_context(|| format!("customer {customer} not found"))?;
            let calls = db::fetch_calls(&pool, &customer, since).await?;
            info!(customer = %customer, calls = calls.len(), "analyzing churn risk");

            let client = if with_ai || retention {
                let client = llm::LlmClient::from_env();
                if client.is_none() && with_ai {
                    warn!("ANTHROPIC_API_KEY not set, using keyword fallback for sentiment");
                }
                client
            } else {
                None
            };

            // ai_pass is only set when the batched LLM call succeeded; the
            // fallback batch still feeds the per-call report section.
            let mut ai_pass = None;
            let mut call_sentiments = None;
            if with_ai {
                let (batch, from_llm) = llm::call_sentiments(client.as_ref(), &calls).await;
                if from_llm {
                    ai_pass = Some(batch.clone());
                }
                call_sentiments = Some(batch);
            }

            let signals = signals::collect_signals(
                &calls,
                &profile,
                social.posts(),
                since,
                hours,
                ai_pass.as_deref(),
            );
            let history = signals::call_history(&calls);
            let journey = sentiment::build_journey(&calls, ai_pass.as_deref());
            let risk_score = risk::score_risk(&signals, &history);
            let risk_level = RiskLevel::from_score(risk_score);
            let account_value = risk::account_value(&profile.service_plan);

            let mut retention_strategy = None;
            if retention && risk_level >= RiskLevel::Medium {
                if let Some(client) = &client {
                    match client
                        .retention_strategy(&profile, &signals, &history, account_value)
                        .await
                    {
                        Ok(strategy) => retention_strategy = Some(strategy),
                        Err(err) => {
                            warn!(error = %err, "retention strategy generation failed");
                        }
                    }
                }
            }

            let assessment = ChurnAssessment {
                profile,
                account_value,
                risk_score,
                risk_level,
                signals,
                sentiment_journey: journey,
                call_history: history,
                retention_strategy,
            };

            info!(
                customer = %customer,
                score = assessment.risk_score,
                level = %assessment.risk_level,
                "churn analysis complete"
            );

            let rendered = report::build_report(&assessment, call_sentiments.as_deref(), hours);
            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    println!("Report written to {}.", path.display());
                }
                None => print!("{rendered}"),
            }
        }
        Commands::Screen {
            hours,
            risk_threshold,
            limit,
        } => {
            let since = Utc::now() - Duration::hours(hours.max(1));
            let activity = db::fetch_call_activity(&pool, since).await?;
            let customer_ids: Vec<String> = activity
                .iter()
                .map(|row| row.customer_id.clone())
                .collect();
            let profiles = db::fetch_profiles(&pool, &customer_ids).await?;

            let outcome = screen::screen_batch(&activity, &profiles, hours, risk_threshold, limit);
            let summary = &outcome.summary;
            println!(
                "Screened {} customers with recent calls: {} high, {} medium, {} low risk; ${} revenue at risk.",
                summary.analyzed,
                summary.high_risk,
                summary.medium_risk,
                summary.low_risk,
                summary.revenue_at_risk
            );

            if outcome.at_risk.is_empty() {
                println!("No customers at or above {risk_threshold} risk.");
                return Ok(());
            }
            for customer in &outcome.at_risk {
                println!(
                    "- {} ({}, {}) score {} [{}] - {} (${}/year, last call {})",
                    customer.name,
                    customer.customer_id,
                    customer.location,
                    customer.risk_score,
                    customer.risk_level,
                    customer.primary_issue,
                    customer.account_value,
                    customer.last_activity.format("%Y-%m-%d %H:%M")
                );
            }
        }
    }

    Ok(())
}
