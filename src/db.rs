use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};

use crate::models::{CallRecord, CustomerActivity, CustomerProfile};

// Per-customer row cap for a lookback fetch.
const CALL_FETCH_LIMIT: i64 = 50;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let customers = vec![
        (
            "CUST-1001",
            "Dana Flores",
            "Austin, TX",
            "Premium Fiber",
            "active",
        ),
        (
            "CUST-1002",
            "Marcus Webb",
            "Denver, CO",
            "Enterprise Plus",
            "active",
        ),
        (
            "CUST-1003",
            "Priya Raman",
            "Austin, TX",
            "Basic Mobile",
            "active",
        ),
    ];

    for (customer_id, name, location, plan, status) in customers {
        sqlx::query(
            r#"
            INSERT INTO support_analytics.customers
            (customer_id, customer_name, location, service_plan, account_status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (customer_id) DO UPDATE
            SET customer_name = EXCLUDED.customer_name,
                location = EXCLUDED.location,
                service_plan = EXCLUDED.service_plan,
                account_status = EXCLUDED.account_status
            "#,
        )
        .bind(customer_id)
        .bind(name)
        .bind(location)
        .bind(plan)
        .bind(status)
        .execute(pool)
        .await?;
    }

    let calls = vec![
        (
            "seed-001",
            "CUST-1001",
            30i64,
            "technical_support",
            "My internet keeps dropping every hour. This problem has been going on for a week and I am getting frustrated.",
        ),
        (
            "seed-002",
            "CUST-1001",
            52,
            "technical_support",
            "Still no fix for the outage. If this keeps up I will cancel and move to a competitor.",
        ),
        (
            "seed-003",
            "CUST-1001",
            80,
            "technical_support",
            "Third call about the same connection issue. Nobody calls me back.",
        ),
        (
            "seed-004",
            "CUST-1002",
            20,
            "billing_inquiry",
            "I was charged twice this month. Can you explain the extra line item on my invoice?",
        ),
        (
            "seed-005",
            "CUST-1002",
            140,
            "billing_inquiry",
            "The billing correction never showed up. I am disappointed with how this was handled.",
        ),
        (
            "seed-006",
            "CUST-1003",
            8,
            "account_management",
            "Just wondering whether my plan includes international roaming.",
        ),
    ];

    for (source_key, customer_id, hours_ago, reason, transcript) in calls {
        let started_at = Utc::now() - Duration::hours(hours_ago);
        sqlx::query(
            r#"
            INSERT INTO support_analytics.calls
            (customer_id, started_at, ended_at, call_reason, transcript, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(customer_id)
        .bind(started_at)
        .bind(started_at + Duration::minutes(14))
        .bind(reason)
        .bind(transcript)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn fetch_customer(
    pool: &PgPool,
    customer_id: &str,
) -> anyhow::Result<Option<CustomerProfile>> {
    let row = sqlx::query(
        "SELECT customer_id, customer_name, location, service_plan, account_status \
         FROM support_analytics.customers WHERE customer_id = $1",
    )
    .bind(customer_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| CustomerProfile {
        customer_id: row.get("customer_id"),
        name: row.get("customer_name"),
        location: row.get("location"),
        service_plan: row.get("service_plan"),
        account_status: row.get("account_status"),
    }))
}

pub async fn fetch_profiles(
    pool: &PgPool,
    customer_ids: &[String],
) -> anyhow::Result<Vec<CustomerProfile>> {
    let rows = sqlx::query(
        "SELECT customer_id, customer_name, location, service_plan, account_status \
         FROM support_analytics.customers WHERE customer_id = ANY($1)",
    )
    .bind(customer_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| CustomerProfile {
            customer_id: row.get("customer_id"),
            name: row.get("customer_name"),
            location: row.get("location"),
            service_plan: row.get("service_plan"),
            account_status: row.get("account_status"),
        })
        .collect())
}

pub async fn fetch_calls(
    pool: &PgPool,
    customer_id: &str,
    since: DateTime<Utc>,
) -> anyhow::Result<Vec<CallRecord>> {
    let rows = sqlx::query(
        "SELECT call_id, customer_id, started_at, ended_at, call_reason, transcript \
         FROM support_analytics.calls \
         WHERE customer_id = $1 AND started_at >= $2 \
         ORDER BY started_at DESC \
         LIMIT $3",
    )
    .bind(customer_id)
    .bind(since)
    .bind(CALL_FETCH_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| CallRecord {
            call_id: row.get("call_id"),
            customer_id: row.get("customer_id"),
            started_at: row.get("started_at"),
            ended_at: row.get("ended_at"),
            call_reason: row.get("call_reason"),
            transcript: row.get("transcript"),
        })
        .collect())
}

pub async fn fetch_call_activity(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> anyhow::Result<Vec<CustomerActivity>> {
    let rows = sqlx::query(
        "SELECT customer_id, \
                COUNT(*) AS total_calls, \
                COUNT(*) FILTER (WHERE call_reason = 'technical_support') AS technical_calls, \
                MAX(started_at) AS last_call, \
                STRING_AGG(transcript, ' ||| ') AS combined_transcripts \
         FROM support_analytics.calls \
         WHERE started_at >= $1 \
         GROUP BY customer_id \
         HAVING COUNT(*) >= 1",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| CustomerActivity {
            customer_id: row.get("customer_id"),
            total_calls: row.get("total_calls"),
            technical_calls: row.get("technical_calls"),
            combined_transcripts: row
                .get::<Option<String>, _>("combined_transcripts")
                .unwrap_or_default(),
            last_call: row.get("last_call"),
        })
        .collect())
}

pub async fn import_calls(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        customer_id: String,
        customer_name: String,
        location: String,
        service_plan: String,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        call_reason: String,
        transcript: String,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;
    let mut row_number = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        row_number += 1;

        sqlx::query(
            r#"
            INSERT INTO support_analytics.customers
            (customer_id, customer_name, location, service_plan)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (customer_id) DO UPDATE
            SET customer_name = EXCLUDED.customer_name,
                location = EXCLUDED.location,
                service_plan = EXCLUDED.service_plan
            "#,
        )
        .bind(&row.customer_id)
        .bind(&row.customer_name)
        .bind(&row.location)
        .bind(&row.service_plan)
        .execute(pool)
        .await?;

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}-{row_number}", row.customer_id));

        let result = sqlx::query(
            r#"
            INSERT INTO support_analytics.calls
            (customer_id, started_at, ended_at, call_reason, transcript, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(&row.customer_id)
        .bind(row.started_at)
        .bind(row.ended_at)
        .bind(&row.call_reason)
        .bind(&row.transcript)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
