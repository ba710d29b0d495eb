use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::model::ledger_entry::{EntryType, LedgerSource};

/// Days granted to every user per accrual run.
pub const ACCRUAL_AMOUNT: Decimal = Decimal::ONE;

/// Append one accrual ledger entry per user, sourced from the user itself.
/// Scheduling (and not running it twice in a month) is the caller's job.
pub async fn run_monthly_accrual(pool: &MySqlPool) -> Result<u64, sqlx::Error> {
    let today = Utc::now().date_naive();
    let notes = format!("Monthly PTO accrual for {}", today.format("%B %Y"));

    let user_ids: Vec<u64> = sqlx::query_scalar("SELECT id FROM users")
        .fetch_all(pool)
        .await?;

    let mut granted = 0u64;
    for user_id in user_ids {
        let (source_type, source_id) = LedgerSource::Accrual { user_id }.into_columns();

        sqlx::query(
            r#"
            INSERT INTO time_off_ledger_entries
                (user_id, entry_type, amount, effective_date, notes, source_type, source_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(EntryType::Accrual)
        .bind(ACCRUAL_AMOUNT)
        .bind(today)
        .bind(&notes)
        .bind(source_type)
        .bind(source_id)
        .execute(pool)
        .await?;

        granted += 1;
    }

    tracing::info!(users = granted, %notes, "monthly PTO accrual complete");

    Ok(granted)
}
