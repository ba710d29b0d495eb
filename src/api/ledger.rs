use crate::auth::auth::AuthUser;
use crate::model::ledger_entry::{LedgerEntry, rounded_balance};
use crate::policy;
use crate::service::accrual;
use crate::utils::chain_cache;
use actix_web::{HttpResponse, Responder, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LedgerQuery {
    #[schema(example = 42)]
    /// Defaults to the caller; someone else's ledger needs view authority
    pub user_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct BalanceResponse {
    #[schema(example = 42)]
    pub user_id: u64,
    /// Raw ledger sum; what the validator compares against
    #[schema(example = "5.25", value_type = String)]
    pub balance: Decimal,
    /// Rounded up to the nearest whole day for display
    #[schema(example = "6", value_type = String)]
    pub balance_days: Decimal,
}

/// SUM over the append-only ledger. No rounding here.
pub async fn current_balance(pool: &MySqlPool, user_id: u64) -> Result<Decimal, sqlx::Error> {
    let sum: Option<Decimal> =
        sqlx::query_scalar("SELECT SUM(amount) FROM time_off_ledger_entries WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

    Ok(sum.unwrap_or(Decimal::ZERO))
}

/// Resolve the ledger target and check the caller may read it.
async fn authorize_target(
    actor: &policy::Actor,
    target: u64,
    pool: &MySqlPool,
) -> actix_web::Result<bool> {
    if target == actor.user_id {
        return Ok(true);
    }

    let ancestors = chain_cache::management_chain(pool, target).await.map_err(|e| {
        tracing::error!(error = %e, target, "Failed to resolve management chain");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(policy::can_view(actor, target, &ancestors))
}

/// PTO balance
#[utoipa::path(
    get,
    path = "/api/v1/ledger/balance",
    params(LedgerQuery),
    responses(
        (status = 200, description = "Current PTO balance", body = BalanceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Ledger"
)]
pub async fn get_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LedgerQuery>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    let target = query.user_id.unwrap_or(actor.user_id);

    if !authorize_target(&actor, target, pool.get_ref()).await? {
        return Ok(HttpResponse::Forbidden().json(serde_json::json!({
            "error": "You are not authorized to perform this action."
        })));
    }

    let balance = current_balance(pool.get_ref(), target).await.map_err(|e| {
        tracing::error!(error = %e, target, "Failed to compute PTO balance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(BalanceResponse {
        user_id: target,
        balance,
        balance_days: rounded_balance(balance),
    }))
}

/// Ledger entry history
#[utoipa::path(
    get,
    path = "/api/v1/ledger/entries",
    params(LedgerQuery),
    responses(
        (status = 200, description = "Ledger entries, newest first", body = [LedgerEntry]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Ledger"
)]
pub async fn list_entries(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LedgerQuery>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    let target = query.user_id.unwrap_or(actor.user_id);

    if !authorize_target(&actor, target, pool.get_ref()).await? {
        return Ok(HttpResponse::Forbidden().json(serde_json::json!({
            "error": "You are not authorized to perform this action."
        })));
    }

    let entries = sqlx::query_as::<_, LedgerEntry>(
        r#"
        SELECT id, user_id, entry_type, amount, effective_date, notes,
               source_type, source_id, created_at
        FROM time_off_ledger_entries
        WHERE user_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(target)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, target, "Failed to fetch ledger entries");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(entries))
}

/// Run the monthly accrual (Admin)
#[utoipa::path(
    post,
    path = "/api/v1/ledger/accruals",
    responses(
        (status = 200, description = "Accrual entries created", body = Object, example = json!({
            "message": "Monthly PTO accrual complete",
            "entries_created": 4
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Ledger"
)]
pub async fn run_accrual(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let created = accrual::run_monthly_accrual(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Monthly accrual run failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Monthly PTO accrual complete",
        "entries_created": created
    })))
}
