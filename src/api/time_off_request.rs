use crate::auth::auth::AuthUser;
use crate::model::time_off_request::{RequestStatus, TimeOffRequest};
use crate::model::time_off_type::{TimeOffType, policy_for};
use crate::policy::{self, ListScope};
use crate::service::decision::{self, DecisionError};
use crate::service::validation::{CandidateRequest, ExistingRequest, validate};
use crate::utils::chain_cache;
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateTimeOffRequest {
    #[schema(example = 1)]
    pub time_off_type_id: u64,
    #[schema(example = "2026-01-15", format = "date", value_type = String)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-01-20", format = "date", value_type = String)]
    pub end_date: Option<NaiveDate>,
    #[schema(example = "Family vacation to Hawaii.")]
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateTimeOffRequest {
    #[schema(example = 1)]
    pub time_off_type_id: Option<u64>,
    #[schema(example = "2026-01-15", format = "date", value_type = String)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-01-20", format = "date", value_type = String)]
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct DecisionReq {
    #[schema(example = "Enjoy!")]
    pub comments: Option<String>,
}

/// A request serialized for clients: the row plus the names the UI needs.
#[derive(Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct TimeOffRequestDetail {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = "Jane Smith")]
    pub user_name: String,
    #[schema(example = 7, nullable = true)]
    pub manager_id: Option<u64>,
    #[schema(example = "Manager User", nullable = true)]
    pub manager_name: Option<String>,
    #[schema(example = 1)]
    pub time_off_type_id: u64,
    #[schema(example = "Vacation")]
    pub time_off_type_name: String,
    #[schema(example = "2026-01-15", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-20", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family vacation to Hawaii.")]
    pub reason: String,
    #[schema(example = "pending")]
    pub status: RequestStatus,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct TimeOffFilter {
    #[schema(example = "pending")]
    /// Filter by request status
    pub status: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct TimeOffListResponse {
    pub data: Vec<TimeOffRequestDetail>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

pub(crate) const DETAIL_SELECT: &str = r#"
    SELECT r.id, r.user_id, u.name AS user_name,
           u.manager_id AS manager_id, m.name AS manager_name,
           r.time_off_type_id, t.name AS time_off_type_name,
           r.start_date, r.end_date, r.reason, r.status, r.created_at
    FROM time_off_requests r
    JOIN users u ON u.id = r.user_id
    LEFT JOIN users m ON m.id = u.manager_id
    JOIN time_off_types t ON t.id = r.time_off_type_id
"#;

fn internal(context: &'static str) -> impl Fn(sqlx::Error) -> actix_web::Error {
    move |e| {
        tracing::error!(error = %e, context, "Database error");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    }
}

fn forbidden() -> HttpResponse {
    HttpResponse::Forbidden().json(json!({
        "error": "You are not authorized to perform this action."
    }))
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "error": "Time off request not found"
    }))
}

async fn fetch_detail(
    pool: &MySqlPool,
    request_id: u64,
) -> Result<Option<TimeOffRequestDetail>, sqlx::Error> {
    let sql = format!("{DETAIL_SELECT} WHERE r.id = ?");
    sqlx::query_as::<_, TimeOffRequestDetail>(&sql)
        .bind(request_id)
        .fetch_optional(pool)
        .await
}

async fn fetch_type(
    pool: &MySqlPool,
    type_id: u64,
) -> Result<Option<TimeOffType>, sqlx::Error> {
    sqlx::query_as::<_, TimeOffType>("SELECT id, name FROM time_off_types WHERE id = ?")
        .bind(type_id)
        .fetch_optional(pool)
        .await
}

/// Everything the validator reads for one user: their other requests and
/// their current ledger balance.
async fn validation_context(
    pool: &MySqlPool,
    user_id: u64,
) -> Result<(Vec<ExistingRequest>, rust_decimal::Decimal), sqlx::Error> {
    let existing = sqlx::query_as::<_, ExistingRequest>(
        "SELECT id, start_date, end_date FROM time_off_requests WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let balance = super::ledger::current_balance(pool, user_id).await?;

    Ok((existing, balance))
}

/* =========================
Create time off request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/time-off",
    request_body(
        content = CreateTimeOffRequest,
        description = "Time off request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Request created", body = TimeOffRequestDetail),
        (status = 422, description = "Validation failed", body = Object, example = json!({
            "errors": [{"field": "start_date", "message": "cannot be in the past"}]
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "TimeOff"
)]
pub async fn create_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateTimeOffRequest>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();

    // Always true today; kept as the single authorization seam for create.
    if !policy::can_create(&actor) {
        return Ok(forbidden());
    }

    let time_off_type = fetch_type(pool.get_ref(), payload.time_off_type_id)
        .await
        .map_err(internal("fetch time off type"))?;

    let Some(time_off_type) = time_off_type else {
        return Ok(HttpResponse::UnprocessableEntity().json(json!({
            "errors": [{"field": "time_off_type", "message": "must exist"}]
        })));
    };

    let (existing, balance) = validation_context(pool.get_ref(), actor.user_id)
        .await
        .map_err(internal("load validation context"))?;

    let candidate = CandidateRequest {
        id: None,
        start_date: payload.start_date,
        end_date: payload.end_date,
        reason: payload.reason.clone(),
    };

    let type_policy = policy_for(&time_off_type.name);
    let today = Utc::now().date_naive();

    let violations = validate(&candidate, &existing, balance, &time_off_type.name, &type_policy, today);
    if !violations.is_empty() {
        return Ok(HttpResponse::UnprocessableEntity().json(json!({ "errors": violations })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO time_off_requests
            (user_id, time_off_type_id, start_date, end_date, reason, status)
        VALUES (?, ?, ?, ?, ?, 'pending')
        "#,
    )
    .bind(actor.user_id)
    .bind(time_off_type.id)
    .bind(candidate.start_date)
    .bind(candidate.end_date)
    .bind(candidate.reason.as_deref().map(str::trim))
    .execute(pool.get_ref())
    .await
    .map_err(internal("create time off request"))?;

    match fetch_detail(pool.get_ref(), result.last_insert_id())
        .await
        .map_err(internal("fetch created request"))?
    {
        Some(detail) => Ok(HttpResponse::Created().json(detail)),
        None => Ok(HttpResponse::InternalServerError().json(json!({
            "error": "Internal Server Error"
        }))),
    }
}

/* =========================
Update time off request
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/time-off/{request_id}",
    params(
        ("request_id" = u64, Path, description = "ID of the time off request to update")
    ),
    request_body = UpdateTimeOffRequest,
    responses(
        (status = 200, description = "Request updated", body = TimeOffRequestDetail),
        (status = 404, description = "Request not found"),
        (status = 422, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "TimeOff"
)]
pub async fn update_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateTimeOffRequest>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    let request_id = path.into_inner();

    let row = sqlx::query_as::<_, TimeOffRequest>(
        r#"
        SELECT id, user_id, time_off_type_id, start_date, end_date, reason, status, created_at
        FROM time_off_requests
        WHERE id = ?
        "#,
    )
    .bind(request_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(internal("fetch time off request"))?;

    let Some(row) = row else {
        return Ok(not_found());
    };

    if !policy::can_update(&actor, row.user_id) {
        return Ok(forbidden());
    }

    // Decided requests are frozen; only the workflow ever touches status.
    if !row.status.is_pending() {
        return Ok(HttpResponse::UnprocessableEntity().json(json!({
            "errors": [{
                "field": "status",
                "message": format!("Cannot update a request that is already {}", row.status)
            }]
        })));
    }

    let type_id = payload.time_off_type_id.unwrap_or(row.time_off_type_id);

    let time_off_type = fetch_type(pool.get_ref(), type_id)
        .await
        .map_err(internal("fetch time off type"))?;

    let Some(time_off_type) = time_off_type else {
        return Ok(HttpResponse::UnprocessableEntity().json(json!({
            "errors": [{"field": "time_off_type", "message": "must exist"}]
        })));
    };

    let (existing, balance) = validation_context(pool.get_ref(), row.user_id)
        .await
        .map_err(internal("load validation context"))?;

    let candidate = CandidateRequest {
        id: Some(row.id),
        start_date: payload.start_date.or(Some(row.start_date)),
        end_date: payload.end_date.or(Some(row.end_date)),
        reason: payload.reason.clone().or(Some(row.reason.clone())),
    };

    let type_policy = policy_for(&time_off_type.name);
    let today = Utc::now().date_naive();

    let violations = validate(&candidate, &existing, balance, &time_off_type.name, &type_policy, today);
    if !violations.is_empty() {
        return Ok(HttpResponse::UnprocessableEntity().json(json!({ "errors": violations })));
    }

    sqlx::query(
        r#"
        UPDATE time_off_requests
        SET time_off_type_id = ?, start_date = ?, end_date = ?, reason = ?
        WHERE id = ?
        "#,
    )
    .bind(time_off_type.id)
    .bind(candidate.start_date)
    .bind(candidate.end_date)
    .bind(candidate.reason.as_deref().map(str::trim))
    .bind(request_id)
    .execute(pool.get_ref())
    .await
    .map_err(internal("update time off request"))?;

    match fetch_detail(pool.get_ref(), request_id)
        .await
        .map_err(internal("fetch updated request"))?
    {
        Some(detail) => Ok(HttpResponse::Ok().json(detail)),
        None => Ok(not_found()),
    }
}

/* =========================
Show a single request
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/time-off/{request_id}",
    params(
        ("request_id" = u64, Path, description = "ID of the time off request to fetch")
    ),
    responses(
        (status = 200, description = "Request found", body = TimeOffRequestDetail),
        (status = 404, description = "Request not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "TimeOff"
)]
pub async fn get_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();
    let request_id = path.into_inner();

    let detail = fetch_detail(pool.get_ref(), request_id)
        .await
        .map_err(internal("fetch time off request"))?;

    let Some(detail) = detail else {
        return Ok(not_found());
    };

    // View authority climbs the owner's whole chain, so resolve it once.
    let ancestors = chain_cache::management_chain(pool.get_ref(), detail.user_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = detail.user_id, "Failed to resolve management chain");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if !policy::can_view(&actor, detail.user_id, &ancestors) {
        return Ok(forbidden());
    }

    Ok(HttpResponse::Ok().json(detail))
}

/* =========================
List requests (scoped)
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/time-off",
    params(TimeOffFilter),
    responses(
        (status = 200, description = "Paginated request list", body = TimeOffListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "TimeOff"
)]
pub async fn list_requests(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<TimeOffFilter>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let status_filter = query.status.as_deref().map(str::to_lowercase);
    if let Some(status) = status_filter.as_deref() {
        if status.parse::<RequestStatus>().is_err() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "error": "Invalid status filter. Allowed: pending, approved, rejected"
            })));
        }
    }

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let ListScope::OwnedBy(user_id) = policy::list_scope(&actor) {
        where_sql.push_str(" AND r.user_id = ?");
        args.push(FilterValue::U64(user_id));
    }

    if let Some(status) = status_filter.as_deref() {
        where_sql.push_str(" AND r.status = ?");
        args.push(FilterValue::Str(status));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM time_off_requests r{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q
        .fetch_one(pool.get_ref())
        .await
        .map_err(internal("count time off requests"))?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        "{DETAIL_SELECT}{} ORDER BY r.created_at DESC LIMIT ? OFFSET ?",
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, TimeOffRequestDetail>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let requests = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(internal("fetch time off requests"))?;

    Ok(HttpResponse::Ok().json(TimeOffListResponse {
        data: requests,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/* =========================
Approve / deny
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/time-off/{request_id}/approve",
    params(
        ("request_id" = u64, Path, description = "ID of the time off request to approve")
    ),
    request_body = DecisionReq,
    responses(
        (status = 200, description = "Request approved", body = Object, example = json!({
            "request": {"id": 1, "status": "approved"},
            "approval": {"id": 1, "approver_id": 7, "comments": "Enjoy!"}
        })),
        (status = 404, description = "Request not found"),
        (status = 422, description = "Request already decided"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "TimeOff"
)]
pub async fn approve_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<DecisionReq>,
) -> actix_web::Result<impl Responder> {
    decide_request(auth, pool, path.into_inner(), "approve", payload.into_inner().comments).await
}

#[utoipa::path(
    put,
    path = "/api/v1/time-off/{request_id}/deny",
    params(
        ("request_id" = u64, Path, description = "ID of the time off request to deny")
    ),
    request_body = DecisionReq,
    responses(
        (status = 200, description = "Request denied", body = Object, example = json!({
            "request": {"id": 1, "status": "rejected"},
            "approval": {"id": 1, "approver_id": 7, "comments": "Insufficient coverage"}
        })),
        (status = 404, description = "Request not found"),
        (status = 422, description = "Request already decided"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "TimeOff"
)]
pub async fn deny_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<DecisionReq>,
) -> actix_web::Result<impl Responder> {
    decide_request(auth, pool, path.into_inner(), "deny", payload.into_inner().comments).await
}

async fn decide_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    request_id: u64,
    decision_input: &str,
    comments: Option<String>,
) -> actix_web::Result<HttpResponse> {
    let actor = auth.actor();

    // Coarse authorization first; the workflow re-checks as a safety net.
    let owner_id: Option<u64> =
        sqlx::query_scalar("SELECT user_id FROM time_off_requests WHERE id = ?")
            .bind(request_id)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(internal("fetch request owner"))?;

    let Some(owner_id) = owner_id else {
        return Ok(not_found());
    };

    let owner_manager_id: Option<u64> =
        sqlx::query_scalar::<_, Option<u64>>("SELECT manager_id FROM users WHERE id = ?")
            .bind(owner_id)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(internal("fetch owner manager"))?
            .flatten();

    if !policy::can_approve_or_deny(&actor, owner_manager_id) {
        return Ok(forbidden());
    }

    match decision::decide(pool.get_ref(), request_id, &actor, decision_input, comments).await {
        Ok(outcome) => Ok(HttpResponse::Ok().json(json!({
            "request": outcome.request,
            "approval": outcome.approval
        }))),
        Err(e @ (DecisionError::InvalidDecision(_) | DecisionError::InvalidStatus { .. })) => {
            Ok(HttpResponse::UnprocessableEntity().json(json!({ "errors": [e.to_string()] })))
        }
        Err(DecisionError::NotFound) => Ok(not_found()),
        Err(DecisionError::Unauthorized) => Ok(forbidden()),
        Err(DecisionError::Internal) => Ok(HttpResponse::InternalServerError().json(json!({
            "errors": ["An unexpected error occurred"]
        }))),
    }
}
