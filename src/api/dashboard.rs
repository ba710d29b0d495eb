use crate::api::time_off_request::{DETAIL_SELECT, TimeOffRequestDetail};
use crate::auth::auth::AuthUser;
use crate::model::time_off_request::RequestStatus;
use crate::policy;
use crate::service::hierarchy::OrgChart;
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct ManagerDashboardResponse {
    pub pending: Vec<TimeOffRequestDetail>,
    pub approved: Vec<TimeOffRequestDetail>,
    pub rejected: Vec<TimeOffRequestDetail>,
}

/// Aggregate view for managers and admins. Managers see their direct
/// reports' requests; admins see two levels down (and no further).
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/manager",
    responses(
        (status = 200, description = "Requests of visible subordinates, grouped by status", body = ManagerDashboardResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Dashboard"
)]
pub async fn manager_dashboard(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let actor = auth.actor();

    if !policy::can_manage_dashboard(&actor) {
        return Ok(HttpResponse::Forbidden().json(json!({
            "error": "You are not authorized to view this page."
        })));
    }

    let chart = OrgChart::load(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to load org chart");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let visible = chart.visible_subordinates(actor.user_id, actor.role.is_admin());

    let mut response = ManagerDashboardResponse {
        pending: Vec::new(),
        approved: Vec::new(),
        rejected: Vec::new(),
    };

    if visible.is_empty() {
        return Ok(HttpResponse::Ok().json(response));
    }

    let placeholders = vec!["?"; visible.len()].join(", ");
    let sql = format!(
        "{DETAIL_SELECT} WHERE r.user_id IN ({placeholders}) ORDER BY r.created_at DESC"
    );

    let mut query = sqlx::query_as::<_, TimeOffRequestDetail>(&sql);
    for user_id in &visible {
        query = query.bind(*user_id);
    }

    let requests = query.fetch_all(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch dashboard requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    for request in requests {
        match request.status {
            RequestStatus::Pending => response.pending.push(request),
            RequestStatus::Approved => response.approved.push(request),
            RequestStatus::Rejected => response.rejected.push(request),
        }
    }

    Ok(HttpResponse::Ok().json(response))
}
