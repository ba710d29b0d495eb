use crate::api::dashboard::ManagerDashboardResponse;
use crate::api::ledger::{BalanceResponse, LedgerQuery};
use crate::api::time_off_request::{
    CreateTimeOffRequest, DecisionReq, TimeOffFilter, TimeOffListResponse, TimeOffRequestDetail,
    UpdateTimeOffRequest,
};
use crate::api::user::{AssignManagerReq, UserResponse};
use crate::model::approval::Approval;
use crate::model::ledger_entry::LedgerEntry;
use crate::model::time_off_request::RequestStatus;
use crate::service::validation::Violation;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Time Off Management API",
        version = "1.0.0",
        description = r#"
## Time Off Management System

This API manages employee time-off requests end to end: submission with
policy validation, manager/admin approval workflows, and a running PTO
balance ledger.

### Key Features
- **Time Off Requests**
  - Submit, update, and view requests validated against date sanity,
    overlap, advance-notice, max-duration, and PTO balance rules
- **Approval Workflow**
  - Approve/deny pending requests with an immutable audit record and
    email notification
- **Manager Dashboard**
  - Direct reports for managers; a two-level view for admins
- **PTO Ledger**
  - Append-only accrual/usage entries and balance queries

### Security
Endpoints are protected using **JWT Bearer authentication**. Approval
authority is limited to admins and the request owner's direct manager.

### Response Format
- JSON-based RESTful responses
- Field-tagged validation errors for form feedback

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::time_off_request::list_requests,
        crate::api::time_off_request::get_request,
        crate::api::time_off_request::create_request,
        crate::api::time_off_request::update_request,
        crate::api::time_off_request::approve_request,
        crate::api::time_off_request::deny_request,

        crate::api::dashboard::manager_dashboard,

        crate::api::user::list_users,
        crate::api::user::get_user,
        crate::api::user::assign_manager,

        crate::api::ledger::get_balance,
        crate::api::ledger::list_entries,
        crate::api::ledger::run_accrual
    ),
    components(
        schemas(
            CreateTimeOffRequest,
            UpdateTimeOffRequest,
            DecisionReq,
            TimeOffFilter,
            TimeOffRequestDetail,
            TimeOffListResponse,
            RequestStatus,
            Violation,
            Approval,
            ManagerDashboardResponse,
            UserResponse,
            AssignManagerReq,
            LedgerQuery,
            LedgerEntry,
            BalanceResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "TimeOff", description = "Time off request APIs"),
        (name = "Dashboard", description = "Manager/admin aggregate views"),
        (name = "Users", description = "User directory and hierarchy APIs"),
        (name = "Ledger", description = "PTO ledger APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
