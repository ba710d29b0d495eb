use derive_more::Display;
use sqlx::MySqlPool;

use crate::model::approval::Approval;
use crate::model::time_off_request::{RequestStatus, TimeOffRequest};
use crate::policy::Actor;
use crate::service::notification;

/// The two legal transitions out of `pending`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Decision {
    Approve,
    Deny,
}

impl Decision {
    /// Accepts the synonyms callers actually send, case-insensitively.
    pub fn parse(input: &str) -> Result<Self, DecisionError> {
        match input.trim().to_lowercase().as_str() {
            "approve" | "approved" => Ok(Decision::Approve),
            "deny" | "denied" | "reject" | "rejected" => Ok(Decision::Deny),
            other => Err(DecisionError::InvalidDecision(other.to_string())),
        }
    }

    pub fn target_status(self) -> RequestStatus {
        match self {
            Decision::Approve => RequestStatus::Approved,
            Decision::Deny => RequestStatus::Rejected,
        }
    }
}

#[derive(Debug, Display, PartialEq)]
pub enum DecisionError {
    #[display(fmt = "Invalid decision: {}. Must be 'approve' or 'deny'", _0)]
    InvalidDecision(String),
    #[display(fmt = "Cannot {} a request that is already {}", decision, current)]
    InvalidStatus {
        decision: String,
        current: RequestStatus,
    },
    #[display(fmt = "Time off request not found")]
    NotFound,
    #[display(fmt = "Service called without proper authorization")]
    Unauthorized,
    #[display(fmt = "An unexpected error occurred")]
    Internal,
}

impl std::error::Error for DecisionError {}

pub struct DecisionOutcome {
    pub request: TimeOffRequest,
    pub approval: Approval,
}

fn internal(e: sqlx::Error) -> DecisionError {
    tracing::error!(error = %e, "decision transaction failed");
    DecisionError::Internal
}

/// Apply an approve/deny decision to a pending request.
///
/// The status change and the approval record are written in one transaction;
/// `SELECT ... FOR UPDATE` serializes concurrent decisions on the same row,
/// so the loser finds the request no longer pending. The notification goes
/// out only after commit and is fire-and-forget.
///
/// Coarse authorization belongs to the caller (see `policy`); the re-check
/// here only catches callers that skipped it.
pub async fn decide(
    pool: &MySqlPool,
    request_id: u64,
    approver: &Actor,
    decision_input: &str,
    comments: Option<String>,
) -> Result<DecisionOutcome, DecisionError> {
    let decision_word = decision_input.trim().to_lowercase();
    let decision = Decision::parse(&decision_word)?;

    let mut tx = pool.begin().await.map_err(internal)?;

    let request = sqlx::query_as::<_, TimeOffRequest>(
        r#"
        SELECT id, user_id, time_off_type_id, start_date, end_date, reason, status, created_at
        FROM time_off_requests
        WHERE id = ?
        FOR UPDATE
        "#,
    )
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(internal)?;

    let mut request = request.ok_or(DecisionError::NotFound)?;

    if !request.status.is_pending() {
        return Err(DecisionError::InvalidStatus {
            decision: decision_word,
            current: request.status,
        });
    }

    let (owner_manager_id, owner_email): (Option<u64>, String) =
        sqlx::query_as("SELECT manager_id, email FROM users WHERE id = ?")
            .bind(request.user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(internal)?;

    if !(approver.role.is_admin() || owner_manager_id == Some(approver.user_id)) {
        tracing::warn!(
            approver_id = approver.user_id,
            request_id,
            "decision service called without proper authorization"
        );
        return Err(DecisionError::Unauthorized);
    }

    let new_status = decision.target_status();

    sqlx::query("UPDATE time_off_requests SET status = ? WHERE id = ?")
        .bind(new_status)
        .bind(request_id)
        .execute(&mut *tx)
        .await
        .map_err(internal)?;

    let inserted = sqlx::query(
        "INSERT INTO approvals (time_off_request_id, approver_id, comments) VALUES (?, ?, ?)",
    )
    .bind(request_id)
    .bind(approver.user_id)
    .bind(&comments)
    .execute(&mut *tx)
    .await
    .map_err(internal)?;

    let approval = sqlx::query_as::<_, Approval>(
        r#"
        SELECT id, time_off_request_id, approver_id, comments, created_at
        FROM approvals
        WHERE id = ?
        "#,
    )
    .bind(inserted.last_insert_id())
    .fetch_one(&mut *tx)
    .await
    .map_err(internal)?;

    tx.commit().await.map_err(internal)?;

    request.status = new_status;

    notification::queue_status_update_email(&request, &owner_email);

    Ok(DecisionOutcome { request, approval })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approve_synonyms_normalize() {
        for input in ["approve", "approved", "APPROVE", "  Approved "] {
            assert_eq!(Decision::parse(input).unwrap(), Decision::Approve);
        }
    }

    #[test]
    fn deny_synonyms_normalize() {
        for input in ["deny", "denied", "reject", "rejected", "Reject"] {
            assert_eq!(Decision::parse(input).unwrap(), Decision::Deny);
        }
    }

    #[test]
    fn anything_else_is_an_invalid_decision() {
        let err = Decision::parse("maybe").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid decision: maybe. Must be 'approve' or 'deny'"
        );
    }

    #[test]
    fn decisions_map_to_terminal_statuses() {
        assert_eq!(Decision::Approve.target_status(), RequestStatus::Approved);
        assert_eq!(Decision::Deny.target_status(), RequestStatus::Rejected);
    }

    #[test]
    fn invalid_status_message_names_the_current_status() {
        let err = DecisionError::InvalidStatus {
            decision: "deny".into(),
            current: RequestStatus::Approved,
        };
        assert_eq!(err.to_string(), "Cannot deny a request that is already approved");
    }
}
