use tracing::warn;

use crate::domain::ports::{Mailer, OutboundEmail};
use crate::domain::user::User;

pub const ACCOUNT_READY_SUBJECT: &str = "Your Dedicated Account Number is Ready!";

/// HTML body for the "dedicated account ready" notification.
pub fn account_ready_email(full_name: &str) -> String {
    format!(
        "<p>Dear {full_name},</p>\
         <p>We're excited to inform you that your dedicated account number has \
         been successfully generated!</p>\
         <p>This new account number is designed to make funding your Kinta \
         wallet even faster and more convenient. Your new dedicated account \
         details are now visible in your dashboard.</p>\
         <p>Thank you for choosing Kinta! If you have any questions, please \
         don't hesitate to reach out to our support team.</p>\
         <p>Best regards,<br>The Kinta Team</p>"
    )
}

/// Sends the account-ready notification. Fire and forget: a transport
/// failure is logged and never propagated or retried.
pub async fn send_account_ready(mailer: &dyn Mailer, user: &User) {
    let email = OutboundEmail {
        recipients: vec![user.email.clone()],
        html_body: account_ready_email(&user.full_name),
        subject: ACCOUNT_READY_SUBJECT.to_string(),
        reply_to: None,
    };
    if let Err(e) = mailer.send(email).await {
        warn!(user_id = %user.id, "failed to send account-ready email: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_is_personalized() {
        let body = account_ready_email("Ada Obi");
        assert!(body.contains("Dear Ada Obi,"));
        assert!(body.contains("Kinta"));
    }
}
