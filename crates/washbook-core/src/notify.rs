//! Notifier trait — the outbound-mail dispatcher the auth subsystem
//! consumes.
//!
//! Delivery failures surface as [`WashbookError::Delivery`]. Whether a
//! failure is fatal is the caller's decision: the forgot-password flow
//! awaits delivery and rolls back on failure, while welcome mail is
//! best-effort.

use std::future::Future;

use crate::error::WashbookResult;

/// An outbound message. The reset secret travels only inside `html`,
/// embedded in a link; it never appears in an API response body.
#[derive(Debug, Clone)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub html: String,
}

pub trait Notifier: Send + Sync {
    fn send(&self, notification: Notification) -> impl Future<Output = WashbookResult<()>> + Send;
}

/// Render the shared transactional-email layout: a heading, a short
/// paragraph, and one call-to-action button.
pub fn action_email(title: &str, body: &str, button_title: &str, link: &str) -> String {
    format!(
        r#"<div style="font-family:sans-serif;max-width:600px;margin:0 auto;padding:24px">
  <h2 style="color:#1a1a2e">{title}</h2>
  <p style="color:#444;line-height:1.6">{body}</p>
  <a href="{link}" style="display:inline-block;padding:12px 24px;background:#0f3460;color:#fff;text-decoration:none;border-radius:4px">{button_title}</a>
  <p style="color:#999;font-size:12px;margin-top:32px">If the button does not work, copy this link into your browser:<br>{link}</p>
</div>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_email_embeds_link_and_copy() {
        let html = action_email(
            "Reset Password",
            "You asked for a reset.",
            "Reset",
            "https://app.example.com/reset/abc123",
        );
        assert!(html.contains("Reset Password"));
        assert!(html.contains("You asked for a reset."));
        // Link appears in the button and in the fallback copy line.
        assert_eq!(html.matches("https://app.example.com/reset/abc123").count(), 2);
    }
}
