//! Email templates.
//!
//! Each template renders its HTML body through `Display`; subject, sender
//! and a short metrics name come from [`EmailTemplate`]. Every interpolated
//! value is HTML-escaped.

use std::fmt::{self, Display};

/// Which configured sender address a template goes out from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    Onboarding,
    Notifications,
}

pub trait EmailTemplate: Display {
    /// Stable label used in logs and metrics.
    fn name(&self) -> &'static str;

    fn sender(&self) -> Sender;

    fn subject(&self) -> String;

    fn html(&self) -> String {
        self.to_string()
    }
}

const CARD_STYLE: &str = "font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; border: 1px solid #eee; border-radius: 10px;";
const HEADING_STYLE: &str = "color: #10b981;";
const RULE: &str = r#"<hr style="border: none; border-top: 1px solid #eee; margin: 20px 0;" />"#;
const FOOTER: &str = r#"<p style="color: #666; font-size: 12px;">Thank you for using JobToken.</p>"#;

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// =============================================================================
// Verification
// =============================================================================

/// Account verification email carrying a magic sign-in link.
pub struct VerificationEmail<'a> {
    pub link: &'a str,
}

impl Display for VerificationEmail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let link = escape_html(self.link);
        write!(
            f,
            r#"<div style="{card}">
  <h2 style="{heading}">Welcome to JobToken!</h2>
  <p>Please click the button below to verify your email address and start applying for jobs.</p>
  <a href="{link}" style="display: inline-block; background: #10b981; color: white; padding: 12px 24px; border-radius: 6px; text-decoration: none; font-weight: bold; margin: 20px 0;">Verify Email</a>
  <p style="color: #666; font-size: 14px;">If the button doesn't work, copy and paste this link into your browser:</p>
  <p style="color: #666; font-size: 12px; word-break: break-all;">{link}</p>
</div>"#,
            card = CARD_STYLE,
            heading = HEADING_STYLE,
            link = link,
        )
    }
}

impl EmailTemplate for VerificationEmail<'_> {
    fn name(&self) -> &'static str {
        "verification"
    }

    fn sender(&self) -> Sender {
        Sender::Onboarding
    }

    fn subject(&self) -> String {
        "Verify your JobToken account".to_string()
    }
}

// =============================================================================
// Application confirmation
// =============================================================================

/// Sent to a seeker after a successful application.
pub struct ApplicationConfirmation<'a> {
    pub job_title: Option<&'a str>,
}

impl Display for ApplicationConfirmation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = escape_html(self.job_title.unwrap_or("the position"));
        write!(
            f,
            r#"<div style="{card}">
  <h2 style="{heading}">Application Received!</h2>
  <p>Your application for <strong>{title}</strong> has been successfully submitted.</p>
  <p>The employer has been notified and will review your profile shortly.</p>
  {rule}
  {footer}
</div>"#,
            card = CARD_STYLE,
            heading = HEADING_STYLE,
            title = title,
            rule = RULE,
            footer = FOOTER,
        )
    }
}

impl EmailTemplate for ApplicationConfirmation<'_> {
    fn name(&self) -> &'static str {
        "application_confirmation"
    }

    fn sender(&self) -> Sender {
        Sender::Notifications
    }

    fn subject(&self) -> String {
        format!(
            "Application Confirmed: {}",
            self.job_title.unwrap_or("New Job")
        )
    }
}

// =============================================================================
// Application outcome
// =============================================================================

pub struct ShortlistedNotice<'a> {
    pub applicant_name: &'a str,
    pub job_title: &'a str,
    pub notes: Option<&'a str>,
}

impl Display for ShortlistedNotice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let note = match self.notes.map(str::trim) {
            Some(notes) if !notes.is_empty() => format!(
                "<p><strong>Employer Note:</strong> {}</p>",
                escape_html(notes)
            ),
            _ => String::new(),
        };

        write!(
            f,
            r#"<div style="{card}">
  <h2 style="{heading}">Great news, {name}!</h2>
  <p>The employer for <strong>'{title}'</strong> has shortlisted you. They will contact you shortly via this email.</p>
  {note}
  {rule}
  {footer}
</div>"#,
            card = CARD_STYLE,
            heading = HEADING_STYLE,
            name = escape_html(self.applicant_name),
            title = escape_html(self.job_title),
            note = note,
            rule = RULE,
            footer = FOOTER,
        )
    }
}

impl EmailTemplate for ShortlistedNotice<'_> {
    fn name(&self) -> &'static str {
        "shortlisted"
    }

    fn sender(&self) -> Sender {
        Sender::Notifications
    }

    fn subject(&self) -> String {
        format!("Great news: You've been shortlisted for {}", self.job_title)
    }
}

pub struct RejectedNotice<'a> {
    pub applicant_name: &'a str,
    pub job_title: &'a str,
}

impl Display for RejectedNotice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"<div style="{card}">
  <p>Hi {name},</p>
  <p>Thank you for applying to <strong>'{title}'</strong>. Unfortunately, the employer has decided to move forward with other candidates at this time.</p>
  <p>We wish you the best in your job search.</p>
  {rule}
  {footer}
</div>"#,
            card = CARD_STYLE,
            name = escape_html(self.applicant_name),
            title = escape_html(self.job_title),
            rule = RULE,
            footer = FOOTER,
        )
    }
}

impl EmailTemplate for RejectedNotice<'_> {
    fn name(&self) -> &'static str {
        "rejected"
    }

    fn sender(&self) -> Sender {
        Sender::Notifications
    }

    fn subject(&self) -> String {
        format!("Update on your application for {}", self.job_title)
    }
}
