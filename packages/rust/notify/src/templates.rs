//! HTML email templates, one heading and subject per submission kind.

use std::fmt::Write as _;

use leadline_shared::{ContactIdentity, SubmissionKind};

use crate::OutgoingEmail;

/// Everything a notification email shows.
///
/// `fields` are the same labelled values written into the CRM note;
/// `summary` carries the full questionnaire note when there is one.
#[derive(Debug, Clone)]
pub struct Notification {
    pub kind: SubmissionKind,
    pub contact: ContactIdentity,
    pub person_id: Option<u64>,
    /// e.g. `Lead 3f2a...` or `Deal 812`; `None` when record creation failed.
    pub record: Option<String>,
    pub fields: Vec<(String, String)>,
    pub summary: Option<String>,
}

fn heading(kind: SubmissionKind) -> &'static str {
    match kind {
        SubmissionKind::Contact => "New Contact Inquiry",
        SubmissionKind::LivingTrustLanding => "New Living Trust Lead",
        SubmissionKind::AgentApplication => "New Agent Application",
        SubmissionKind::LivingTrustQuestionnaire => "Living Trust Questionnaire Submitted",
        SubmissionKind::LifeInsuranceApplication => "Life Insurance Application Submitted",
    }
}

pub fn subject(notification: &Notification) -> String {
    format!("{}: {}", heading(notification.kind), notification.contact.name)
}

/// Build the full email for a notification.
pub fn compose(notification: &Notification) -> OutgoingEmail {
    OutgoingEmail {
        subject: subject(notification),
        html: render_html(notification),
    }
}

pub fn render_html(n: &Notification) -> String {
    let mut html = String::with_capacity(2048);
    html.push_str("<div style=\"font-family: Arial, sans-serif; max-width: 640px;\">\n");
    let _ = writeln!(
        html,
        "<h2 style=\"color: #1e3a5f;\">{}</h2>",
        escape_html(heading(n.kind))
    );

    html.push_str("<table cellpadding=\"6\" style=\"border-collapse: collapse;\">\n");
    row(&mut html, "Name", &n.contact.name);
    if let Some(email) = &n.contact.email {
        row(&mut html, "Email", email);
    }
    if let Some(phone) = &n.contact.phone {
        row(&mut html, "Phone", phone);
    }
    for (label, value) in &n.fields {
        row(&mut html, label, value);
    }
    html.push_str("</table>\n");

    if let Some(summary) = &n.summary {
        html.push_str("<h3 style=\"color: #1e3a5f;\">Full Submission</h3>\n");
        let _ = writeln!(
            html,
            "<pre style=\"white-space: pre-wrap; font-family: inherit;\">{}</pre>",
            escape_html(summary)
        );
    }

    let crm = match (n.person_id, &n.record) {
        (Some(person), Some(record)) => format!("Pipedrive person {person}, {record}"),
        (Some(person), None) => format!("Pipedrive person {person} (no record created)"),
        _ => "Not recorded in Pipedrive".to_string(),
    };
    let _ = writeln!(
        html,
        "<p style=\"color: #666; font-size: 12px;\">{}</p>",
        escape_html(&crm)
    );
    html.push_str("</div>\n");
    html
}

fn row(html: &mut String, label: &str, value: &str) {
    let _ = writeln!(
        html,
        "<tr><td style=\"font-weight: bold;\">{}</td><td>{}</td></tr>",
        escape_html(label),
        escape_html(value)
    );
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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
