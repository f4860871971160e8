//! Core intake logic for Leadline.
//!
//! This crate turns a website [`Submission`](leadline_shared::Submission)
//! into CRM records: it classifies the submission, formats its note, routes it
//! to a Lead or a Deal, and wraps that in the [`IntakeService`] pipeline that
//! also stores applications, writes the audit log and sends the notification.

pub mod classify;
pub mod notes;
pub mod orchestrator;
pub mod pipeline;

pub use classify::{ANONYMOUS_NAME, Classification, classify, secondary_party};
pub use notes::{format_note, summary_fields};
pub use orchestrator::{Orchestrator, RecordId, RecordType, SubmitOutcome, route_for};
pub use pipeline::{IntakeReceipt, IntakeService, notification_for};
