//! Shared types, error model, and configuration for Leadline.
//!
//! This crate is the foundation depended on by all other Leadline crates.
//! It provides:
//! - [`LeadlineError`]: the unified error type
//! - Submission types ([`Submission`], [`TrustQuestionnaire`], [`LifeInsuranceForm`])
//! - Configuration ([`AppConfig`], [`CrmSettings`], [`EmailSettings`], config loading)

pub mod config;
pub mod error;
pub mod lenient;
pub mod life;
pub mod money;
pub mod trust;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrmSettings, DocumentConfig, EmailSettings, NotificationsConfig, PipedriveConfig,
    ServerConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{LeadlineError, Result};
pub use life::{LifeInsuranceApplication, LifeInsuranceForm};
pub use money::{Cents, format_usd};
pub use trust::TrustQuestionnaire;
pub use types::{
    Acknowledgment, AgentApplication, Beneficiary, BeneficiaryType, ContactIdentity,
    ContactInquiry, LivingTrustLanding, QuestionnaireSubmission, Submission, SubmissionKind,
    join_name, present,
};
