//! Orchestration services, one per feature.
//!
//! Each composes cache, index, model and media calls into one business
//! operation. Collaborator errors propagate unchanged; nothing is retried
//! or rolled back here.

pub mod analysis;
pub mod health;
pub mod insights;
pub mod media;
pub mod moderation;
pub mod recommendations;
pub mod search;
