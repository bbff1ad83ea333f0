//! Resilience helpers.
//!
//! # Design Decisions
//! - Transient accept failures back off instead of spinning or giving up
//! - Backoff is capped so a recovered listener resumes quickly

pub mod backoff;
