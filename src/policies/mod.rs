//! Read-side policies.
//!
//! This module groups the knobs that control **whether** a read suspends and
//! **what** happens when a suspended read waits too long.
//!
//! ## Contents
//! - [`Escalation`] per-read decision: settle or suspend (with stall flag)
//! - [`SubjectView`] decision inputs
//! - [`StallPolicy`] reporting of reads pending past their window
//!
//! ## Quick wiring
//! ```text
//! StatusBridge::read_subject
//!      └─► Escalation::decide(view, subject window, suspense)
//!           ├─ Settle              ─► ReadOutcome::Ready(snapshot)
//!           └─ Suspend { stalled } ─► StallPolicy (warn once) ─► ReadOutcome::Pending
//! ```
//!
//! ## Defaults
//! - `StallPolicy::Log`: a stall is logged, never turned into an error.

mod escalation;
mod stall;

pub use escalation::{Escalation, SubjectView};
pub use stall::StallPolicy;
