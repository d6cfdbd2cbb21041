//! Shared pure types and logic: the voting window configuration and the
//! session eligibility state machine derived from it.

pub mod eligibility;
pub mod window;
