//! Runtime integration layer.
//!
//! Owns the process-level sequencing (listener, directory registration, startup subscriptions
//! and ordered shutdown) so the control and data planes stay free of it.

pub mod lifecycle;
pub mod retry;
