//! # iva-memory
//!
//! Persistent memory for IVA: SQLite-backed conversation turns, a local mirror
//! of reminders and tasks, the audit log, and plain-text journal files.

pub mod audit;
pub mod journal;
pub mod store;

pub use audit::AuditLogger;
pub use store::{ReminderRecord, Store, TaskRecord};
