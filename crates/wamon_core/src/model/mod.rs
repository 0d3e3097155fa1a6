//! Journal domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every entry is identified by a stable `EntryId`.
//! - Entries are never deleted by core code.

pub mod entry;
