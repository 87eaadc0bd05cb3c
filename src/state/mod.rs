//! Run-scoped politeness state
//!
//! Per-politeness-key accounting used by the admission loop. The state is
//! in-memory only and discarded at run end.

mod politeness;

// Re-export main types
pub use politeness::PolitenessSlot;
