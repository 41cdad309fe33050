//! Shared JSON context: jobs, candidates, employees and the team summary.

pub mod document;
pub mod error;
pub mod file_store;
pub mod handlers;
pub mod models;
pub mod writer;

pub use writer::ContextStore;
