// Candidate evaluation: resume intake, the scoring pipeline, and recruiter notes.

pub mod extraction;
pub mod handlers;
pub mod notes;
pub mod pipeline;
pub mod prompts;
pub mod resume;
pub mod scoring;

pub use pipeline::{evaluate_candidate, Evaluation};
