//! AI drafting for the editor: experience bullets and summary suggestions.
//! Drafts are returned to the caller and never written to the resume.

pub mod generator;
pub mod handlers;
pub mod llm;
pub mod prompts;
