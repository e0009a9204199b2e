// Assessment engine: question generation and answer evaluation.
// All LLM calls go through llm_client. No direct provider calls here.
// Model text is read only through the interpreter module.

pub mod evaluation;
pub mod handlers;
pub mod interpreter;
pub mod models;
pub mod prompts;
pub mod questions;
