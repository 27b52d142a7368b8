//! RAG (Retrieval-Augmented Generation) for question answering with sources.
//!
//! Assembles retrieved passages into a context block and asks an answer
//! generator to respond strictly from it.

pub mod context;
mod generator;
mod response;

pub use generator::{create_generator, AnswerGenerator, OpenAIGenerator};
pub use response::{RagEngine, RagResponse, DEFAULT_MAX_TOKENS};
