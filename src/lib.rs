//! Explain a MySQL query with the help of a language model.
//!
//! The pipeline extracts the tables a query references, inspects their
//! structure and the query's `EXPLAIN` plan, and streams an optimization
//! analysis from an OpenAI-compatible chat completion endpoint.

pub mod assets;
pub mod config;
pub mod pipeline;
pub mod report;
pub mod services;
