//! Test modules for the queue engine
//!
//! Tests are organised by functional area. Shared scripted consumers and
//! timing helpers live in `support`.

mod integration;
mod retry_flow;
mod support;
