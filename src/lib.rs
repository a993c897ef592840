//! tracelens submits access-trace PDFs and free-form prompts to a hosted
//! chat-completion API and renders the answers as HTML.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns file staging, the SSE frame decoder, the request
//!   dispatcher, the analysis session state and its reducer, configuration
//!   and credentials.
//! - [`ui`] turns Markdown answers into HTML and assembles result panels and
//!   the standalone report page.
//! - [`api`] defines the chat-completions and gateway settings payloads.
//! - [`cli`] parses arguments and drives analysis runs, chat sessions and
//!   settings commands.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
