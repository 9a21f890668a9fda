//! Client core for password-protected snippets shared through scannable codes.
//!
//! The lifecycle of a snippet (compose, create, locate, decrypt, delete) lives
//! in [`lifecycle`]; everything the service does is reached through
//! [`service::SnippetService`].

pub mod access;
pub mod cli;
pub mod collection;
pub mod config;
pub mod error;
pub mod issuance;
pub mod lifecycle;
pub mod logging;
pub mod routes;
pub mod service;
pub mod session;
pub mod snippet;

pub use access::{Located, SnippetRef};
pub use collection::{Collection, DeleteOutcome};
pub use config::Config;
pub use error::{SnipError, SnipResult, ValidationError};
pub use issuance::{IssuedCode, QrRenderer};
pub use lifecycle::{Dispatch, SnippetMachine, SnippetState};
pub use routes::Route;
pub use service::{HttpSnippetService, LocalSnippetService, SnippetService};
pub use session::Session;
pub use snippet::{CreateRequest, Draft, Secret, SnippetId, SnippetSummary};
