//! Snippet lifecycle: one tagged state, one reducer, one async driver.
//!
//! ```text
//! Composing → Submitting → Created
//!                  ↘ Failed ↺
//! Locating → Located → Decrypting → Decrypted
//!                          ↘ Failed ↺
//! (Created | Located | Decrypted) → ConfirmingDelete → Deleting → Deleted
//! ```

pub mod machine;
pub mod state;

pub use machine::{Dispatch, SnippetMachine};
pub use state::{reduce, Effect, Event, Notice, Recovery, SnippetState, Transition};

#[cfg(test)]
mod tests;
