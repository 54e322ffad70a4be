//! Edit session over an engine description.
//!
//! An [`EditSession`] owns an immutable baseline and an evolving current
//! snapshot. Edits run through the constraint registry, the patch applier and
//! the derived-quantity resolver; guardrail notes are reported immediately,
//! while the settled snapshot is announced once per quiet period.

mod debounce;
pub mod error;
pub mod events;
pub mod session;

pub use error::{SessionError, SessionResult};
pub use events::{GuardRail, SessionEvent};
pub use session::{DEFAULT_DEBOUNCE, EditOutcome, EditSession, SessionOptions, SessionState};
