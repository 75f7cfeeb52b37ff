//! `facture-session` — the form session shell.
//!
//! **Responsibility:** own the single invoice a form session edits, dispatch
//! mutations into the aggregate, and run the save/export actions, reporting
//! their outcomes on the notification channel.
//!
//! The session is a **thin shell** around `facture-invoicing`: all business
//! rules live in the aggregate; this crate supplies the generated defaults
//! and the side channels.

pub mod notification;
pub mod session;

pub use notification::{Notification, Severity};
pub use session::FormSession;
