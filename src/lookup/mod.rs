//! The `.id` command and its building blocks.
//!
//! - [`resolver`] finds the target account from the argument, the reply or the invoker
//! - [`extractor`] reads display values and estimates the creation date from photo history
//! - [`presenter`] renders the outcome as block-quoted Telegram HTML
//! - [`command`] ties them together behind the host's [`Command`](crate::host::Command) trait

pub mod command;
pub mod extractor;
pub mod presenter;
pub mod resolver;

pub use command::{IdCommand, IdOptions, Outcome, Stage};
pub use extractor::{Extractor, FieldValue, Profile};
pub use presenter::Presenter;
pub use resolver::{plan, Resolver, Strategy};
