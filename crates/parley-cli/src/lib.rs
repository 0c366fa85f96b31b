//! Terminal client for Parley
//!
//! A thin shell over [`parley_app::Driver`] that reads commands and drafts
//! line by line and prints the conversation as plain text. All orchestration
//! lives in the generic [`parley_app::Runtime`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod render;
pub mod terminal;

pub use command::{CommandError, parse_line};
pub use render::{Frame, Screen};
pub use terminal::{DriverError, LineDriver};
