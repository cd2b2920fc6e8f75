//! Console front end for the parley chat client.
//!
//! [`console::ConsolePresenter`] renders the menu, prompts and classified
//! messages with crossterm colors. [`console::ConsoleLines`] feeds typed chat
//! lines from the same stdin reader, so prompts and chat input never compete
//! for a line.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod console;
