//! trash: a small line-oriented shell with pipes, redirection, variable and
//! tilde expansion, and interrupt broadcast to its children.

pub mod buffer;
pub mod builtin;
pub mod config;
pub mod eval;
pub mod expand;
pub mod input;
pub mod parser;
pub mod redirect;
pub mod shell;
pub mod signal;
pub mod status;
pub mod types;

pub use crate::parser::parse;
pub use crate::shell::Shell;
pub use crate::types::{Redirect,RedirectMode,Stage};
