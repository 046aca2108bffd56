//! Session layer
//!
//! Owns the loaded documents and hands out a [`Backend`] for a set of paths.
//! STEP files are cached one model per path; IFCX documents share a single
//! composed graph that is rebuilt whenever the set of loaded documents
//! changes. [`Session::clear`] drops everything at once.

pub mod backend;
pub mod config;
pub mod kind;
pub mod session;

pub use backend::Backend;
pub use config::SessionConfig;
pub use kind::DocumentKind;
pub use session::Session;
