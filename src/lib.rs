pub mod catalog;
pub mod classify;
pub mod config;
pub mod entry;
pub mod error;
pub mod git;
pub mod github;
pub mod history;
pub mod identity;
pub mod logging;
pub mod reconcile;
pub mod scan;
pub mod session;
