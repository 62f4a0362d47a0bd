pub mod api;
pub mod cards;
pub mod config;
pub mod db;
mod error;
pub mod generate;
pub mod mode;
pub mod models;
pub mod notify;
pub mod paths;
pub mod search;
pub mod session;
pub mod store;
pub mod studio;
pub mod tracker;
pub mod view;

pub use error::{Result, StudioError};

use std::sync::{Mutex, MutexGuard};

/// Locks `m`, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
