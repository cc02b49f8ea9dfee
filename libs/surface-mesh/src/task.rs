//! # Task Token
//!
//! Cooperative cancellation flag and progress counter shared by the
//! construction phases. All methods take `&self`, so one token can be passed
//! by reference into rayon workers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use config::constants::PROGRESS_CHUNK;

/// Cancellation and progress state of a long-running construction.
///
/// Progress calls return `false` once the task has been canceled, so loops
/// can bail out with a single check.
///
/// # Example
///
/// ```rust
/// use surface_mesh::TaskToken;
///
/// let task = TaskToken::new();
/// task.set_progress_maximum(10);
/// assert!(task.set_progress_value(3));
/// task.cancel();
/// assert!(!task.increment_progress());
/// ```
#[derive(Debug, Default)]
pub struct TaskToken {
    canceled: AtomicBool,
    progress: AtomicU64,
    maximum: AtomicU64,
}

impl TaskToken {
    /// Creates a fresh, non-canceled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Relaxed);
    }

    /// Returns true once cancellation has been requested.
    #[inline]
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Relaxed)
    }

    /// Sets the progress range of the current phase and resets the value.
    pub fn set_progress_maximum(&self, maximum: u64) {
        self.maximum.store(maximum, Ordering::Relaxed);
        self.progress.store(0, Ordering::Relaxed);
    }

    /// Returns the progress range of the current phase.
    pub fn progress_maximum(&self) -> u64 {
        self.maximum.load(Ordering::Relaxed)
    }

    /// Returns the current progress value.
    pub fn progress_value(&self) -> u64 {
        self.progress.load(Ordering::Relaxed)
    }

    /// Sets the progress value. Returns false if the task was canceled.
    pub fn set_progress_value(&self, value: u64) -> bool {
        self.progress.store(value, Ordering::Relaxed);
        !self.is_canceled()
    }

    /// Updates the progress value only every [`PROGRESS_CHUNK`] items.
    /// Returns false if the task was canceled.
    #[inline]
    pub fn set_progress_value_intermittent(&self, value: u64) -> bool {
        if value % PROGRESS_CHUNK as u64 == 0 {
            self.set_progress_value(value)
        } else {
            true
        }
    }

    /// Increments the progress value by one. Returns false if canceled.
    pub fn increment_progress(&self) -> bool {
        self.progress.fetch_add(1, Ordering::Relaxed);
        !self.is_canceled()
    }
}
