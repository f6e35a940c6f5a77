//! App Lifecycle Observation
//!
//! Notifies the core about foreground/background transitions so it can
//! re-arm the handoff gate and clear stale job entries when the user
//! returns to the application.

use async_trait::async_trait;

use crate::error::Result;

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Application is in the foreground and active
    Foreground,
    /// Application is in the background
    Background,
}

/// Lifecycle observer trait
///
/// Platform sources:
/// - **iOS**: UIApplication lifecycle notifications
/// - **Android**: Activity/Application lifecycle callbacks
/// - **Desktop**: Window focus events
#[async_trait]
pub trait LifecycleObserver: Send + Sync {
    /// Get current lifecycle state
    async fn get_state(&self) -> Result<LifecycleState>;

    /// Subscribe to lifecycle state changes
    async fn subscribe_changes(&self) -> Result<Box<dyn LifecycleEvents>>;
}

/// Stream of lifecycle state changes
#[async_trait]
pub trait LifecycleEvents: Send {
    /// Get the next lifecycle state update.
    ///
    /// Returns `None` when the stream is closed.
    async fn next(&mut self) -> Option<LifecycleState>;
}
