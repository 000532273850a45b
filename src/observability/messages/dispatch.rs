// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the change-notification dispatcher.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;
use uuid::Uuid;

pub struct DispatcherStarted;

impl Display for DispatcherStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Listening for process inserts")
    }
}

impl StructuredLog for DispatcherStarted {
    fn log(&self) {
        tracing::info!("{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("dispatcher", span_name = name)
    }
}

/// Dispatcher left its receive loop.
///
/// # Log Level
/// `info!` - Important operational event
pub struct DispatcherStopped<'a> {
    pub reason: &'a str,
}

impl Display for DispatcherStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Process insert listener stopped: {}", self.reason)
    }
}

impl StructuredLog for DispatcherStopped<'_> {
    fn log(&self) {
        tracing::info!(reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("dispatcher_stopped", span_name = name, reason = self.reason)
    }
}

/// The listener fell behind and the channel dropped notifications.
///
/// # Log Level
/// `warn!` - The queue path still delivers the dropped processes
///
/// # Example
/// ```
/// use playbook_engine::observability::messages::dispatch::NotificationsLagged;
///
/// let msg = NotificationsLagged { skipped: 12 };
/// assert_eq!(
///     msg.to_string(),
///     "Process insert listener lagged; 12 notifications dropped"
/// );
/// ```
pub struct NotificationsLagged {
    pub skipped: u64,
}

impl Display for NotificationsLagged {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Process insert listener lagged; {} notifications dropped",
            self.skipped
        )
    }
}

impl StructuredLog for NotificationsLagged {
    fn log(&self) {
        tracing::warn!(skipped = self.skipped, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::WARN,
            "notifications_lagged",
            span_name = name,
            skipped = self.skipped,
        )
    }
}

pub struct NotificationReceived<'a> {
    pub process_id: Uuid,
    pub step_type: &'a str,
}

impl Display for NotificationReceived<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Notified of process {} ({})",
            self.process_id, self.step_type
        )
    }
}

impl StructuredLog for NotificationReceived<'_> {
    fn log(&self) {
        tracing::debug!(process_id = %self.process_id, step_type = self.step_type, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "notification",
            span_name = name,
            process_id = %self.process_id,
            step_type = self.step_type,
        )
    }
}

/// Infrastructure error while handling a notification; the dispatcher stops.
pub struct DispatchFailed<'a> {
    pub process_id: Uuid,
    pub error: &'a dyn std::error::Error,
}

impl Display for DispatchFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to dispatch process {}: {}",
            self.process_id, self.error
        )
    }
}

impl StructuredLog for DispatchFailed<'_> {
    fn log(&self) {
        tracing::error!(process_id = %self.process_id, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("dispatch_failed", span_name = name, process_id = %self.process_id)
    }
}

/// A contended notification will be published again after a delay.
///
/// # Log Level
/// `debug!` - Expected when the queue path holds the claim
///
/// # Example
/// ```
/// use playbook_engine::observability::messages::dispatch::RedeliveryScheduled;
/// use std::time::Duration;
/// use uuid::Uuid;
///
/// let msg = RedeliveryScheduled {
///     process_id: Uuid::nil(),
///     delay: Duration::from_millis(500),
/// };
/// assert!(msg.to_string().ends_with("again in 500ms"));
/// ```
pub struct RedeliveryScheduled {
    pub process_id: Uuid,
    pub delay: Duration,
}

impl Display for RedeliveryScheduled {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Process {} is claimed elsewhere; notifying again in {:?}",
            self.process_id, self.delay
        )
    }
}

impl StructuredLog for RedeliveryScheduled {
    fn log(&self) {
        tracing::debug!(
            process_id = %self.process_id,
            delay_ms = self.delay.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("redelivery", span_name = name, process_id = %self.process_id)
    }
}

/// A scheduled redelivery could not read the process resolution and was dropped.
pub struct RedeliveryFailed<'a> {
    pub process_id: Uuid,
    pub error: &'a dyn std::error::Error,
}

impl Display for RedeliveryFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dropped redelivery of process {}: {}",
            self.process_id, self.error
        )
    }
}

impl StructuredLog for RedeliveryFailed<'_> {
    fn log(&self) {
        tracing::warn!(process_id = %self.process_id, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::WARN,
            "redelivery_failed",
            span_name = name,
            process_id = %self.process_id,
        )
    }
}
