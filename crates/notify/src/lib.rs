//! Maintenance-due notifications.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable delivery channels
//! - Webhook and log-only notifier implementations
//! - `NotificationDispatcher`, the interface the alarm engine calls into
//! - `Dispatcher`, which fans a notice out to every configured channel

pub mod dispatcher;
pub mod log;
pub mod traits;
pub mod webhook;

pub use dispatcher::Dispatcher;
pub use log::LogNotifier;
pub use traits::{
    DispatchResult, Notification, NotificationDispatcher, Notifier, NotifyError,
};
pub use webhook::WebhookNotifier;
