//! Sanctum notification service.
//!
//! [`NotificationService`] keeps the list of active notifications, tells
//! subscribers about every change, and dismisses `normal` priority
//! notifications on its own after [`AUTO_DISMISS_DELAY`].

pub mod service;
pub mod types;

pub use service::{AUTO_DISMISS_DELAY, NotificationService, Subscription};
pub use types::{Notification, NotificationData, NotificationId, Priority};
