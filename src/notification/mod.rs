//! Delivery of rendered reports to notification channels.
//!
//! Each channel implements [`Notifier`](crate::core::Notifier). The
//! [`NotificationDispatcher`] sends a report through its channels in order,
//! once each, and stops at the first failure.
pub mod dispatcher;
pub mod ses;
pub mod sns;

pub use dispatcher::NotificationDispatcher;
pub use ses::SesNotifier;
pub use sns::SnsNotifier;
