//! Stockwatch Store - Notification feed and de-duplication state
//!
//! This crate holds the only in-process state shared between the geolocation
//! monitor and the request-serving layer: the bounded notification feed and
//! the set of defect images already turned into notifications.

pub mod memory;
pub mod ports;

pub use memory::{MemoryNotificationStore, ProcessedSet};
pub use ports::NotificationFeed;
