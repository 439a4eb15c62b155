use stockwatch_core::models::NotificationEvent;

/// Port for the operator-facing notification feed
pub trait NotificationFeed: Send + Sync {
    /// Insert an event at the head of the feed, evicting the oldest entries
    /// beyond capacity
    fn push_front(&self, event: NotificationEvent);

    /// Copy of the feed, newest first
    fn snapshot(&self) -> Vec<NotificationEvent>;

    /// Number of events currently held
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
