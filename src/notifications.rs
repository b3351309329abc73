use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// How long a toast stays up
pub const DEFAULT_TTL_MS: i64 = 3_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Transient, dismissible user notifications
#[derive(Debug)]
pub struct NotificationQueue {
    items: VecDeque<Notification>,
    ttl: Duration,
    next_id: u64,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(Duration::milliseconds(DEFAULT_TTL_MS))
    }
}

impl NotificationQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            items: VecDeque::new(),
            ttl,
            next_id: 0,
        }
    }

    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>) -> u64 {
        self.push_at(level, message, Utc::now())
    }

    /// Add a notification, dropping any that expired before `now`
    pub fn push_at(
        &mut self,
        level: NotificationLevel,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> u64 {
        self.prune(now);
        self.next_id += 1;
        self.items.push_back(Notification {
            id: self.next_id,
            level,
            message: message.into(),
            created_at: now,
        });
        self.next_id
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.push(NotificationLevel::Success, message)
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.push(NotificationLevel::Info, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.push(NotificationLevel::Error, message)
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Drop notifications older than the TTL
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.items.retain(|n| now - n.created_at < ttl);
    }

    /// Notifications still visible at `now`
    pub fn active(&self, now: DateTime<Utc>) -> impl Iterator<Item = &Notification> {
        let ttl = self.ttl;
        self.items.iter().filter(move |n| now - n.created_at < ttl)
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.items.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
