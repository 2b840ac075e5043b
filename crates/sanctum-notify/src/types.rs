//! Notification records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque notification identifier, `notif_<uuid>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    pub(crate) fn generate() -> Self {
        Self(format!("notif_{}", Uuid::now_v7().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NotificationId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    /// Only `normal` notifications dismiss themselves.
    pub fn auto_dismisses(self) -> bool {
        self == Self::Normal
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Normal => write!(f, "normal"),
            Self::High => write!(f, "high"),
            Self::Urgent => write!(f, "urgent"),
        }
    }
}

/// What a caller supplies to [`crate::NotificationService::show`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub app_id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub priority: Priority,
}

impl NotificationData {
    pub fn new(app_id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            title: title.into(),
            body: body.into(),
            priority: Priority::Normal,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// An active notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub app_id: String,
    pub title: String,
    pub body: String,
    pub priority: Priority,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_normal_auto_dismisses() {
        assert!(Priority::Normal.auto_dismisses());
        for p in [Priority::Low, Priority::High, Priority::Urgent] {
            assert!(!p.auto_dismisses(), "{p}");
        }
    }

    #[test]
    fn data_defaults_to_normal() {
        let data: NotificationData =
            serde_json::from_str(r#"{"appId":"system","title":"t","body":"b"}"#).unwrap();
        assert_eq!(data.priority, Priority::Normal);
        assert_eq!(data, NotificationData::new("system", "t", "b"));
    }

    #[test]
    fn ids_are_prefixed() {
        assert!(NotificationId::generate().as_str().starts_with("notif_"));
    }
}
