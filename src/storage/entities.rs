use chrono::DateTime;
use chrono::Utc;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use std::sync::Arc;

/// Anything that can be placed on a timeline. Range extraction keys off the
/// start because a record never spans more than one day.
pub trait Timestamped {
    fn start(&self) -> DateTime<Utc>;
}

/// One completed workday, written to the day file when the user ends the
/// session. Open sessions live in the state file instead, so every entity on
/// disk has both endpoints.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct SessionEntity {
    pub id: Uuid,
    pub project: Arc<str>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub start: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub end: DateTime<Utc>,
}

impl SessionEntity {
    pub fn raw_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes().max(0)
    }

    #[cfg(test)]
    pub fn test_value(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            project: "Workday".into(),
            start,
            end,
        }
    }
}

impl Timestamped for SessionEntity {
    fn start(&self) -> DateTime<Utc> {
        self.start
    }
}

/// One finished unit of work. `session_id` ties the task to the workday it
/// was logged in; on-call entries carry no session and set `call` instead.
/// `images` holds attachment paths relative to the application directory.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct TaskEntity {
    pub id: Uuid,
    #[serde(default)]
    pub session_id: Option<Uuid>,
    pub title: Arc<str>,
    pub notes: Arc<str>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub start: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub call: bool,
}

impl TaskEntity {
    pub fn raw_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes().max(0)
    }

    pub fn with_call(self, call: bool) -> Self {
        Self { call, ..self }
    }

    #[cfg(test)]
    pub fn test_value(title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: None,
            title: title.into(),
            notes: "notes".into(),
            tags: vec![],
            images: vec![],
            start,
            end,
            call: false,
        }
    }
}

impl Timestamped for TaskEntity {
    fn start(&self) -> DateTime<Utc> {
        self.start
    }
}
