use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Course model - reference data a topic belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Course {
    /// Unique course identifier
    pub id: i64,
    /// Course title (e.g. "Spring Boot")
    pub name: String,
    /// Subject category (e.g. "Programação")
    pub category: String,
}

/// Lifecycle state of a topic.
///
/// Topics are always created `Open`; no operation transitions them yet.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "topic_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TopicStatus {
    #[default]
    Open,
    Unsolved,
    Solved,
    Closed,
}

/// Topic model - one forum thread, stored with a foreign key to its course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Topic {
    /// Unique topic identifier
    pub id: i64,
    /// Thread title (max 255 chars)
    pub title: String,
    /// Opening message
    pub message: String,
    /// When the topic was created, never changes afterwards
    pub created_at: DateTime<Utc>,
    /// Current status
    pub status: TopicStatus,
    /// Course this topic belongs to
    pub course_id: i64,
}

/// Topic row joined with its course, used by every read path so that
/// listings never issue one course lookup per topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TopicWithCourse {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub status: TopicStatus,
    pub course_id: i64,
    pub course_name: String,
    pub course_category: String,
}

impl TopicWithCourse {
    pub fn new(topic: Topic, course: &Course) -> Self {
        Self {
            id: topic.id,
            title: topic.title,
            message: topic.message,
            created_at: topic.created_at,
            status: topic.status,
            course_id: course.id,
            course_name: course.name.clone(),
            course_category: course.category.clone(),
        }
    }
}

/// Insert struct for Topic, the id is assigned by the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTopic {
    pub title: String,
    pub message: String,
    pub course_id: i64,
    pub created_at: DateTime<Utc>,
    pub status: TopicStatus,
}

impl NewTopic {
    /// A freshly opened topic stamped with the current time
    pub fn open(title: String, message: String, course_id: i64) -> Self {
        Self {
            title,
            message,
            course_id,
            created_at: Utc::now(),
            status: TopicStatus::Open,
        }
    }
}

/// Mutable part of a topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicChanges {
    pub title: String,
    pub message: String,
}
