//! In-process [`TopicStore`], used when no database is configured and by tests.
//!
//! A transaction holds the state lock for its whole lifetime and works on a
//! private copy, so writers are serialized and an uncommitted transaction
//! leaves no trace.

use std::{cmp::Ordering, collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    error::{StoreError, StoreResult},
    models::{Course, NewTopic, Topic, TopicChanges, TopicWithCourse},
    page::{Page, PageRequest, SortDirection, SortField},
    store::{TopicStore, TopicTransaction},
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    courses: BTreeMap<i64, Course>,
    topics: BTreeMap<i64, Topic>,
    last_topic_id: i64,
}

impl MemoryState {
    fn joined(&self, topic: &Topic) -> Option<TopicWithCourse> {
        self.courses
            .get(&topic.course_id)
            .map(|course| TopicWithCourse::new(topic.clone(), course))
    }

    fn find_topic(&self, topic_id: i64) -> Option<TopicWithCourse> {
        self.topics
            .get(&topic_id)
            .and_then(|topic| self.joined(topic))
    }

    fn find_page(&self, course_name: Option<&str>, request: &PageRequest) -> Page<TopicWithCourse> {
        let mut matching: Vec<TopicWithCourse> = self
            .topics
            .values()
            .filter_map(|topic| self.joined(topic))
            .filter(|topic| course_name.is_none_or(|name| topic.course_name == name))
            .collect();

        matching.sort_by(|a, b| {
            let ordering = compare(a, b, request.sort);
            match request.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let total = matching.len() as u64;
        let content = matching
            .into_iter()
            .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
            .take(request.size as usize)
            .collect();

        Page::new(content, request, total)
    }
}

fn compare(a: &TopicWithCourse, b: &TopicWithCourse, sort: SortField) -> Ordering {
    let primary = match sort {
        SortField::Id => Ordering::Equal,
        // Code point order, as `COLLATE "C"` on the database side
        SortField::Title => a.title.cmp(&b.title),
        SortField::CreationDate => a.created_at.cmp(&b.created_at),
        SortField::Status => a.status.cmp(&b.status),
    };
    primary.then(a.id.cmp(&b.id))
}

/// Topic store kept entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryTopicStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTopicStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with the given reference courses
    pub fn with_courses(courses: impl IntoIterator<Item = Course>) -> Self {
        let state = MemoryState {
            courses: courses
                .into_iter()
                .map(|course| (course.id, course))
                .collect(),
            ..MemoryState::default()
        };

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Same sample courses the database migrations seed
    pub fn seeded() -> Self {
        Self::with_courses([
            Course {
                id: 1,
                name: "Spring Boot".to_string(),
                category: "Programação".to_string(),
            },
            Course {
                id: 2,
                name: "HTML 5".to_string(),
                category: "Front-end".to_string(),
            },
        ])
    }

    /// Number of stored topics
    pub async fn topic_count(&self) -> usize {
        self.state.lock().await.topics.len()
    }
}

#[async_trait]
impl TopicStore for MemoryTopicStore {
    async fn find_page(
        &self,
        course_name: Option<&str>,
        request: &PageRequest,
    ) -> StoreResult<Page<TopicWithCourse>> {
        Ok(self.state.lock().await.find_page(course_name, request))
    }

    async fn find_topic(&self, topic_id: i64) -> StoreResult<Option<TopicWithCourse>> {
        Ok(self.state.lock().await.find_topic(topic_id))
    }

    async fn find_course(&self, course_id: i64) -> StoreResult<Option<Course>> {
        Ok(self.state.lock().await.courses.get(&course_id).cloned())
    }

    async fn begin(&self) -> StoreResult<Box<dyn TopicTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl TopicTransaction for MemoryTransaction {
    async fn find_course(&mut self, course_id: i64) -> StoreResult<Option<Course>> {
        Ok(self.working.courses.get(&course_id).cloned())
    }

    async fn find_topic(&mut self, topic_id: i64) -> StoreResult<Option<TopicWithCourse>> {
        Ok(self.working.find_topic(topic_id))
    }

    async fn insert_topic(&mut self, new_topic: NewTopic) -> StoreResult<Topic> {
        // Mirrors the foreign key on topics.course_id
        if !self.working.courses.contains_key(&new_topic.course_id) {
            return Err(StoreError::UnknownCourse(new_topic.course_id));
        }

        self.working.last_topic_id += 1;
        let topic = Topic {
            id: self.working.last_topic_id,
            title: new_topic.title,
            message: new_topic.message,
            created_at: new_topic.created_at,
            status: new_topic.status,
            course_id: new_topic.course_id,
        };
        self.working.topics.insert(topic.id, topic.clone());

        Ok(topic)
    }

    async fn update_topic(
        &mut self,
        topic_id: i64,
        changes: &TopicChanges,
    ) -> StoreResult<Option<Topic>> {
        Ok(self.working.topics.get_mut(&topic_id).map(|topic| {
            topic.title.clone_from(&changes.title);
            topic.message.clone_from(&changes.message);
            topic.clone()
        }))
    }

    async fn delete_topic(&mut self, topic_id: i64) -> StoreResult<bool> {
        Ok(self.working.topics.remove(&topic_id).is_some())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let Self { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
