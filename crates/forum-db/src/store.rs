//! Persistence gateway consumed by the topic service.
//!
//! Reads go straight through [`TopicStore`]; every write happens inside a
//! [`TopicTransaction`] obtained from [`TopicStore::begin`]. A transaction that
//! is dropped without [`TopicTransaction::commit`] discards all of its writes.

use async_trait::async_trait;

use crate::{
    error::StoreResult,
    models::{Course, NewTopic, Topic, TopicChanges, TopicWithCourse},
    page::{Page, PageRequest},
};

#[async_trait]
pub trait TopicStore: Send + Sync + 'static {
    /// One page of topics, restricted to an exact course name when given
    async fn find_page(
        &self,
        course_name: Option<&str>,
        request: &PageRequest,
    ) -> StoreResult<Page<TopicWithCourse>>;

    async fn find_topic(&self, topic_id: i64) -> StoreResult<Option<TopicWithCourse>>;

    async fn find_course(&self, course_id: i64) -> StoreResult<Option<Course>>;

    /// Open a unit of work for writes
    async fn begin(&self) -> StoreResult<Box<dyn TopicTransaction>>;

    /// Cheap round trip used by the readiness probe
    async fn ping(&self) -> StoreResult<()>;
}

#[async_trait]
pub trait TopicTransaction: Send {
    async fn find_course(&mut self, course_id: i64) -> StoreResult<Option<Course>>;

    async fn find_topic(&mut self, topic_id: i64) -> StoreResult<Option<TopicWithCourse>>;

    /// Persist a new topic and return it with its assigned id
    async fn insert_topic(&mut self, topic: NewTopic) -> StoreResult<Topic>;

    /// `None` when no topic has this id
    async fn update_topic(
        &mut self,
        topic_id: i64,
        changes: &TopicChanges,
    ) -> StoreResult<Option<Topic>>;

    /// `false` when no topic has this id
    async fn delete_topic(&mut self, topic_id: i64) -> StoreResult<bool>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
