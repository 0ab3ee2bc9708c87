use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    error::StoreResult,
    models::{Course, NewTopic, Topic, TopicChanges, TopicWithCourse},
    page::{Page, PageRequest},
    repositories::{course, topic},
    store::{TopicStore, TopicTransaction},
};

/// [`TopicStore`] backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgTopicStore {
    pool: PgPool,
}

impl PgTopicStore {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TopicStore for PgTopicStore {
    async fn find_page(
        &self,
        course_name: Option<&str>,
        request: &PageRequest,
    ) -> StoreResult<Page<TopicWithCourse>> {
        // One snapshot for both statements so the total matches the content
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;
        let content = topic::find_page(&mut *tx, course_name, request).await?;
        let total = topic::count(&mut *tx, course_name).await?;
        tx.commit().await?;

        Ok(Page::new(
            content,
            request,
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    async fn find_topic(&self, topic_id: i64) -> StoreResult<Option<TopicWithCourse>> {
        Ok(topic::find_by_id(&self.pool, topic_id).await?)
    }

    async fn find_course(&self, course_id: i64) -> StoreResult<Option<Course>> {
        Ok(course::find_by_id(&self.pool, course_id).await?)
    }

    async fn begin(&self) -> StoreResult<Box<dyn TopicTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTopicTransaction { tx }))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Wraps a sqlx transaction, which rolls back when dropped uncommitted
#[derive(Debug)]
pub struct PgTopicTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl TopicTransaction for PgTopicTransaction {
    async fn find_course(&mut self, course_id: i64) -> StoreResult<Option<Course>> {
        Ok(course::find_by_id(&mut *self.tx, course_id).await?)
    }

    async fn find_topic(&mut self, topic_id: i64) -> StoreResult<Option<TopicWithCourse>> {
        Ok(topic::find_by_id(&mut *self.tx, topic_id).await?)
    }

    async fn insert_topic(&mut self, new_topic: NewTopic) -> StoreResult<Topic> {
        Ok(topic::insert(&mut *self.tx, &new_topic).await?)
    }

    async fn update_topic(
        &mut self,
        topic_id: i64,
        changes: &TopicChanges,
    ) -> StoreResult<Option<Topic>> {
        Ok(topic::update(&mut *self.tx, topic_id, changes).await?)
    }

    async fn delete_topic(&mut self, topic_id: i64) -> StoreResult<bool> {
        Ok(topic::delete(&mut *self.tx, topic_id).await?)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
