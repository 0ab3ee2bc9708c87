use std::sync::Arc;

use forum_db::{
    TopicStore, TopicTransaction,
    models::{NewTopic, TopicChanges, TopicWithCourse},
    page::{Page, PageRequest},
};
use tracing::instrument;
use validator::Validate;

use crate::{
    cache::ResponseCache,
    error::ApiError,
    metrics,
    topic::model::{TopicDetail, TopicForm, TopicSummary, UpdateTopicForm},
};

/// Everything a listing result depends on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingKey {
    pub course_name: Option<String>,
    pub request: PageRequest,
}

pub type ListingCache = ResponseCache<ListingKey, Page<TopicSummary>>;

pub const LISTING_CACHE_NAME: &str = "topic_listing";

/// Topic use cases on top of a [`TopicStore`], with listing results memoized
/// in a shared [`ListingCache`]
#[derive(Clone)]
pub struct TopicService {
    store: Arc<dyn TopicStore>,
    cache: Arc<ListingCache>,
}

/// A write transaction whose commit also evicts every cached listing
struct WriteScope<'a> {
    tx: Box<dyn TopicTransaction>,
    cache: &'a ListingCache,
}

impl WriteScope<'_> {
    async fn commit(self) -> Result<(), ApiError> {
        self.tx.commit().await?;
        self.cache.evict_all();
        metrics::record_cache_event(self.cache.name(), "evict");
        Ok(())
    }
}

impl TopicService {
    pub fn new(store: Arc<dyn TopicStore>, cache: Arc<ListingCache>) -> Self {
        Self { store, cache }
    }

    /// Service with a fresh, private listing cache
    pub fn with_cache_capacity(store: Arc<dyn TopicStore>, capacity: usize) -> Self {
        Self::new(
            store,
            Arc::new(ListingCache::new(LISTING_CACHE_NAME, capacity)),
        )
    }

    pub fn cache(&self) -> &ListingCache {
        &self.cache
    }

    async fn begin(&self) -> Result<WriteScope<'_>, ApiError> {
        Ok(WriteScope {
            tx: self.store.begin().await?,
            cache: &self.cache,
        })
    }

    /// Page of topic summaries, optionally restricted to one course name.
    /// An unknown course name yields an empty page.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        course_name: Option<String>,
        request: PageRequest,
    ) -> Result<Page<TopicSummary>, ApiError> {
        let key = ListingKey {
            course_name,
            request,
        };

        if let Some(page) = self.cache.get(&key) {
            tracing::debug!("Listing cache hit");
            metrics::record_cache_event(self.cache.name(), "hit");
            return Ok(page);
        }
        metrics::record_cache_event(self.cache.name(), "miss");

        let generation = self.cache.generation();
        let page = self
            .store
            .find_page(key.course_name.as_deref(), &key.request)
            .await?
            .map(TopicSummary::from);

        if !self.cache.put(key, page.clone(), generation) {
            tracing::debug!("Listing invalidated while loading, not cached");
        }

        Ok(page)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, topic_id: i64) -> Result<TopicDetail, ApiError> {
        self.store
            .find_topic(topic_id)
            .await?
            .map(TopicDetail::from)
            .ok_or_else(|| ApiError::topic_not_found(topic_id))
    }

    #[instrument(skip_all)]
    pub async fn create(&self, form: TopicForm) -> Result<TopicSummary, ApiError> {
        let form = form.into_valid()?;

        let mut scope = self.begin().await?;
        let course = scope
            .tx
            .find_course(form.course_id)
            .await?
            .ok_or_else(|| ApiError::course_not_found(form.course_id))?;

        let topic = scope
            .tx
            .insert_topic(NewTopic::open(form.title, form.message, course.id))
            .await?;
        scope.commit().await?;

        tracing::info!(topic_id = topic.id, course_id = course.id, "Topic created");
        Ok(TopicWithCourse::new(topic, &course).into())
    }

    #[instrument(skip(self, form))]
    pub async fn update(
        &self,
        topic_id: i64,
        form: UpdateTopicForm,
    ) -> Result<TopicSummary, ApiError> {
        form.validate()?;

        let mut scope = self.begin().await?;
        let existing = scope
            .tx
            .find_topic(topic_id)
            .await?
            .ok_or_else(|| ApiError::topic_not_found(topic_id))?;

        let changes = TopicChanges {
            title: form.title,
            message: form.message,
        };
        let updated = scope
            .tx
            .update_topic(topic_id, &changes)
            .await?
            .ok_or_else(|| ApiError::topic_not_found(topic_id))?;
        scope.commit().await?;

        tracing::info!(topic_id, "Topic updated");
        Ok(TopicSummary {
            title: updated.title,
            message: updated.message,
            ..TopicSummary::from(existing)
        })
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, topic_id: i64) -> Result<(), ApiError> {
        let mut scope = self.begin().await?;
        if !scope.tx.delete_topic(topic_id).await? {
            return Err(ApiError::topic_not_found(topic_id));
        }
        scope.commit().await?;

        tracing::info!(topic_id, "Topic deleted");
        Ok(())
    }

    /// Whether the store answers
    pub async fn ready(&self) -> Result<(), ApiError> {
        Ok(self.store.ping().await?)
    }
}

impl std::fmt::Debug for TopicService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicService")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
