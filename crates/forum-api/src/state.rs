use std::sync::Arc;

use axum::extract::FromRef;
use forum_db::TopicStore;

use crate::{
    config::{ApiConfig, Environment},
    topic::TopicService,
};

#[derive(Clone, Debug)]
pub struct ApiState {
    pub topics: TopicService,
    pub environment: Environment,
}

impl ApiState {
    /// Wire the topic service to `store` with a listing cache sized from `config`
    pub fn new(config: &ApiConfig, store: Arc<dyn TopicStore>) -> Self {
        Self {
            topics: TopicService::with_cache_capacity(store, config.listing_cache_capacity),
            environment: config.env,
        }
    }
}

impl FromRef<ApiState> for TopicService {
    fn from_ref(state: &ApiState) -> Self {
        state.topics.clone()
    }
}
