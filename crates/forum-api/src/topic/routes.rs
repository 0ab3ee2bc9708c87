use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use forum_db::page::Page;

use crate::{ApiState, error::ApiError};

use super::{
    TopicService,
    model::{ListParams, TopicDetail, TopicForm, TopicSummary, UpdateTopicForm},
};

/// Base path of the topic resource
pub const TOPICS_PATH: &str = "/topicos";

/// Create the topic routes
pub fn routes() -> Router<ApiState> {
    Router::new()
        .route(TOPICS_PATH, get(list_topics).post(create_topic))
        .route(
            "/topicos/{id}",
            get(get_topic).put(update_topic).delete(delete_topic),
        )
}

/// List topics, e.g. `/topicos?courseName=Spring+Boot&page=0&size=10&sort=title,asc`
async fn list_topics(
    State(topics): State<TopicService>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Page<TopicSummary>>, ApiError> {
    let Query(params) = params?;
    let request = params.page_request()?;

    let page = topics.list(params.course_name, request).await?;
    Ok(Json(page))
}

/// Get topic by ID
async fn get_topic(
    State(topics): State<TopicService>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<TopicDetail>, ApiError> {
    let Path(id) = id?;
    Ok(Json(topics.get(id).await?))
}

/// Create a new topic, answering with its location
async fn create_topic(
    State(topics): State<TopicService>,
    payload: Result<Json<TopicForm>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(form) = payload?;
    let topic = topics.create(form).await?;
    let location = format!("{TOPICS_PATH}/{}", topic.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(topic),
    ))
}

/// Replace the title and message of an existing topic
async fn update_topic(
    State(topics): State<TopicService>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateTopicForm>, JsonRejection>,
) -> Result<Json<TopicSummary>, ApiError> {
    let Path(id) = id?;
    let Json(form) = payload?;
    Ok(Json(topics.update(id, form).await?))
}

/// Delete a topic
async fn delete_topic(
    State(topics): State<TopicService>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    topics.delete(id).await?;
    Ok(StatusCode::OK)
}
