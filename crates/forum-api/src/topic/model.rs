use std::borrow::Cow;

use chrono::{DateTime, Utc};
use forum_db::{
    models::{TopicStatus, TopicWithCourse},
    page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageRequest, SortDirection, SortField},
};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::ApiError;

/// Topic as shown in listings and returned by writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSummary {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub creation_date: DateTime<Utc>,
    pub status: TopicStatus,
    pub course_name: String,
}

impl From<TopicWithCourse> for TopicSummary {
    fn from(topic: TopicWithCourse) -> Self {
        Self {
            id: topic.id,
            title: topic.title,
            message: topic.message,
            creation_date: topic.created_at,
            status: topic.status,
            course_name: topic.course_name,
        }
    }
}

/// Full topic view including the course category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDetail {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub creation_date: DateTime<Utc>,
    pub status: TopicStatus,
    pub course_name: String,
    pub course_category: String,
}

impl From<TopicWithCourse> for TopicDetail {
    fn from(topic: TopicWithCourse) -> Self {
        Self {
            id: topic.id,
            title: topic.title,
            message: topic.message,
            creation_date: topic.created_at,
            status: topic.status,
            course_name: topic.course_name,
            course_category: topic.course_category,
        }
    }
}

/// Body of `POST /topicos`.
///
/// Missing text fields deserialize as empty strings so they are reported by
/// validation instead of being rejected by the JSON extractor.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TopicForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub message: String,
    pub course_id: Option<i64>,
}

/// A create request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTopicForm {
    pub title: String,
    pub message: String,
    pub course_id: i64,
}

impl TopicForm {
    /// Check every field, reporting all failures at once
    pub fn into_valid(self) -> Result<ValidTopicForm, ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_default();

        if self.course_id.is_none() {
            let mut error = ValidationError::new("required");
            error.message = Some(Cow::from("must not be null"));
            errors.add("courseId", error);
        }

        match self.course_id {
            Some(course_id) if errors.is_empty() => Ok(ValidTopicForm {
                title: self.title,
                message: self.message,
                course_id,
            }),
            _ => Err(errors),
        }
    }
}

/// Body of `PUT /topicos/{id}`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTopicForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub message: String,
}

/// Query string of `GET /topicos`, e.g. `?courseName=Spring+Boot&page=0&size=10&sort=title,asc`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub course_name: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    /// `field` or `field,direction`
    pub sort: Option<String>,
}

impl ListParams {
    pub fn page_request(&self) -> Result<PageRequest, ApiError> {
        let size = self.size.unwrap_or(DEFAULT_PAGE_SIZE);
        if size == 0 {
            return Err(ApiError::BadRequest(
                "Page size must be greater than zero".to_string(),
            ));
        }

        let (sort, direction) = match self.sort.as_deref() {
            None | Some("") => (SortField::default(), SortDirection::default()),
            Some(sort) => parse_sort(sort)?,
        };

        Ok(PageRequest::new(
            self.page.unwrap_or(0),
            size.min(MAX_PAGE_SIZE),
            sort,
            direction,
        ))
    }
}

fn parse_sort(sort: &str) -> Result<(SortField, SortDirection), ApiError> {
    let mut parts = sort.split(',').map(str::trim);
    let field_name = parts.next().unwrap_or_default();

    let field = SortField::parse(field_name).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Invalid sort field: '{field_name}'. Must be one of: id, title, creationDate, status"
        ))
    })?;

    let direction = match parts.next() {
        None => SortDirection::default(),
        Some(value) => SortDirection::parse(value).ok_or_else(|| {
            ApiError::BadRequest(format!(
                "Invalid sort direction: '{value}'. Must be 'asc' or 'desc'"
            ))
        })?,
    };

    if parts.next().is_some() {
        return Err(ApiError::BadRequest(format!(
            "Invalid sort: '{sort}'. Expected 'field' or 'field,direction'"
        )));
    }

    Ok((field, direction))
}
