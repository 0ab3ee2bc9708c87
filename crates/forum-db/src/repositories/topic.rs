use sqlx::{Executor, Postgres};

use crate::{
    models::{NewTopic, Topic, TopicChanges, TopicWithCourse},
    page::PageRequest,
};

/// Fetch one page of topics joined with their course.
///
/// `course_name = None` lists every topic. Ties on the sort column are broken
/// by id in the same direction so consecutive pages never overlap.
pub async fn find_page<'e, E>(
    executor: E,
    course_name: Option<&str>,
    request: &PageRequest,
) -> Result<Vec<TopicWithCourse>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    // Sort column and direction come from closed enums, never from user text
    let sql = format!(
        // language=PostgreSQL
        r#"
            SELECT
                t.id,
                t.title,
                t.message,
                t.created_at,
                t.status,
                t.course_id,
                c.name as course_name,
                c.category as course_category
            FROM topics t
            JOIN courses c ON c.id = t.course_id
            WHERE ($1::text IS NULL OR c.name = $1)
            ORDER BY {column} {direction}, t.id {direction}
            LIMIT $2 OFFSET $3
        "#,
        column = request.sort.column(),
        direction = request.direction.keyword(),
    );

    sqlx::query_as(&sql)
        .bind(course_name)
        .bind(i64::from(request.size))
        .bind(i64::try_from(request.offset()).unwrap_or(i64::MAX))
        .fetch_all(executor)
        .await
}

pub async fn count<'e, E>(executor: E, course_name: Option<&str>) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM topics t
            JOIN courses c ON c.id = t.course_id
            WHERE ($1::text IS NULL OR c.name = $1)
        "#,
    )
    .bind(course_name)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id<'e, E>(
    executor: E,
    topic_id: i64,
) -> Result<Option<TopicWithCourse>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT
                t.id,
                t.title,
                t.message,
                t.created_at,
                t.status,
                t.course_id,
                c.name as course_name,
                c.category as course_category
            FROM topics t
            JOIN courses c ON c.id = t.course_id
            WHERE t.id = $1
        "#,
    )
    .bind(topic_id)
    .fetch_optional(executor)
    .await
}

pub async fn insert<'e, E>(executor: E, topic: &NewTopic) -> Result<Topic, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO topics (title, message, created_at, status, course_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, message, created_at, status, course_id
        "#,
    )
    .bind(&topic.title)
    .bind(&topic.message)
    .bind(topic.created_at)
    .bind(topic.status)
    .bind(topic.course_id)
    .fetch_one(executor)
    .await
}

/// Overwrite title and message, leaving course and creation date untouched
pub async fn update<'e, E>(
    executor: E,
    topic_id: i64,
    changes: &TopicChanges,
) -> Result<Option<Topic>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE topics
            SET title = $2, message = $3
            WHERE id = $1
            RETURNING id, title, message, created_at, status, course_id
        "#,
    )
    .bind(topic_id)
    .bind(&changes.title)
    .bind(&changes.message)
    .fetch_optional(executor)
    .await
}

/// Returns whether a row was removed
pub async fn delete<'e, E>(executor: E, topic_id: i64) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM topics
            WHERE id = $1
        "#,
    )
    .bind(topic_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
