use sqlx::{Executor, Postgres};

use crate::models::Course;

pub async fn find_by_id<'e, E>(executor: E, course_id: i64) -> Result<Option<Course>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, name, category
            FROM courses
            WHERE id = $1
        "#,
    )
    .bind(course_id)
    .fetch_optional(executor)
    .await
}
