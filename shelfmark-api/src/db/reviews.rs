//! Review database operations
//!
//! Reviews bind a book, a reviewer identity, and rated free-text content.
//! Statistics are derived on demand, never stored.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Review record
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub book_id: Uuid,
    pub book_isbn: String,
    pub reviewer_username: String,
    pub rating: i64,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Review fields before the store has assigned an identity
#[derive(Debug, Clone)]
pub struct NewReview {
    pub book_id: Uuid,
    pub reviewer_subject: String,
    pub reviewer_username: String,
    pub reviewer_email: String,
    pub rating: i64,
    pub title: String,
    pub content: String,
}

/// Requested ordering for review listings
///
/// `None` reflects storage order; further explicit orderings extend this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewOrder {
    #[default]
    None,
    Newest,
}

impl ReviewOrder {
    /// Parse the `order` query parameter; unrecognized values fall back to `None`
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "newest" => ReviewOrder::Newest,
            _ => ReviewOrder::None,
        }
    }
}

/// Derived count and average rating over a review set
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReviewStatistics {
    pub count: i64,
    pub average: f64,
}

/// Save review, assigning its identity and creation timestamp
pub async fn save_review(pool: &SqlitePool, review: NewReview) -> Result<Review, sqlx::Error> {
    let id = Uuid::new_v4();
    let created_at = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO reviews (
            id, book_id, reviewer_subject, reviewer_username, reviewer_email,
            rating, title, content, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(review.book_id.to_string())
    .bind(&review.reviewer_subject)
    .bind(&review.reviewer_username)
    .bind(&review.reviewer_email)
    .bind(review.rating)
    .bind(&review.title)
    .bind(&review.content)
    .bind(created_at.to_rfc3339())
    .execute(pool)
    .await?;

    let isbn: String = sqlx::query_scalar("SELECT isbn FROM books WHERE id = ?")
        .bind(review.book_id.to_string())
        .fetch_one(pool)
        .await?;

    Ok(Review {
        id,
        book_id: review.book_id,
        book_isbn: isbn,
        reviewer_username: review.reviewer_username,
        rating: review.rating,
        title: review.title,
        content: review.content,
        created_at,
    })
}

/// List reviews up to `limit` in the requested order
pub async fn list_reviews(
    pool: &SqlitePool,
    limit: i64,
    order: ReviewOrder,
) -> Result<Vec<Review>, sqlx::Error> {
    let order_clause = match order {
        ReviewOrder::None => "",
        ReviewOrder::Newest => "ORDER BY r.created_at DESC",
    };

    let query = format!(
        r#"
        SELECT r.id, r.book_id, b.isbn AS book_isbn, r.reviewer_username,
               r.rating, r.title, r.content, r.created_at
        FROM reviews r
        JOIN books b ON b.id = r.book_id
        {}
        LIMIT ?
        "#,
        order_clause
    );

    let rows = sqlx::query(&query).bind(limit).fetch_all(pool).await?;
    rows.into_iter().map(review_from_row).collect()
}

/// Delete review by id; `Ok(false)` when no such review exists
pub async fn delete_review(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Compute review statistics, globally or restricted to one ISBN
///
/// Average over an empty set reports 0.0 rather than NULL.
pub async fn statistics(
    pool: &SqlitePool,
    isbn: Option<&str>,
) -> Result<ReviewStatistics, sqlx::Error> {
    let row = match isbn {
        Some(isbn) => {
            sqlx::query(
                r#"
                SELECT COUNT(r.id) AS count, COALESCE(AVG(r.rating), 0.0) AS average
                FROM reviews r
                JOIN books b ON b.id = r.book_id
                WHERE b.isbn = ?
                "#,
            )
            .bind(isbn)
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query("SELECT COUNT(id) AS count, COALESCE(AVG(rating), 0.0) AS average FROM reviews")
                .fetch_one(pool)
                .await?
        }
    };

    Ok(ReviewStatistics {
        count: row.get("count"),
        average: row.get("average"),
    })
}

fn review_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Review, sqlx::Error> {
    let id: String = row.get("id");
    let book_id: String = row.get("book_id");
    let created_at: String = row.get("created_at");

    let decode = |field: &str, e: Box<dyn std::error::Error + Send + Sync>| {
        sqlx::Error::ColumnDecode {
            index: field.to_string(),
            source: e,
        }
    };

    Ok(Review {
        id: Uuid::parse_str(&id).map_err(|e| decode("id", Box::new(e)))?,
        book_id: Uuid::parse_str(&book_id).map_err(|e| decode("book_id", Box::new(e)))?,
        book_isbn: row.get("book_isbn"),
        reviewer_username: row.get("reviewer_username"),
        rating: row.get("rating"),
        title: row.get("title"),
        content: row.get("content"),
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| decode("created_at", Box::new(e)))?
            .with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::books::{insert_book, NewBook};
    use crate::db::memory_pool;

    async fn seed_book(pool: &SqlitePool, isbn: &str) -> Uuid {
        insert_book(
            pool,
            NewBook {
                isbn: isbn.to_string(),
                title: "Java book".to_string(),
                author: None,
                description: None,
                genre: None,
                pages: 0,
                publisher: None,
                thumbnail_url: None,
            },
        )
        .await
        .expect("seed book")
        .id
    }

    fn new_review(book_id: Uuid, rating: i64, content: &str) -> NewReview {
        NewReview {
            book_id,
            reviewer_subject: "user-123".to_string(),
            reviewer_username: "duke".to_string(),
            reviewer_email: "duke@example.com".to_string(),
            rating,
            title: "Great!".to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_assigns_identity_and_timestamp() {
        let pool = memory_pool().await;
        let book_id = seed_book(&pool, "1234567891234").await;

        let saved = save_review(&pool, new_review(book_id, 4, "Great book!"))
            .await
            .expect("save succeeds");

        assert_eq!(saved.book_isbn, "1234567891234");
        assert_eq!(saved.rating, 4);
        assert!(saved.created_at <= Utc::now());
    }

    #[tokio::test]
    async fn test_list_respects_limit_and_order() {
        let pool = memory_pool().await;
        let book_id = seed_book(&pool, "1234567891234").await;

        for i in 1..=3 {
            save_review(&pool, new_review(book_id, i, "Solid read, would recommend"))
                .await
                .unwrap();
        }

        let limited = list_reviews(&pool, 2, ReviewOrder::None).await.unwrap();
        assert_eq!(limited.len(), 2);

        let newest = list_reviews(&pool, 10, ReviewOrder::Newest).await.unwrap();
        assert_eq!(newest.len(), 3);
        for pair in newest.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    #[tokio::test]
    async fn test_delete_reports_not_found() {
        let pool = memory_pool().await;
        let book_id = seed_book(&pool, "1234567891234").await;
        let saved = save_review(&pool, new_review(book_id, 5, "Loved every chapter"))
            .await
            .unwrap();

        assert!(delete_review(&pool, saved.id).await.unwrap());
        assert!(!delete_review(&pool, saved.id).await.unwrap());
        assert!(!delete_review(&pool, Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_statistics_global_and_per_isbn() {
        let pool = memory_pool().await;
        let first = seed_book(&pool, "1111111111111").await;
        let second = seed_book(&pool, "2222222222222").await;

        save_review(&pool, new_review(first, 2, "Not my favorite")).await.unwrap();
        save_review(&pool, new_review(first, 4, "Better on reread")).await.unwrap();
        save_review(&pool, new_review(second, 5, "Excellent reference")).await.unwrap();

        let global = statistics(&pool, None).await.unwrap();
        assert_eq!(global.count, 3);
        assert!((global.average - 11.0 / 3.0).abs() < 1e-9);

        let per_book = statistics(&pool, Some("1111111111111")).await.unwrap();
        assert_eq!(per_book.count, 2);
        assert!((per_book.average - 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_statistics_empty_set() {
        let pool = memory_pool().await;
        let stats = statistics(&pool, None).await.unwrap();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.average, 0.0);
    }

    #[test]
    fn test_order_parse() {
        assert_eq!(ReviewOrder::parse("newest"), ReviewOrder::Newest);
        assert_eq!(ReviewOrder::parse("NEWEST"), ReviewOrder::Newest);
        assert_eq!(ReviewOrder::parse("none"), ReviewOrder::None);
        assert_eq!(ReviewOrder::parse("sideways"), ReviewOrder::None);
    }
}
