//! Book database operations
//!
//! Books carry canonical catalog metadata keyed by ISBN. The store assigns
//! record identity; callers never pick ids. ISBN is immutable once written.

use serde::Serialize;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

/// Book record
#[derive(Debug, Clone, Serialize)]
pub struct Book {
    /// Store-assigned identity, not exposed over the API
    #[serde(skip_serializing)]
    pub id: Uuid,
    pub isbn: String,
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub pages: i64,
    pub publisher: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// Book fields before the store has assigned an identity
#[derive(Debug, Clone)]
pub struct NewBook {
    pub isbn: String,
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub pages: i64,
    pub publisher: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// Book insert failure, with uniqueness conflicts reported distinctly
#[derive(Debug, Error)]
pub enum InsertBookError {
    /// A book with this ISBN already exists
    #[error("Book with ISBN {0} already exists")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Load book by ISBN
pub async fn find_by_isbn(pool: &SqlitePool, isbn: &str) -> Result<Option<Book>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, isbn, title, author, description, genre, pages, publisher, thumbnail_url
        FROM books
        WHERE isbn = ?
        "#,
    )
    .bind(isbn)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(book_from_row).transpose()?)
}

/// Insert a new book, assigning its identity
///
/// Plain INSERT, deliberately not an upsert: a concurrent write for the same
/// ISBN must surface as `InsertBookError::Duplicate` so the caller can
/// classify it as "already synchronized".
pub async fn insert_book(pool: &SqlitePool, book: NewBook) -> Result<Book, InsertBookError> {
    let id = Uuid::new_v4();

    let result = sqlx::query(
        r#"
        INSERT INTO books (id, isbn, title, author, description, genre, pages, publisher, thumbnail_url)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(&book.isbn)
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.description)
    .bind(&book.genre)
    .bind(book.pages)
    .bind(&book.publisher)
    .bind(&book.thumbnail_url)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(Book {
            id,
            isbn: book.isbn,
            title: book.title,
            author: book.author,
            description: book.description,
            genre: book.genre,
            pages: book.pages,
            publisher: book.publisher,
            thumbnail_url: book.thumbnail_url,
        }),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(InsertBookError::Duplicate(book.isbn))
        }
        Err(e) => Err(e.into()),
    }
}

/// Load all books, newest first
pub async fn list_books(pool: &SqlitePool) -> Result<Vec<Book>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, isbn, title, author, description, genre, pages, publisher, thumbnail_url
        FROM books
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(book_from_row).collect()
}

fn book_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Book, sqlx::Error> {
    let id_str: String = row.get("id");
    let id = Uuid::parse_str(&id_str).map_err(|e| sqlx::Error::ColumnDecode {
        index: "id".to_string(),
        source: Box::new(e),
    })?;

    Ok(Book {
        id,
        isbn: row.get("isbn"),
        title: row.get("title"),
        author: row.get("author"),
        description: row.get("description"),
        genre: row.get("genre"),
        pages: row.get("pages"),
        publisher: row.get("publisher"),
        thumbnail_url: row.get("thumbnail_url"),
    })
}
