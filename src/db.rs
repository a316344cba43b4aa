//! SQLite persistence for accounts and reviews.
//!
//! Only inserts and reads are exposed. Uniqueness of username and email is
//! enforced by the schema; callers classify the resulting error with
//! [`unique_conflict`].

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::model::{ReviewModel, ReviewModelCreate, UserModel, UserModelCreate};

const MAX_CONNECTIONS: u32 = 5;

pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
}

pub async fn create_schema(db: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username VARCHAR(50) NOT NULL UNIQUE,
            email VARCHAR(120) NOT NULL UNIQUE,
            password VARCHAR(100) NOT NULL
        )
        "#,
    )
    .execute(db)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            movie VARCHAR(100) NOT NULL,
            rating INTEGER NOT NULL,
            comment TEXT NOT NULL,
            username VARCHAR(50) NOT NULL,
            user_id INTEGER NOT NULL REFERENCES users (id)
        )
        "#,
    )
    .execute(db)
    .await?;

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    Username,
    Email,
}

/// Which unique column an insert collided with, if the error is a
/// uniqueness violation at all.
pub fn unique_conflict(err: &sqlx::Error) -> Option<Conflict> {
    let db_err = err.as_database_error()?;
    if !db_err.is_unique_violation() {
        return None;
    }
    // SQLite reports "UNIQUE constraint failed: users.email"
    let message = db_err.message();
    if message.contains("users.email") {
        Some(Conflict::Email)
    } else {
        Some(Conflict::Username)
    }
}

pub async fn create_user(db: &SqlitePool, user: &UserModelCreate) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO users
        (username, email, password)
        VALUES
        (?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn find_user_by_username(
    db: &SqlitePool,
    username: &str,
) -> Result<Option<UserModel>, sqlx::Error> {
    sqlx::query_as::<_, UserModel>(
        r#"SELECT id, username, email, password FROM users WHERE username = ?"#,
    )
    .bind(username)
    .fetch_optional(db)
    .await
}

pub async fn username_taken(db: &SqlitePool, username: &str) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar(r#"SELECT id FROM users WHERE username = ?"#)
        .bind(username)
        .fetch_optional(db)
        .await?;
    Ok(found.is_some())
}

pub async fn email_taken(db: &SqlitePool, email: &str) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar(r#"SELECT id FROM users WHERE email = ?"#)
        .bind(email)
        .fetch_optional(db)
        .await?;
    Ok(found.is_some())
}

pub async fn create_review(
    db: &SqlitePool,
    review: &ReviewModelCreate,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO reviews
        (movie, rating, comment, username, user_id)
        VALUES
        (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&review.movie)
    .bind(review.rating)
    .bind(&review.comment)
    .bind(&review.username)
    .bind(review.user_id)
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn list_reviews(db: &SqlitePool) -> Result<Vec<ReviewModel>, sqlx::Error> {
    sqlx::query_as::<_, ReviewModel>(
        r#"SELECT id, movie, rating, comment, username, user_id FROM reviews ORDER BY id"#,
    )
    .fetch_all(db)
    .await
}
