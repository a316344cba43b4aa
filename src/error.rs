use actix_session::{SessionGetError, SessionInsertError};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::view;

/// Failures a handler cannot recover from. Validation problems and bad
/// credentials never reach this type; they are rendered back to the user.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to read session: {0}")]
    SessionGet(#[from] SessionGetError),

    #[error("failed to write session: {0}")]
    SessionInsert(#[from] SessionInsertError),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        log::error!("{self}");
        HttpResponse::build(self.status_code())
            .content_type("text/html; charset=utf-8")
            .body(view::server_error().into_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn database_errors_render_generic_page() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(err.error_response().into_body())
            .await
            .expect("body");
        let body = String::from_utf8(body.to_vec()).expect("utf8");
        assert!(body.contains("Internal Server Error"));
        assert!(!body.contains("RowNotFound"));
    }
}
