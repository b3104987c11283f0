//! HTTP handlers for the book API

use axum::{
    Json,
    extract::{Path, State},
};

use super::{BookId, Bookshelf};
use crate::api::{CommentForm, NewBookForm, Payload, required};
use crate::error::ApiError;
use crate::handler::AppState;
use crate::model::{Book, BookSummary, CreatedBook};

type ApiResult<T> = Result<T, ApiError>;

fn parse_id(raw: &str) -> ApiResult<BookId> {
    BookId::parse(raw).ok_or_else(|| {
        tracing::debug!(id = raw, "rejected malformed book id");
        ApiError::NoBook
    })
}

pub async fn list_books(State(state): State<AppState>) -> ApiResult<Json<Vec<BookSummary>>> {
    let shelf = Bookshelf::new(state.db.connection());

    let books = shelf
        .list_books()
        .await
        .map_err(ApiError::store("Error fetching books"))?;

    Ok(Json(books))
}

pub async fn create_book(
    State(state): State<AppState>,
    Payload(form): Payload<NewBookForm>,
) -> ApiResult<Json<CreatedBook>> {
    let title = required(form.title).ok_or(ApiError::MissingField("title"))?;
    let shelf = Bookshelf::new(state.db.connection());

    let book = shelf
        .create_book(&title)
        .await
        .map_err(ApiError::store("Error saving book"))?;

    tracing::info!(id = %book.id, "created book");
    Ok(Json(book.into()))
}

pub async fn delete_all_books(State(state): State<AppState>) -> ApiResult<&'static str> {
    let shelf = Bookshelf::new(state.db.connection());

    let deleted = shelf
        .delete_all_books()
        .await
        .map_err(ApiError::store("Error deleting books"))?;

    tracing::info!(deleted, "deleted all books");
    Ok("complete delete successful")
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Book>> {
    let id = parse_id(&id)?;
    let shelf = Bookshelf::new(state.db.connection());

    match shelf.get_book(&id).await {
        Ok(Some(book)) => Ok(Json(book)),
        Ok(None) => Err(ApiError::NoBook),
        Err(e) => Err(ApiError::store("Error finding book")(e)),
    }
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(form): Payload<CommentForm>,
) -> ApiResult<Json<Book>> {
    let id = parse_id(&id)?;
    let comment = required(form.comment).ok_or(ApiError::MissingField("comment"))?;
    let shelf = Bookshelf::new(state.db.connection());

    match shelf.append_comment(&id, &comment).await {
        Ok(Some(book)) => Ok(Json(book)),
        Ok(None) => Err(ApiError::NoBook),
        Err(e) => Err(ApiError::store("Error updating book")(e)),
    }
}

pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<&'static str> {
    let id = parse_id(&id)?;
    let shelf = Bookshelf::new(state.db.connection());

    match shelf.delete_book(&id).await {
        Ok(true) => {
            tracing::info!(id = %id, "deleted book");
            Ok("delete successful")
        }
        Ok(false) => Err(ApiError::NoBook),
        Err(e) => Err(ApiError::store("Error deleting book")(e)),
    }
}
