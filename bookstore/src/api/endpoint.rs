use axum::extract::State;
use axum::Json;
use bytes::Bytes;

use crate::api::errors::BookError;
use crate::api::types::{
    AddBookRequest, AddBookResponse, CheckBookRequest, CheckBookResponse, RemoveBookRequest,
    RemoveBookResponse, UpdateBookRequest, UpdateBookResponse,
};
use crate::books::book_models::Book;
use crate::router;

/// Register a new book. The record is not cached until first read.
pub async fn add(
    State(state): State<router::State>,
    body: Bytes,
) -> Result<Json<AddBookResponse>, BookError> {
    let request: AddBookRequest = serde_json::from_slice(&body)?;

    state
        .book_model
        .insert(&Book {
            name: request.name,
            price: request.price,
        })
        .await?;

    Ok(Json(AddBookResponse { ok: true }))
}

/// Look a book up by name. A missing book is a normal `found: false`
/// response here, matching the original check semantics; only store and
/// cache failures surface as errors.
pub async fn check(
    State(state): State<router::State>,
    body: Bytes,
) -> Result<Json<CheckBookResponse>, BookError> {
    let request: CheckBookRequest = serde_json::from_slice(&body)?;

    match state.book_model.find_one(&request.name).await {
        Ok(book) => Ok(Json(CheckBookResponse {
            found: true,
            price: book.price,
        })),
        Err(BookError::NotFound) => Ok(Json(CheckBookResponse {
            found: false,
            price: 0,
        })),
        Err(e) => Err(e),
    }
}

pub async fn update(
    State(state): State<router::State>,
    body: Bytes,
) -> Result<Json<UpdateBookResponse>, BookError> {
    let request: UpdateBookRequest = serde_json::from_slice(&body)?;

    state
        .book_model
        .update(&Book {
            name: request.name,
            price: request.price,
        })
        .await?;

    Ok(Json(UpdateBookResponse { ok: true }))
}

pub async fn remove(
    State(state): State<router::State>,
    body: Bytes,
) -> Result<Json<RemoveBookResponse>, BookError> {
    let request: RemoveBookRequest = serde_json::from_slice(&body)?;

    state.book_model.delete(&request.name).await?;

    Ok(Json(RemoveBookResponse { ok: true }))
}
