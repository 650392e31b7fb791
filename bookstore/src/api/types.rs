use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct AddBookRequest {
    pub name: String,
    pub price: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddBookResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckBookRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckBookResponse {
    pub found: bool,
    pub price: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBookRequest {
    pub name: String,
    pub price: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateBookResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveBookRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveBookResponse {
    pub ok: bool,
}
