//! Success envelope: `{"data": ..., "meta": ...}`.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct One<T> {
    pub data: T,
}

#[derive(Serialize)]
pub struct Many<T> {
    pub data: Vec<T>,
    pub meta: MetaCount,
}

#[derive(Serialize)]
pub struct MetaCount {
    pub count: u64,
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<One<T>>) {
    (StatusCode::CREATED, Json(One { data }))
}

pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<One<T>>) {
    (StatusCode::OK, Json(One { data }))
}

/// Lists always serialize as an array, never `null`, even when empty.
pub fn many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<Many<T>>) {
    let count = data.len() as u64;
    (
        StatusCode::OK,
        Json(Many {
            data,
            meta: MetaCount { count },
        }),
    )
}
