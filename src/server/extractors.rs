use axum::extract::{FromRequest, FromRequestParts};

use super::errors::AppError;

/// `axum::Json` whose rejections are reported as 400 JSON bodies.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` whose rejections are reported as 404 JSON bodies.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);
