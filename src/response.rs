use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;

use crate::pagination::PaginationMeta;

/// Success envelope: `{ success: true, message, data, pagination? }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

pub fn ok<T: Serialize>(message: &str, data: T) -> HttpResponse {
    with_status(StatusCode::OK, message, Some(data))
}

pub fn created<T: Serialize>(message: &str, data: T) -> HttpResponse {
    with_status(StatusCode::CREATED, message, Some(data))
}

pub fn ok_empty(message: &str) -> HttpResponse {
    with_status::<()>(StatusCode::OK, message, None)
}

pub fn paginated<T: Serialize>(message: &str, data: T, pagination: PaginationMeta) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse {
        success: true,
        message: message.to_string(),
        data: Some(data),
        pagination: Some(pagination),
    })
}

fn with_status<T: Serialize>(status: StatusCode, message: &str, data: Option<T>) -> HttpResponse {
    HttpResponse::build(status).json(ApiResponse {
        success: true,
        message: message.to_string(),
        data,
        pagination: None,
    })
}
