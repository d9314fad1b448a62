use serde::Serialize;

pub mod batch;
pub mod health;
pub mod messaging;

/// `{ "status": "success", "data": ... }`
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub status: &'static str,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub const fn new(data: T) -> Self {
        Self { status: "success", data }
    }
}

/// `{ "status": "success", "message": ... }`
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: &'static str,
    pub message: String,
}

impl MessageResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self { status: "success", message: message.into() }
    }
}
