use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub message: &'static str,
    pub converted_file: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
