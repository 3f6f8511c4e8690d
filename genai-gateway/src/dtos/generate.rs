use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateTextRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct GenerateResponse {
    pub result: String,
}
