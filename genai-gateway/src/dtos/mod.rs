pub mod generate;

pub use generate::{GenerateResponse, GenerateTextRequest};
