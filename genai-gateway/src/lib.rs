//! genai-gateway: relays text and media prompts to a generative-AI provider.
pub mod config;
pub mod dtos;
pub mod handlers;
pub mod services;
pub mod startup;
