//! Language model gateways.

use std::sync::Arc;

use ragline_core::config::LlmConfig;
use ragline_core::traits::LanguageModel;
use ragline_core::Result;

pub mod error;
pub mod gemini;

pub use error::LlmError;
pub use gemini::{parse_response, GeminiGateway};

/// Build the configured gateway. Fails when no API key is available.
pub fn language_model_from_settings(config: &LlmConfig) -> Result<Arc<dyn LanguageModel>> {
    Ok(Arc::new(GeminiGateway::new(config)?))
}
