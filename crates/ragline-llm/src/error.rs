use thiserror::Error;

/// Errors raised while talking to a language model provider.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Provider connection failed: {message}")]
    Connection { message: String },

    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Prompt blocked by safety filter: {reason}")]
    PromptBlocked { reason: String },

    #[error("Response stopped by safety filter")]
    ResponseBlocked,

    #[error("Response had no usable candidate")]
    EmptyResponse,
}

impl LlmError {
    /// What the end user is told when a generation fails this way.
    pub fn fallback_text(&self) -> &'static str {
        match self {
            Self::PromptBlocked { .. } => {
                "I'm sorry, but I can't provide a response to that request due to content safety filters."
            }
            Self::ResponseBlocked => "I'm sorry, but I can't complete the response due to content safety filters.",
            Self::EmptyResponse => "I apologise, but I couldn't generate a response at the moment. Please try again.",
            Self::AuthFailed { .. }
            | Self::Connection { .. }
            | Self::ApiRequest { .. }
            | Self::RateLimited
            | Self::ResponseParse { .. } => {
                "I encountered an error while processing your request. Please try again later."
            }
        }
    }
}

impl From<LlmError> for ragline_core::Error {
    fn from(e: LlmError) -> Self {
        ragline_core::Error::Llm(e.to_string())
    }
}
