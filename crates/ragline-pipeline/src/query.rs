use ragline_core::traits::Generation;

/// Marker the extraction model answers with for off-domain or unusable input.
pub const INVALID_MARKER: &str = "INVALID";

/// Result of the query-extraction step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedQuery {
    /// A search query for the retriever.
    Valid(String),
    /// The model judged the question off-domain, unsafe or unparseable.
    Invalid,
    /// The gateway itself failed; carries its user-facing fallback text.
    GatewayFailure(String),
}

impl ExtractedQuery {
    pub fn from_generation(generation: Generation) -> Self {
        match generation {
            Generation::Failed(fallback) => Self::GatewayFailure(fallback),
            Generation::Completed(text) => Self::parse(&text),
        }
    }

    /// Interpret the model's raw text: `INVALID`, or a query with an optional
    /// `QUERY:` prefix, possibly wrapped in backticks.
    pub fn parse(text: &str) -> Self {
        let unwrapped = strip_fences(text);
        if unwrapped.is_empty() || unwrapped.trim_end_matches('.') == INVALID_MARKER {
            return Self::Invalid;
        }
        let query = match unwrapped.split_once(':') {
            Some((prefix, rest)) if prefix.trim().eq_ignore_ascii_case("QUERY") => strip_fences(rest),
            _ => unwrapped,
        };
        if query.is_empty() {
            Self::Invalid
        } else {
            Self::Valid(query.to_string())
        }
    }
}

fn strip_fences(text: &str) -> &str {
    text.trim().trim_matches('`').trim()
}
