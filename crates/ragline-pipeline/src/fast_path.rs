use std::collections::{BTreeMap, HashMap};

/// Canned replies for greetings and thanks, keyed by lower-cased phrase.
///
/// Built once from configuration and shared read-only between runs.
#[derive(Debug, Clone, Default)]
pub struct FastResponses {
    replies: HashMap<String, String>,
}

impl FastResponses {
    pub fn new(table: &BTreeMap<String, String>) -> Self {
        let replies = table.iter().map(|(phrase, reply)| (phrase.to_lowercase(), reply.clone())).collect();
        Self { replies }
    }

    /// Case-insensitive exact match.
    pub fn lookup(&self, cleaned: &str) -> Option<&str> {
        self.replies.get(&cleaned.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }
}
