//! The log record produced by a completed application session.

use chrono::{DateTime, Utc};

/// A completed application, ready for publication to a guild log channel.
///
/// Fields are ordered (question, answer) pairs in ask order, one per
/// question asked. Published as an embed by the outbound layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationLog {
    pub title: String,
    pub fields: Vec<(String, String)>,
    pub timestamp: DateTime<Utc>,
}

impl ApplicationLog {
    /// Builds the log record from a session's accumulated answers.
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self {
            title: "New Application".to_string(),
            fields,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_field_order() {
        let log = ApplicationLog::new(vec![
            ("Why do you want to join?".to_string(), "Because".to_string()),
            ("Experience?".to_string(), "5 years".to_string()),
        ]);

        assert_eq!(log.title, "New Application");
        assert_eq!(log.fields[0].0, "Why do you want to join?");
        assert_eq!(log.fields[1].1, "5 years");
    }
}
