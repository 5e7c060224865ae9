//! The shared application question set.

use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::AppError;

/// Ordered sequence of application prompts.
///
/// Loaded once at startup from `questions.json` and shared read-only across
/// every session; there is no reload path, so a running session can never
/// observe the set changing under it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionSet {
    questions: Vec<String>,
}

impl QuestionSet {
    /// Loads the question set from `path`. A missing file yields an empty set.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.questions.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[cfg(test)]
    pub fn from_prompts(prompts: &[&str]) -> Self {
        Self {
            questions: prompts.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn loads_questions_in_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("questions.json");
        std::fs::write(
            &path,
            r#"{"questions": ["Why do you want to join?", "Experience?"]}"#,
        )
        .unwrap();

        let questions = QuestionSet::load(&path).await.unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions.get(0), Some("Why do you want to join?"));
        assert_eq!(questions.get(1), Some("Experience?"));
        assert_eq!(questions.get(2), None);
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let questions = QuestionSet::load(temp_dir.path().join("questions.json"))
            .await
            .unwrap();

        assert!(questions.is_empty());
    }
}
