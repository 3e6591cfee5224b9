//! Document store for surveys, respondents and responses.
//!
//! The whole collection set lives in one JSON data file. It is loaded
//! into a [`Dataset`], mutated through [`SurveyService`], and written
//! back by the caller.

pub mod service;
pub mod validate;

pub use service::*;

use crate::error::StoreError;
use crate::models::{Respondent, Response, Survey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// All persisted documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub surveys: Vec<Survey>,
    #[serde(default)]
    pub respondents: Vec<Respondent>,
    #[serde(default)]
    pub responses: Vec<Response>,
}

impl Dataset {
    /// Parse a dataset from JSON text.
    pub fn from_json(content: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a dataset from a data file.
    ///
    /// A missing file yields an empty dataset.
    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        if !tokio::fs::try_exists(path).await? {
            info!("Data file {} not found, starting empty", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let dataset = Self::from_json(&content)?;

        debug!(
            "Loaded {} surveys, {} respondents, {} responses from {}",
            dataset.surveys.len(),
            dataset.respondents.len(),
            dataset.responses.len(),
            path.display()
        );

        Ok(dataset)
    }

    /// Write the dataset to a data file, replacing it atomically.
    pub async fn save(&self, path: &Path) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(self)?;
        let tmp_path = path.with_extension("json.tmp");

        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, path).await?;

        debug!("Saved dataset to {}", path.display());
        Ok(())
    }

    pub fn survey(&self, survey_id: &str) -> Option<&Survey> {
        self.surveys.iter().find(|s| s.id == survey_id)
    }

    pub fn respondent(&self, respondent_id: &str) -> Option<&Respondent> {
        self.respondents.iter().find(|r| r.id == respondent_id)
    }

    /// Find a respondent by (already normalized) email.
    pub fn respondent_by_email(&self, email: &str) -> Option<&Respondent> {
        self.respondents
            .iter()
            .find(|r| r.email.as_deref() == Some(email))
    }

    /// Responses to a survey, newest first.
    pub fn responses_for_survey(&self, survey_id: &str) -> Vec<Response> {
        let mut responses: Vec<Response> = self
            .responses
            .iter()
            .filter(|r| r.survey_id == survey_id)
            .cloned()
            .collect();
        responses.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        responses
    }

    pub fn response_count_for(&self, survey_id: &str) -> usize {
        self.responses
            .iter()
            .filter(|r| r.survey_id == survey_id)
            .count()
    }

    pub fn response_count_by_respondent(&self, respondent_id: &str) -> usize {
        self.responses
            .iter()
            .filter(|r| r.respondent_id == respondent_id)
            .count()
    }

    /// Group responses by survey id.
    pub fn responses_by_survey(&self) -> HashMap<String, Vec<Response>> {
        let mut grouped: HashMap<String, Vec<Response>> = HashMap::new();

        for response in &self.responses {
            grouped
                .entry(response.survey_id.clone())
                .or_default()
                .push(response.clone());
        }

        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnswerValue, SurveyStatus};
    use chrono::{Duration, Utc};

    fn sample_dataset() -> Dataset {
        Dataset::from_json(include_str!("../../fixtures/dataset.json")).unwrap()
    }

    #[test]
    fn test_fixture_parses() {
        let dataset = sample_dataset();

        assert_eq!(dataset.surveys.len(), 3);
        assert_eq!(dataset.respondents.len(), 3);
        assert_eq!(dataset.responses.len(), 5);

        let survey = dataset.survey("srv-feedback").unwrap();
        assert_eq!(survey.status, SurveyStatus::Active);
        assert_eq!(survey.questions.len(), 4);
    }

    #[test]
    fn test_responses_for_survey_newest_first() {
        let mut dataset = sample_dataset();
        let now = Utc::now();
        for (i, response) in dataset.responses.iter_mut().enumerate() {
            response.completed_at = now - Duration::hours(i as i64);
        }

        let responses = dataset.responses_for_survey("srv-feedback");

        assert_eq!(responses.len(), 4);
        assert!(responses
            .windows(2)
            .all(|w| w[0].completed_at >= w[1].completed_at));
        assert_eq!(dataset.response_count_for("srv-feedback"), 4);
        assert_eq!(dataset.response_count_for("srv-missing"), 0);
    }

    #[test]
    fn test_responses_by_survey() {
        let dataset = sample_dataset();
        let grouped = dataset.responses_by_survey();

        assert_eq!(grouped.get("srv-feedback").map(Vec::len), Some(4));
        assert_eq!(grouped.get("srv-onboarding").map(Vec::len), Some(1));
        assert!(grouped.get("srv-draft").is_none());
    }

    #[test]
    fn test_respondent_by_email() {
        let dataset = sample_dataset();
        let respondent = dataset.respondent_by_email("ada@example.com").unwrap();

        assert_eq!(respondent.name.as_deref(), Some("Ada"));
        assert_eq!(dataset.response_count_by_respondent(&respondent.id), 2);
        assert!(dataset.respondent_by_email("nobody@example.com").is_none());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let dataset = tokio_test::block_on(Dataset::load(&path)).unwrap();
        assert_eq!(dataset, Dataset::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("surveys.json");
        let dataset = sample_dataset();

        tokio_test::block_on(dataset.save(&path)).unwrap();
        let reloaded = tokio_test::block_on(Dataset::load(&path)).unwrap();

        assert_eq!(reloaded, dataset);
        assert!(!path.with_extension("json.tmp").exists());

        let response = &reloaded.responses[0];
        assert_eq!(response.answers.get("q-rating"), Some(&AnswerValue::from(5)));
    }

    #[test]
    fn test_load_invalid_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = tokio_test::block_on(Dataset::load(&path)).unwrap_err();
        assert!(matches!(err, StoreError::Parse(_)));
    }
}
