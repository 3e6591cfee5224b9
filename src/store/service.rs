//! Survey service: lifecycle rules, response ingestion and analytics
//! entry points on top of a [`Dataset`].
//!
//! Owner-scoped operations treat a survey owned by someone else exactly
//! like a missing one.

use super::validate::{normalize_email, validate_answers, validate_questions};
use super::Dataset;
use crate::analysis;
use crate::error::StoreError;
use crate::models::{
    Answers, DashboardOverview, NpsBreakdown, Question, QuestionAnalytics, Respondent, Response,
    Survey, SurveyOverview, SurveyStatus,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

/// User-provided survey content for create and update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SurveyDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Who is submitting a response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RespondentInput {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A response submission as received from a respondent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub respondent: RespondentInput,
    pub answers: Answers,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Filter for listing surveys.
#[derive(Debug, Clone, Default)]
pub struct SurveyFilter {
    pub status: Option<SurveyStatus>,
    /// Case-insensitive match on title or description.
    pub search: Option<String>,
}

/// Survey listing entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveySummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: SurveyStatus,
    pub questions_count: usize,
    pub responses_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

/// Respondent listing entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RespondentSummary {
    #[serde(flatten)]
    pub respondent: Respondent,
    pub responses_count: usize,
}

/// One entry of a respondent's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RespondentResponse {
    pub response_id: String,
    pub survey_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey_title: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// A respondent with all of their responses, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RespondentHistory {
    #[serde(flatten)]
    pub respondent: Respondent,
    pub responses: Vec<RespondentResponse>,
}

/// Respondent fields attached to a listed response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRespondent {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// One response of a survey as listed for its owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEntry {
    pub id: String,
    pub respondent: ResponseRespondent,
    pub answers: Answers,
    pub completed_at: DateTime<Utc>,
}

/// What a respondent sees before answering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicSurvey {
    pub id: String,
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
}

impl From<&Survey> for PublicSurvey {
    fn from(survey: &Survey) -> Self {
        PublicSurvey {
            id: survey.id.clone(),
            title: survey.title.clone(),
            description: survey.description.clone(),
            questions: survey.questions.clone(),
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Service over an owned dataset.
#[derive(Debug, Default)]
pub struct SurveyService {
    data: Dataset,
}

impl SurveyService {
    pub fn new(data: Dataset) -> Self {
        Self { data }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.data
    }

    fn owned_survey(&self, owner_id: &str, survey_id: &str) -> Result<&Survey, StoreError> {
        self.data
            .survey(survey_id)
            .filter(|s| s.owner_id == owner_id)
            .ok_or_else(|| StoreError::survey_not_found(survey_id))
    }

    fn owned_survey_mut(
        &mut self,
        owner_id: &str,
        survey_id: &str,
    ) -> Result<&mut Survey, StoreError> {
        self.data
            .surveys
            .iter_mut()
            .find(|s| s.id == survey_id && s.owner_id == owner_id)
            .ok_or_else(|| StoreError::survey_not_found(survey_id))
    }

    fn check_draft(draft: &SurveyDraft) -> Result<(), StoreError> {
        if draft.title.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "Survey title must not be empty".to_string(),
            ));
        }
        validate_questions(&draft.questions)
    }

    // ---- surveys ----

    /// Create a new draft survey.
    pub fn create_survey(&mut self, owner_id: &str, draft: SurveyDraft) -> Result<&Survey, StoreError> {
        Self::check_draft(&draft)?;

        let now = Utc::now();
        let survey = Survey {
            id: new_id(),
            owner_id: owner_id.to_string(),
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            status: SurveyStatus::Draft,
            questions: draft.questions,
            created_at: now,
            updated_at: now,
            published_at: None,
        };

        info!("Created survey {} ({})", survey.id, survey.title);
        self.data.surveys.push(survey);
        Ok(&self.data.surveys[self.data.surveys.len() - 1])
    }

    pub fn get_survey(&self, owner_id: &str, survey_id: &str) -> Result<&Survey, StoreError> {
        self.owned_survey(owner_id, survey_id)
    }

    /// Replace title, description and questions of a draft survey.
    pub fn update_survey(
        &mut self,
        owner_id: &str,
        survey_id: &str,
        draft: SurveyDraft,
    ) -> Result<&Survey, StoreError> {
        let survey = self.owned_survey_mut(owner_id, survey_id)?;
        if survey.status != SurveyStatus::Draft {
            return Err(StoreError::InvalidState(
                "Cannot update a published survey".to_string(),
            ));
        }
        Self::check_draft(&draft)?;

        survey.title = draft.title.trim().to_string();
        survey.description = draft.description.trim().to_string();
        survey.questions = draft.questions;
        survey.updated_at = Utc::now();

        debug!("Updated survey {}", survey.id);
        Ok(survey)
    }

    /// Move a draft survey to active.
    pub fn publish_survey(&mut self, owner_id: &str, survey_id: &str) -> Result<&Survey, StoreError> {
        let survey = self.owned_survey_mut(owner_id, survey_id)?;
        if survey.status != SurveyStatus::Draft {
            return Err(StoreError::InvalidState(
                "Survey is already published".to_string(),
            ));
        }

        let now = Utc::now();
        survey.status = SurveyStatus::Active;
        survey.published_at = Some(now);
        survey.updated_at = now;

        info!("Published survey {}", survey.id);
        Ok(survey)
    }

    /// Close an active survey for new responses.
    pub fn complete_survey(
        &mut self,
        owner_id: &str,
        survey_id: &str,
    ) -> Result<&Survey, StoreError> {
        let survey = self.owned_survey_mut(owner_id, survey_id)?;
        if survey.status != SurveyStatus::Active {
            return Err(StoreError::InvalidState(format!(
                "Only active surveys can be completed (status: {})",
                survey.status
            )));
        }

        survey.status = SurveyStatus::Completed;
        survey.updated_at = Utc::now();

        info!("Completed survey {}", survey.id);
        Ok(survey)
    }

    /// Delete a survey together with its responses.
    pub fn delete_survey(&mut self, owner_id: &str, survey_id: &str) -> Result<(), StoreError> {
        self.owned_survey(owner_id, survey_id)?;

        self.data.surveys.retain(|s| s.id != survey_id);
        let before = self.data.responses.len();
        self.data.responses.retain(|r| r.survey_id != survey_id);

        info!(
            "Deleted survey {} and {} responses",
            survey_id,
            before - self.data.responses.len()
        );
        Ok(())
    }

    /// List an owner's surveys, newest first.
    pub fn list_surveys(&self, owner_id: &str, filter: &SurveyFilter) -> Vec<SurveySummary> {
        let search = filter.search.as_deref().map(str::to_lowercase);

        let mut surveys: Vec<&Survey> = self
            .data
            .surveys
            .iter()
            .filter(|s| s.owner_id == owner_id)
            .filter(|s| filter.status.map_or(true, |status| s.status == status))
            .filter(|s| {
                search.as_deref().map_or(true, |q| {
                    contains_ci(&s.title, q) || contains_ci(&s.description, q)
                })
            })
            .collect();
        surveys.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        surveys
            .into_iter()
            .map(|s| SurveySummary {
                id: s.id.clone(),
                title: s.title.clone(),
                description: s.description.clone(),
                status: s.status,
                questions_count: s.questions.len(),
                responses_count: self.data.response_count_for(&s.id),
                created_at: s.created_at,
                updated_at: s.updated_at,
                published_at: s.published_at,
            })
            .collect()
    }

    /// A survey as shown to respondents; only active surveys are visible.
    pub fn public_survey(&self, survey_id: &str) -> Result<&Survey, StoreError> {
        self.data
            .survey(survey_id)
            .filter(|s| s.status == SurveyStatus::Active)
            .ok_or_else(|| StoreError::survey_not_found(survey_id))
    }

    // ---- responses ----

    /// Validate and store a response, creating the respondent on first
    /// submission.
    pub fn submit_response(
        &mut self,
        survey_id: &str,
        submission: Submission,
    ) -> Result<&Response, StoreError> {
        let survey = self.public_survey(survey_id)?;
        validate_answers(survey, &submission.answers)?;

        let respondent_id = self.find_or_create_respondent(&submission);
        let response = Response {
            id: new_id(),
            survey_id: survey_id.to_string(),
            respondent_id,
            answers: submission.answers,
            completed_at: Utc::now(),
            ip_address: submission.ip_address,
            user_agent: submission.user_agent,
        };

        info!(
            "Stored response {} for survey {}",
            response.id, response.survey_id
        );
        self.data.responses.push(response);
        Ok(&self.data.responses[self.data.responses.len() - 1])
    }

    fn find_or_create_respondent(&mut self, submission: &Submission) -> String {
        let email = normalize_email(submission.respondent.email.as_deref());

        if let Some(existing) = email.as_deref().and_then(|e| self.data.respondent_by_email(e)) {
            debug!("Reusing respondent {}", existing.id);
            return existing.id.clone();
        }

        let mut metadata = BTreeMap::new();
        if let Some(ip) = &submission.ip_address {
            metadata.insert("ip_address".to_string(), ip.clone());
        }
        if let Some(ua) = &submission.user_agent {
            metadata.insert("user_agent".to_string(), ua.clone());
        }

        let now = Utc::now();
        let respondent = Respondent {
            id: new_id(),
            email,
            name: submission
                .respondent
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from),
            metadata,
            created_at: now,
            updated_at: now,
        };

        debug!("Created respondent {}", respondent.id);
        let id = respondent.id.clone();
        self.data.respondents.push(respondent);
        id
    }

    /// Responses to an owned survey, newest first, optionally restricted
    /// to completion dates within `[from, to]`.
    pub fn survey_responses(
        &self,
        owner_id: &str,
        survey_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<(&Survey, Vec<Response>), StoreError> {
        let survey = self.owned_survey(owner_id, survey_id)?;
        let responses = self.data.responses_for_survey(survey_id);
        Ok((survey, analysis::responses_in_range(&responses, from, to)))
    }

    /// Responses to an owned survey with respondent details, newest first.
    pub fn list_responses(
        &self,
        owner_id: &str,
        survey_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<ResponseEntry>, StoreError> {
        let (_, responses) = self.survey_responses(owner_id, survey_id, from, to)?;

        Ok(responses
            .into_iter()
            .map(|r| {
                let respondent = self.data.respondent(&r.respondent_id);
                ResponseEntry {
                    respondent: ResponseRespondent {
                        email: respondent.and_then(|p| p.email.clone()),
                        name: respondent.and_then(|p| p.name.clone()),
                        id: r.respondent_id,
                    },
                    id: r.id,
                    answers: r.answers,
                    completed_at: r.completed_at,
                }
            })
            .collect())
    }

    // ---- respondents ----

    /// List respondents with their response counts, newest first.
    pub fn list_respondents(&self, search: Option<&str>) -> Vec<RespondentSummary> {
        let search = search.map(str::to_lowercase);

        let mut respondents: Vec<&Respondent> = self
            .data
            .respondents
            .iter()
            .filter(|r| {
                search.as_deref().map_or(true, |q| {
                    r.email.as_deref().map_or(false, |e| contains_ci(e, q))
                        || r.name.as_deref().map_or(false, |n| contains_ci(n, q))
                })
            })
            .collect();
        respondents.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        respondents
            .into_iter()
            .map(|r| RespondentSummary {
                respondent: r.clone(),
                responses_count: self.data.response_count_by_respondent(&r.id),
            })
            .collect()
    }

    /// A respondent together with the responses they submitted.
    pub fn respondent_history(&self, respondent_id: &str) -> Result<RespondentHistory, StoreError> {
        let respondent = self
            .data
            .respondent(respondent_id)
            .ok_or_else(|| StoreError::respondent_not_found(respondent_id))?;

        let mut responses: Vec<RespondentResponse> = self
            .data
            .responses
            .iter()
            .filter(|r| r.respondent_id == respondent_id)
            .map(|r| RespondentResponse {
                response_id: r.id.clone(),
                survey_id: r.survey_id.clone(),
                survey_title: self.data.survey(&r.survey_id).map(|s| s.title.clone()),
                completed_at: r.completed_at,
            })
            .collect();
        responses.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

        Ok(RespondentHistory {
            respondent: respondent.clone(),
            responses,
        })
    }

    // ---- analytics ----

    pub fn survey_overview(
        &self,
        owner_id: &str,
        survey_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<SurveyOverview, StoreError> {
        let (survey, responses) = self.survey_responses(owner_id, survey_id, from, to)?;
        Ok(analysis::compute_survey_overview(survey, &responses))
    }

    pub fn question_analytics(
        &self,
        owner_id: &str,
        survey_id: &str,
        question_id: &str,
    ) -> Result<QuestionAnalytics, StoreError> {
        let (survey, responses) = self.survey_responses(owner_id, survey_id, None, None)?;
        Ok(analysis::compute_question_analytics(
            survey,
            &responses,
            question_id,
        )?)
    }

    /// NPS for a question, or for the survey's first NPS question when
    /// none is given.
    pub fn nps(
        &self,
        owner_id: &str,
        survey_id: &str,
        question_id: Option<&str>,
    ) -> Result<NpsBreakdown, StoreError> {
        let (survey, responses) = self.survey_responses(owner_id, survey_id, None, None)?;

        let question = match question_id {
            Some(id) => survey.question(id).ok_or_else(|| StoreError::NotFound {
                kind: "question",
                id: id.to_string(),
            })?,
            None => survey.first_nps_question().ok_or_else(|| StoreError::NotFound {
                kind: "nps question",
                id: survey_id.to_string(),
            })?,
        };

        Ok(analysis::compute_nps(&responses, &question.id))
    }

    pub fn dashboard(&self, owner_id: &str, limit: usize) -> DashboardOverview {
        let surveys: Vec<Survey> = self
            .data
            .surveys
            .iter()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();

        analysis::compute_dashboard_overview(&surveys, &self.data.responses_by_survey(), limit)
    }
}
