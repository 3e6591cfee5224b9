//! Data models for surveys, respondents and responses.
//!
//! This module contains the persisted documents (surveys, respondents,
//! responses) and the analytics results computed from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle status of a survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyStatus {
    /// Being authored; questions may still change.
    #[default]
    Draft,
    /// Published and accepting responses.
    Active,
    /// Closed for new responses.
    Completed,
}

impl fmt::Display for SurveyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurveyStatus::Draft => write!(f, "draft"),
            SurveyStatus::Active => write!(f, "active"),
            SurveyStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Kind of question, which fixes the shape of a legal answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    ShortText,
    LongText,
    SingleChoice,
    MultipleChoice,
    Rating,
    Nps,
    Email,
    Phone,
    Url,
    Number,
    Emoji,
    Slider,
    Date,
    File,
    Image,
    Matrix,
    Ranking,
}

impl QuestionType {
    /// Whether answers to this question are a list of values.
    pub fn is_list_answer(&self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::Ranking)
    }

    /// Whether analytics report a per-value distribution for this question.
    pub fn has_distribution(&self) -> bool {
        matches!(
            self,
            QuestionType::SingleChoice
                | QuestionType::MultipleChoice
                | QuestionType::Rating
                | QuestionType::Nps
        )
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuestionType::ShortText => "short-text",
            QuestionType::LongText => "long-text",
            QuestionType::SingleChoice => "single-choice",
            QuestionType::MultipleChoice => "multiple-choice",
            QuestionType::Rating => "rating",
            QuestionType::Nps => "nps",
            QuestionType::Email => "email",
            QuestionType::Phone => "phone",
            QuestionType::Url => "url",
            QuestionType::Number => "number",
            QuestionType::Emoji => "emoji",
            QuestionType::Slider => "slider",
            QuestionType::Date => "date",
            QuestionType::File => "file",
            QuestionType::Image => "image",
            QuestionType::Matrix => "matrix",
            QuestionType::Ranking => "ranking",
        };
        write!(f, "{}", name)
    }
}

/// A single question of a survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Identifier, unique within the survey.
    pub id: String,
    /// Question type.
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// Prompt shown to the respondent.
    #[serde(rename = "question", alias = "text")]
    pub text: String,
    /// Option labels (empty for free-text types).
    #[serde(default)]
    pub options: Vec<String>,
    /// Whether an answer must be given.
    #[serde(default)]
    pub required: bool,
}

/// A survey definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Survey {
    pub id: String,
    /// Identifier of the user who owns the survey.
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: SurveyStatus,
    /// Questions in display order.
    #[serde(default)]
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl Survey {
    /// Look up a question by id.
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    /// The first NPS question of the survey, if any.
    pub fn first_nps_question(&self) -> Option<&Question> {
        self.questions
            .iter()
            .find(|q| q.question_type == QuestionType::Nps)
    }
}

/// A primitive answer value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    /// Label used as a distribution bucket key.
    pub fn label(&self) -> String {
        match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Number(n) => number_label(n),
            Scalar::Text(s) => s.clone(),
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, Scalar::Text(s) if s.trim().is_empty())
    }
}

/// `5.0` and `5` share the bucket "5".
fn number_label(n: &serde_json::Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64().filter(|f| f.is_finite() && f.fract() == 0.0) {
            if f == 0.0 {
                return "0".to_string();
            }
            return format!("{:.0}", f);
        }
    }
    n.to_string()
}

/// An answer to one question: nothing, a single primitive, or a list of
/// primitives for multi-select questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Null,
    Single(Scalar),
    List(Vec<Scalar>),
}

impl AnswerValue {
    /// Whether this value counts as an answer (not null, not blank text,
    /// not an empty list).
    pub fn is_answered(&self) -> bool {
        match self {
            AnswerValue::Null => false,
            AnswerValue::Single(s) => !s.is_blank(),
            AnswerValue::List(items) => !items.is_empty(),
        }
    }

    /// Distribution labels contributed by this answer. A list contributes
    /// one label per element.
    pub fn labels(&self) -> Vec<String> {
        match self {
            AnswerValue::Null => Vec::new(),
            AnswerValue::Single(s) => vec![s.label()],
            AnswerValue::List(items) => items.iter().map(Scalar::label).collect(),
        }
    }

    /// Short name of the value's shape, for error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            AnswerValue::Null => "null",
            AnswerValue::Single(_) => "single value",
            AnswerValue::List(_) => "list",
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        AnswerValue::Single(Scalar::Text(s.to_string()))
    }
}

impl From<i64> for AnswerValue {
    fn from(n: i64) -> Self {
        AnswerValue::Single(Scalar::Number(n.into()))
    }
}

impl From<i32> for AnswerValue {
    fn from(n: i32) -> Self {
        AnswerValue::from(i64::from(n))
    }
}

impl From<Vec<&str>> for AnswerValue {
    fn from(items: Vec<&str>) -> Self {
        AnswerValue::List(
            items
                .into_iter()
                .map(|s| Scalar::Text(s.to_string()))
                .collect(),
        )
    }
}

/// Answers keyed by question id.
pub type Answers = BTreeMap<String, AnswerValue>;

/// A person who has submitted responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Respondent {
    pub id: String,
    /// Lowercased email; unique when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form metadata such as `ip_address` and `user_agent`.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One respondent's submission to one survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    pub survey_id: String,
    pub respondent_id: String,
    pub answers: Answers,
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Response {
    /// Whether the response holds a real answer for the question.
    pub fn has_answer(&self, question_id: &str) -> bool {
        self.answers
            .get(question_id)
            .map(AnswerValue::is_answered)
            .unwrap_or(false)
    }
}

/// Coarse device class inferred from a user-agent string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceCategory {
    Desktop,
    Mobile,
    Tablet,
}

impl DeviceCategory {
    /// Classify a user agent. "mobile" wins over "tablet"; anything else,
    /// including a missing user agent, is desktop.
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        let ua = user_agent.unwrap_or("").to_lowercase();
        if ua.contains("mobile") {
            DeviceCategory::Mobile
        } else if ua.contains("tablet") {
            DeviceCategory::Tablet
        } else {
            DeviceCategory::Desktop
        }
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceCategory::Desktop => write!(f, "desktop"),
            DeviceCategory::Mobile => write!(f, "mobile"),
            DeviceCategory::Tablet => write!(f, "tablet"),
        }
    }
}

/// Number of responses completed on one UTC day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCount {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub responses: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trends {
    pub daily_responses: Vec<DailyCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    /// Responses per device class; classes with no responses are absent.
    pub devices: BTreeMap<DeviceCategory, usize>,
}

/// Answer rate of a single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDropOff {
    pub question_id: String,
    /// Percentage of responses that answered the question.
    pub completion_rate: f64,
}

/// Survey-level summary metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyOverview {
    pub survey_id: String,
    pub total_responses: usize,
    /// Percentage of responses with a key for every question.
    pub completion_rate: f64,
    pub trends: Trends,
    pub demographics: Demographics,
    pub drop_off_analysis: Vec<QuestionDropOff>,
}

/// Per-question statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionStats {
    pub total_responses: usize,
    pub skip_rate: f64,
    /// Occurrences per answer value. Empty for free-form question types.
    pub response_distribution: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnalytics {
    pub question_id: String,
    pub question_text: String,
    pub question_type: QuestionType,
    pub analytics: QuestionStats,
}

/// Net Promoter Score with its classification counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpsBreakdown {
    pub question_id: String,
    pub score: i32,
    pub promoters: usize,
    pub passives: usize,
    pub detractors: usize,
    /// Answers that were non-numeric, fractional or outside 0..=10.
    pub excluded: usize,
}

impl NpsBreakdown {
    /// Number of answers that were classified.
    pub fn classified(&self) -> usize {
        self.promoters + self.passives + self.detractors
    }
}

/// Response count of a single survey on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopSurvey {
    pub survey_id: String,
    pub title: String,
    pub total_responses: usize,
}

/// Owner-wide summary across all surveys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardOverview {
    pub total_surveys: usize,
    pub total_responses: usize,
    pub active_surveys: usize,
    pub top_surveys: Vec<TopSurvey>,
}
