//! Response aggregation and statistics.
//!
//! Every function here is pure: it takes already-fetched surveys and
//! responses and returns a fresh summary without touching its inputs.
//! Percentages over an empty response set are 0, never NaN.

use crate::error::AnalyticsError;
use crate::models::{
    AnswerValue, DailyCount, DashboardOverview, Demographics, DeviceCategory, NpsBreakdown,
    QuestionAnalytics, QuestionDropOff, QuestionStats, Response, Scalar, Survey, SurveyOverview,
    SurveyStatus, TopSurvey, Trends,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Default number of surveys listed on the dashboard.
pub const DEFAULT_TOP_SURVEYS: usize = 5;

/// `part / total * 100`, or 0 when `total` is 0.
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64) * 100.0
}

/// Whether a response has a key for every question of the survey.
///
/// The `required` flag is not consulted.
pub fn is_complete(survey: &Survey, response: &Response) -> bool {
    survey
        .questions
        .iter()
        .all(|q| response.answers.contains_key(&q.id))
}

/// Count responses per UTC completion date, in first-seen order.
pub fn daily_trend(responses: &[Response]) -> Vec<DailyCount> {
    let mut trend: Vec<DailyCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for response in responses {
        let date = response.completed_at.format("%Y-%m-%d").to_string();
        match index.get(&date) {
            Some(&i) => trend[i].responses += 1,
            None => {
                index.insert(date.clone(), trend.len());
                trend.push(DailyCount { date, responses: 1 });
            }
        }
    }

    trend
}

/// Count responses per device class.
pub fn device_breakdown(responses: &[Response]) -> BTreeMap<DeviceCategory, usize> {
    let mut devices: BTreeMap<DeviceCategory, usize> = BTreeMap::new();

    for response in responses {
        let device = DeviceCategory::from_user_agent(response.user_agent.as_deref());
        *devices.entry(device).or_default() += 1;
    }

    devices
}

/// Answer rate of each question, in survey order.
pub fn drop_off_per_question(survey: &Survey, responses: &[Response]) -> Vec<QuestionDropOff> {
    survey
        .questions
        .iter()
        .map(|question| {
            let answered = responses.iter().filter(|r| r.has_answer(&question.id)).count();
            QuestionDropOff {
                question_id: question.id.clone(),
                completion_rate: percentage(answered, responses.len()),
            }
        })
        .collect()
}

/// Compute the survey-level overview.
pub fn compute_survey_overview(survey: &Survey, responses: &[Response]) -> SurveyOverview {
    let total = responses.len();
    let complete = responses.iter().filter(|r| is_complete(survey, r)).count();

    debug!(
        "Survey {}: {} responses, {} complete",
        survey.id, total, complete
    );

    SurveyOverview {
        survey_id: survey.id.clone(),
        total_responses: total,
        completion_rate: percentage(complete, total),
        trends: Trends {
            daily_responses: daily_trend(responses),
        },
        demographics: Demographics {
            devices: device_breakdown(responses),
        },
        drop_off_analysis: drop_off_per_question(survey, responses),
    }
}

/// Count answer values for one question. List answers count each element.
pub fn response_distribution(responses: &[Response], question_id: &str) -> BTreeMap<String, usize> {
    let mut distribution: BTreeMap<String, usize> = BTreeMap::new();

    for answer in responses.iter().filter_map(|r| r.answers.get(question_id)) {
        if !answer.is_answered() {
            continue;
        }
        for label in answer.labels() {
            *distribution.entry(label).or_default() += 1;
        }
    }

    distribution
}

/// Compute skip rate and distribution for one question.
pub fn compute_question_analytics(
    survey: &Survey,
    responses: &[Response],
    question_id: &str,
) -> Result<QuestionAnalytics, AnalyticsError> {
    let question = survey
        .question(question_id)
        .ok_or_else(|| AnalyticsError::question_not_found(question_id))?;

    let total = responses.len();
    let answered = responses.iter().filter(|r| r.has_answer(question_id)).count();

    let distribution = if question.question_type.has_distribution() {
        response_distribution(responses, question_id)
    } else {
        BTreeMap::new()
    };

    Ok(QuestionAnalytics {
        question_id: question.id.clone(),
        question_text: question.text.clone(),
        question_type: question.question_type,
        analytics: QuestionStats {
            total_responses: total,
            skip_rate: percentage(total - answered, total),
            response_distribution: distribution,
        },
    })
}

/// NPS class of a single answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpsClass {
    Detractor,
    Passive,
    Promoter,
}

impl NpsClass {
    pub fn from_score(score: i64) -> Option<Self> {
        match score {
            0..=6 => Some(NpsClass::Detractor),
            7..=8 => Some(NpsClass::Passive),
            9..=10 => Some(NpsClass::Promoter),
            _ => None,
        }
    }
}

/// Integer 0..=10 score of an NPS answer. Numeric strings are accepted;
/// fractions, out-of-range numbers and other values are not.
pub fn nps_score(answer: &AnswerValue) -> Option<i64> {
    let score = match answer {
        AnswerValue::Single(Scalar::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        })?,
        AnswerValue::Single(Scalar::Text(s)) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (0..=10).contains(&score).then_some(score)
}

/// Net Promoter Score for a question, with the class counts behind it.
///
/// `score` is `round((promoters - detractors) / classified * 100)`, or 0
/// when nothing could be classified.
pub fn compute_nps(responses: &[Response], question_id: &str) -> NpsBreakdown {
    let mut breakdown = NpsBreakdown {
        question_id: question_id.to_string(),
        ..Default::default()
    };

    for answer in responses.iter().filter_map(|r| r.answers.get(question_id)) {
        if !answer.is_answered() {
            continue;
        }
        match nps_score(answer).and_then(NpsClass::from_score) {
            Some(NpsClass::Promoter) => breakdown.promoters += 1,
            Some(NpsClass::Passive) => breakdown.passives += 1,
            Some(NpsClass::Detractor) => breakdown.detractors += 1,
            None => breakdown.excluded += 1,
        }
    }

    let classified = breakdown.classified();
    if classified > 0 {
        let net = breakdown.promoters as f64 - breakdown.detractors as f64;
        breakdown.score = (net / classified as f64 * 100.0).round() as i32;
    }

    if breakdown.excluded > 0 {
        debug!(
            "NPS {}: excluded {} unclassifiable answers",
            question_id, breakdown.excluded
        );
    }

    breakdown
}

/// Compute the owner-wide dashboard. Surveys with equal response counts
/// keep their input order.
pub fn compute_dashboard_overview(
    surveys: &[Survey],
    responses_by_survey: &HashMap<String, Vec<Response>>,
    limit: usize,
) -> DashboardOverview {
    let count_for = |survey: &Survey| {
        responses_by_survey
            .get(&survey.id)
            .map(Vec::len)
            .unwrap_or(0)
    };

    let mut ranked: Vec<TopSurvey> = surveys
        .iter()
        .map(|s| TopSurvey {
            survey_id: s.id.clone(),
            title: s.title.clone(),
            total_responses: count_for(s),
        })
        .collect();

    // stable sort
    ranked.sort_by_key(|s| std::cmp::Reverse(s.total_responses));
    ranked.truncate(limit);

    DashboardOverview {
        total_surveys: surveys.len(),
        total_responses: surveys.iter().map(count_for).sum(),
        active_surveys: surveys
            .iter()
            .filter(|s| s.status == SurveyStatus::Active)
            .count(),
        top_surveys: ranked,
    }
}

/// Keep responses completed within `[from, to]` (inclusive UTC dates).
pub fn responses_in_range(
    responses: &[Response],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<Response> {
    responses
        .iter()
        .filter(|r| {
            let day = r.completed_at.date_naive();
            from.map_or(true, |f| day >= f) && to.map_or(true, |t| day <= t)
        })
        .cloned()
        .collect()
}
