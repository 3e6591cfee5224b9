//! Report generation.
//!
//! Every command result is a [`Report`]. It renders either as JSON,
//! whose field names are what downstream consumers read, or as
//! Markdown tables for people.

use crate::models::{
    DashboardOverview, NpsBreakdown, QuestionAnalytics, Response, Survey, SurveyOverview,
};
use crate::store::{
    PublicSurvey, RespondentHistory, RespondentSummary, ResponseEntry, SurveySummary,
};
use anyhow::Result;
use serde::Serialize;

/// Result of a command, ready for rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Report {
    Overview(SurveyOverview),
    Question(QuestionAnalytics),
    Nps(NpsBreakdown),
    Dashboard(DashboardOverview),
    Surveys(Vec<SurveySummary>),
    Survey(Survey),
    Responses(Vec<ResponseEntry>),
    PublicSurvey(PublicSurvey),
    Respondents(Vec<RespondentSummary>),
    Respondent(RespondentHistory),
    Submitted(Response),
    Deleted { survey_id: String },
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    Ok(json)
}

/// Generate a Markdown report. Percentages use `precision` decimals.
pub fn generate_markdown_report(report: &Report, precision: usize) -> String {
    match report {
        Report::Overview(overview) => overview_section(overview, precision),
        Report::Question(question) => question_section(question, precision),
        Report::Nps(nps) => nps_section(nps),
        Report::Dashboard(dashboard) => dashboard_section(dashboard),
        Report::Surveys(surveys) => surveys_section(surveys),
        Report::Survey(survey) => survey_section(survey),
        Report::Responses(responses) => responses_section(responses),
        Report::PublicSurvey(survey) => public_survey_section(survey),
        Report::Respondents(respondents) => respondents_section(respondents),
        Report::Respondent(history) => respondent_section(history),
        Report::Submitted(response) => format!(
            "Response `{}` stored for survey `{}` ({} answers).\n",
            response.id,
            response.survey_id,
            response.answers.len()
        ),
        Report::Deleted { survey_id } => format!("Survey `{}` deleted.\n", survey_id),
    }
}

fn pct(value: f64, precision: usize) -> String {
    format!("{:.*}%", precision, value)
}

fn overview_section(overview: &SurveyOverview, precision: usize) -> String {
    let mut section = String::new();

    section.push_str(&format!("# Survey Overview: `{}`\n\n", overview.survey_id));
    section.push_str(&format!(
        "- **Total Responses:** {}\n",
        overview.total_responses
    ));
    section.push_str(&format!(
        "- **Completion Rate:** {}\n\n",
        pct(overview.completion_rate, precision)
    ));

    section.push_str("## Daily Responses\n\n");
    if overview.trends.daily_responses.is_empty() {
        section.push_str("No responses yet.\n\n");
    } else {
        section.push_str("| Date | Responses |\n");
        section.push_str("|:---|:---:|\n");
        for day in &overview.trends.daily_responses {
            section.push_str(&format!("| {} | {} |\n", day.date, day.responses));
        }
        section.push('\n');
    }

    if !overview.demographics.devices.is_empty() {
        section.push_str("## Devices\n\n");
        section.push_str("| Device | Responses |\n");
        section.push_str("|:---|:---:|\n");
        for (device, count) in &overview.demographics.devices {
            section.push_str(&format!("| {} | {} |\n", device, count));
        }
        section.push('\n');
    }

    section.push_str("## Drop-off by Question\n\n");
    section.push_str("| Question | Answered |\n");
    section.push_str("|:---|:---:|\n");
    for entry in &overview.drop_off_analysis {
        section.push_str(&format!(
            "| `{}` | {} |\n",
            entry.question_id,
            pct(entry.completion_rate, precision)
        ));
    }
    section.push('\n');

    section
}

fn question_section(question: &QuestionAnalytics, precision: usize) -> String {
    let mut section = String::new();
    let stats = &question.analytics;

    section.push_str(&format!("# Question `{}`\n\n", question.question_id));
    section.push_str(&format!("> {}\n\n", question.question_text));
    section.push_str(&format!("- **Type:** {}\n", question.question_type));
    section.push_str(&format!(
        "- **Total Responses:** {}\n",
        stats.total_responses
    ));
    section.push_str(&format!(
        "- **Skip Rate:** {}\n\n",
        pct(stats.skip_rate, precision)
    ));

    if !stats.response_distribution.is_empty() {
        section.push_str("## Answers\n\n");
        section.push_str("| Answer | Count |\n");
        section.push_str("|:---|:---:|\n");

        let mut answers: Vec<_> = stats.response_distribution.iter().collect();
        answers.sort_by_key(|(_, count)| std::cmp::Reverse(**count));

        for (answer, count) in answers {
            section.push_str(&format!("| {} | {} |\n", answer, count));
        }
        section.push('\n');
    }

    section
}

fn nps_section(nps: &NpsBreakdown) -> String {
    let mut section = String::new();

    section.push_str(&format!("# NPS: `{}`\n\n", nps.question_id));
    section.push_str(&format!("**Score: {}**\n\n", nps.score));
    section.push_str("| Promoters | Passives | Detractors | Excluded |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        nps.promoters, nps.passives, nps.detractors, nps.excluded
    ));

    section
}

fn dashboard_section(dashboard: &DashboardOverview) -> String {
    let mut section = String::new();

    section.push_str("# Dashboard\n\n");
    section.push_str(&format!("- **Surveys:** {}\n", dashboard.total_surveys));
    section.push_str(&format!(
        "- **Active Surveys:** {}\n",
        dashboard.active_surveys
    ));
    section.push_str(&format!(
        "- **Total Responses:** {}\n\n",
        dashboard.total_responses
    ));

    if !dashboard.top_surveys.is_empty() {
        section.push_str("## Top Surveys\n\n");
        section.push_str("| Survey | Responses |\n");
        section.push_str("|:---|:---:|\n");
        for survey in &dashboard.top_surveys {
            section.push_str(&format!(
                "| {} (`{}`) | {} |\n",
                survey.title, survey.survey_id, survey.total_responses
            ));
        }
        section.push('\n');
    }

    section
}

fn surveys_section(surveys: &[SurveySummary]) -> String {
    if surveys.is_empty() {
        return "No surveys found.\n".to_string();
    }

    let mut section = String::new();
    section.push_str("| Survey | Title | Status | Questions | Responses | Created |\n");
    section.push_str("|:---|:---|:---:|:---:|:---:|:---|\n");
    for s in surveys {
        section.push_str(&format!(
            "| `{}` | {} | {} | {} | {} | {} |\n",
            s.id,
            s.title,
            s.status,
            s.questions_count,
            s.responses_count,
            s.created_at.format("%Y-%m-%d")
        ));
    }

    section
}

fn survey_section(survey: &Survey) -> String {
    let mut section = String::new();

    section.push_str(&format!("# {} (`{}`)\n\n", survey.title, survey.id));
    if !survey.description.is_empty() {
        section.push_str(&format!("{}\n\n", survey.description));
    }
    section.push_str(&format!("- **Status:** {}\n", survey.status));
    if let Some(published) = survey.published_at {
        section.push_str(&format!(
            "- **Published:** {}\n",
            published.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    section.push('\n');

    for (i, q) in survey.questions.iter().enumerate() {
        let required = if q.required { " *(required)*" } else { "" };
        section.push_str(&format!(
            "{}. `{}` [{}] {}{}\n",
            i + 1,
            q.id,
            q.question_type,
            q.text,
            required
        ));
    }

    section
}

fn responses_section(responses: &[ResponseEntry]) -> String {
    if responses.is_empty() {
        return "No responses found.\n".to_string();
    }

    let mut section = String::new();
    section.push_str("| Response | Respondent | Email | Answers | Completed |\n");
    section.push_str("|:---|:---|:---|:---:|:---|\n");
    for r in responses {
        section.push_str(&format!(
            "| `{}` | {} | {} | {} | {} |\n",
            r.id,
            r.respondent.name.as_deref().unwrap_or(&r.respondent.id),
            r.respondent.email.as_deref().unwrap_or("-"),
            r.answers.values().filter(|a| a.is_answered()).count(),
            r.completed_at.format("%Y-%m-%d %H:%M")
        ));
    }

    section
}

fn public_survey_section(survey: &PublicSurvey) -> String {
    let mut section = format!("# {}\n\n", survey.title);
    if !survey.description.is_empty() {
        section.push_str(&format!("{}\n\n", survey.description));
    }

    for (i, q) in survey.questions.iter().enumerate() {
        let marker = if q.required { " *" } else { "" };
        section.push_str(&format!("{}. {}{}\n", i + 1, q.text, marker));
        for option in &q.options {
            section.push_str(&format!("   - {}\n", option));
        }
    }

    section
}

fn respondents_section(respondents: &[RespondentSummary]) -> String {
    if respondents.is_empty() {
        return "No respondents found.\n".to_string();
    }

    let mut section = String::new();
    section.push_str("| Respondent | Email | Name | Responses |\n");
    section.push_str("|:---|:---|:---|:---:|\n");
    for r in respondents {
        section.push_str(&format!(
            "| `{}` | {} | {} | {} |\n",
            r.respondent.id,
            r.respondent.email.as_deref().unwrap_or("-"),
            r.respondent.name.as_deref().unwrap_or("-"),
            r.responses_count
        ));
    }

    section
}

fn respondent_section(history: &RespondentHistory) -> String {
    let mut section = String::new();
    let respondent = &history.respondent;

    section.push_str(&format!("# Respondent `{}`\n\n", respondent.id));
    if let Some(ref email) = respondent.email {
        section.push_str(&format!("- **Email:** {}\n", email));
    }
    if let Some(ref name) = respondent.name {
        section.push_str(&format!("- **Name:** {}\n", name));
    }
    section.push('\n');

    section.push_str("| Response | Survey | Completed |\n");
    section.push_str("|:---|:---|:---|\n");
    for r in &history.responses {
        section.push_str(&format!(
            "| `{}` | {} | {} |\n",
            r.response_id,
            r.survey_title.as_deref().unwrap_or(&r.survey_id),
            r.completed_at.format("%Y-%m-%d %H:%M")
        ));
    }

    section
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis;
    use crate::store::Dataset;

    fn dataset() -> Dataset {
        Dataset::from_json(include_str!("../../fixtures/dataset.json")).unwrap()
    }

    fn feedback_overview() -> SurveyOverview {
        let data = dataset();
        let survey = data.survey("srv-feedback").unwrap();
        let responses = data.responses_for_survey(&survey.id);
        analysis::compute_survey_overview(survey, &responses)
    }

    #[test]
    fn test_overview_json_field_names() {
        let report = Report::Overview(feedback_overview());
        let json = generate_json_report(&report, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["total_responses"], 4);
        assert_eq!(value["completion_rate"], 50.0);
        assert!(value["trends"]["daily_responses"].is_array());
        assert_eq!(value["trends"]["daily_responses"][0]["responses"], 2);
        assert_eq!(value["demographics"]["devices"]["desktop"], 2);
        assert_eq!(value["drop_off_analysis"][1]["question_id"], "q-features");
        assert_eq!(value["drop_off_analysis"][1]["completion_rate"], 75.0);
    }

    #[test]
    fn test_question_json_field_names() {
        let data = dataset();
        let survey = data.survey("srv-feedback").unwrap();
        let responses = data.responses_for_survey(&survey.id);
        let question = analysis::compute_question_analytics(survey, &responses, "q-nps").unwrap();

        let json = generate_json_report(&Report::Question(question), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["question_id"], "q-nps");
        assert_eq!(value["question_type"], "nps");
        assert_eq!(value["analytics"]["total_responses"], 4);
        assert_eq!(value["analytics"]["skip_rate"], 0.0);
        assert_eq!(value["analytics"]["response_distribution"]["10"], 1);
    }

    #[test]
    fn test_overview_markdown() {
        let markdown = generate_markdown_report(&Report::Overview(feedback_overview()), 1);

        assert!(markdown.contains("# Survey Overview: `srv-feedback`"));
        assert!(markdown.contains("**Completion Rate:** 50.0%"));
        assert!(markdown.contains("| 2023-06-01 | 2 |"));
        assert!(markdown.contains("| mobile | 1 |"));
        assert!(markdown.contains("| `q-features` | 75.0% |"));
    }

    #[test]
    fn test_markdown_precision() {
        let markdown = generate_markdown_report(&Report::Overview(feedback_overview()), 0);
        assert!(markdown.contains("**Completion Rate:** 50%"));
    }

    #[test]
    fn test_nps_markdown() {
        let nps = NpsBreakdown {
            question_id: "q-nps".to_string(),
            score: 20,
            promoters: 5,
            passives: 2,
            detractors: 3,
            excluded: 0,
        };

        let markdown = generate_markdown_report(&Report::Nps(nps), 1);
        assert!(markdown.contains("**Score: 20**"));
        assert!(markdown.contains("| 5 | 2 | 3 | 0 |"));
    }

    #[test]
    fn test_dashboard_markdown() {
        let data = dataset();
        let surveys: Vec<Survey> = data
            .surveys
            .iter()
            .filter(|s| s.owner_id == "user-1")
            .cloned()
            .collect();
        let dashboard =
            analysis::compute_dashboard_overview(&surveys, &data.responses_by_survey(), 5);

        let markdown = generate_markdown_report(&Report::Dashboard(dashboard), 1);
        assert!(markdown.contains("- **Surveys:** 2"));
        assert!(markdown.contains("| Product feedback (`srv-feedback`) | 4 |"));
    }

    #[test]
    fn test_responses_markdown() {
        let service = crate::store::SurveyService::new(dataset());
        let entries = service
            .list_responses("user-1", "srv-feedback", None, None)
            .unwrap();

        let markdown = generate_markdown_report(&Report::Responses(entries), 1);
        assert!(markdown.contains("| `r-4` | Ada | ada@example.com | 4 | 2023-06-03 09:30 |"));
        assert!(markdown.contains("| `r-3` | resp-anon | - | 2 | 2023-06-03 08:00 |"));
    }

    #[test]
    fn test_public_survey_json_hides_owner() {
        let data = dataset();
        let survey = PublicSurvey::from(data.survey("srv-onboarding").unwrap());

        let json = generate_json_report(&Report::PublicSurvey(survey), false).unwrap();
        assert!(json.contains("\"questions\""));
        assert!(!json.contains("owner_id"));
    }

    #[test]
    fn test_empty_listings() {
        assert_eq!(
            generate_markdown_report(&Report::Surveys(vec![]), 1),
            "No surveys found.\n"
        );
        assert_eq!(
            generate_markdown_report(&Report::Respondents(vec![]), 1),
            "No respondents found.\n"
        );
    }

    #[test]
    fn test_deleted_json() {
        let report = Report::Deleted {
            survey_id: "srv-1".to_string(),
        };
        assert_eq!(
            generate_json_report(&report, false).unwrap(),
            r#"{"survey_id":"srv-1"}"#
        );
    }
}
