//! Validation of survey drafts and submitted answers.
//!
//! Answer shapes are checked here, before a response is stored, so the
//! aggregator can take stored responses as well-formed.

use crate::error::StoreError;
use crate::models::{AnswerValue, Answers, Question, Survey};
use std::collections::HashSet;

/// Check that a question list is usable: non-empty unique ids and prompts.
pub fn validate_questions(questions: &[Question]) -> Result<(), StoreError> {
    let mut seen: HashSet<&str> = HashSet::new();

    for question in questions {
        let id = question.id.trim();
        if id.is_empty() {
            return Err(StoreError::InvalidInput(
                "Question id must not be empty".to_string(),
            ));
        }
        if !seen.insert(id) {
            return Err(StoreError::InvalidInput(format!(
                "Duplicate question id: {}",
                id
            )));
        }
        if question.text.trim().is_empty() {
            return Err(StoreError::InvalidInput(format!(
                "Question {} has no prompt",
                id
            )));
        }
    }

    Ok(())
}

/// Check that an answer has the shape its question type expects.
///
/// Null is accepted for any question and treated as unanswered.
pub fn validate_answer_shape(question: &Question, answer: &AnswerValue) -> Result<(), StoreError> {
    let expects_list = question.question_type.is_list_answer();

    match answer {
        AnswerValue::Null => Ok(()),
        AnswerValue::List(_) if expects_list => Ok(()),
        AnswerValue::Single(_) if !expects_list => Ok(()),
        other => Err(StoreError::InvalidInput(format!(
            "Question {} ({}) expects {}, got {}",
            question.id,
            question.question_type,
            if expects_list { "a list" } else { "a single value" },
            other.shape()
        ))),
    }
}

/// Validate a submitted answer map against the survey.
///
/// Rejects answers to unknown questions, answers of the wrong shape, and
/// missing answers to required questions. All missing required ids are
/// reported together.
pub fn validate_answers(survey: &Survey, answers: &Answers) -> Result<(), StoreError> {
    let unknown: Vec<&str> = answers
        .keys()
        .filter(|id| survey.question(id).is_none())
        .map(String::as_str)
        .collect();

    if !unknown.is_empty() {
        return Err(StoreError::InvalidInput(format!(
            "Unknown question ids: {}",
            unknown.join(", ")
        )));
    }

    for (id, answer) in answers {
        if let Some(question) = survey.question(id) {
            validate_answer_shape(question, answer)?;
        }
    }

    let missing: Vec<&str> = survey
        .questions
        .iter()
        .filter(|q| q.required)
        .filter(|q| !answers.get(&q.id).map(AnswerValue::is_answered).unwrap_or(false))
        .map(|q| q.id.as_str())
        .collect();

    if !missing.is_empty() {
        return Err(StoreError::InvalidInput(format!(
            "Missing answers for questions: {}",
            missing.join(", ")
        )));
    }

    Ok(())
}

/// Normalize an email for storage and lookup. Blank emails become `None`.
pub fn normalize_email(email: Option<&str>) -> Option<String> {
    email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuestionType, SurveyStatus};
    use chrono::Utc;

    fn question(id: &str, question_type: QuestionType, required: bool) -> Question {
        Question {
            id: id.to_string(),
            question_type,
            text: "Prompt".to_string(),
            options: Vec::new(),
            required,
        }
    }

    fn survey() -> Survey {
        let now = Utc::now();
        Survey {
            id: "s1".to_string(),
            owner_id: "u1".to_string(),
            title: "Survey".to_string(),
            description: String::new(),
            status: SurveyStatus::Active,
            questions: vec![
                question("q1", QuestionType::SingleChoice, true),
                question("q2", QuestionType::MultipleChoice, false),
                question("q3", QuestionType::Nps, true),
            ],
            created_at: now,
            updated_at: now,
            published_at: Some(now),
        }
    }

    fn answers(pairs: Vec<(&str, AnswerValue)>) -> Answers {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_valid_answers() {
        let a = answers(vec![
            ("q1", "Yes".into()),
            ("q2", vec!["A", "B"].into()),
            ("q3", 9.into()),
        ]);
        assert!(validate_answers(&survey(), &a).is_ok());
    }

    #[test]
    fn test_missing_required_lists_all_ids() {
        let a = answers(vec![("q2", vec!["A"].into())]);

        let err = validate_answers(&survey(), &a).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid input: Missing answers for questions: q1, q3"
        );
    }

    #[test]
    fn test_blank_required_answer_is_missing() {
        let a = answers(vec![("q1", "  ".into()), ("q3", 5.into())]);

        let err = validate_answers(&survey(), &a).unwrap_err();
        assert!(err.to_string().contains("q1"));
    }

    #[test]
    fn test_unknown_question_rejected() {
        let a = answers(vec![
            ("q1", "Yes".into()),
            ("q3", 9.into()),
            ("q9", "extra".into()),
        ]);

        let err = validate_answers(&survey(), &a).unwrap_err();
        assert!(err.to_string().contains("Unknown question ids: q9"));
    }

    #[test]
    fn test_wrong_shape_rejected() {
        let a = answers(vec![
            ("q1", "Yes".into()),
            ("q2", "A".into()),
            ("q3", 9.into()),
        ]);
        let err = validate_answers(&survey(), &a).unwrap_err();
        assert!(err.to_string().contains("expects a list"));

        let a = answers(vec![("q1", vec!["Yes"].into()), ("q3", 9.into())]);
        let err = validate_answers(&survey(), &a).unwrap_err();
        assert!(err.to_string().contains("expects a single value"));
    }

    #[test]
    fn test_duplicate_question_ids_rejected() {
        let questions = vec![
            question("q1", QuestionType::Rating, false),
            question("q1", QuestionType::Nps, false),
        ];
        assert!(validate_questions(&questions).is_err());
        assert!(validate_questions(&survey().questions).is_ok());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email(Some("  Ada@Example.COM ")),
            Some("ada@example.com".to_string())
        );
        assert_eq!(normalize_email(Some("   ")), None);
        assert_eq!(normalize_email(None), None);
    }
}
