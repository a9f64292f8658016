//! Quiz authoring and attempt grading.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::course::CourseId;
use super::user::UserId;

/// Validation errors returned by the quiz constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizValidationError {
    EmptyTitle,
    NoQuestions,
    EmptyPrompt { index: usize },
    TooFewChoices { index: usize },
    CorrectChoiceOutOfRange { index: usize },
    ZeroPoints { index: usize },
    AnswerCountMismatch { expected: usize, actual: usize },
}

impl fmt::Display for QuizValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "quiz title must not be empty"),
            Self::NoQuestions => write!(f, "a quiz needs at least one question"),
            Self::EmptyPrompt { index } => {
                write!(f, "question {index} has an empty prompt")
            }
            Self::TooFewChoices { index } => {
                write!(f, "question {index} needs at least two choices")
            }
            Self::CorrectChoiceOutOfRange { index } => {
                write!(f, "question {index} marks a choice that does not exist")
            }
            Self::ZeroPoints { index } => {
                write!(f, "question {index} must be worth at least one point")
            }
            Self::AnswerCountMismatch { expected, actual } => write!(
                f,
                "attempt must answer every question: expected {expected} answers, got {actual}"
            ),
        }
    }
}

impl std::error::Error for QuizValidationError {}

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// The question text.
    pub prompt: String,
    /// Candidate answers, at least two.
    pub choices: Vec<String>,
    /// Zero-based index of the correct choice. Withheld from student-facing
    /// payloads by the HTTP adapter.
    pub correct_choice: u32,
    /// Points awarded for a correct answer.
    pub points: u32,
}

/// Authored quiz attached to a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    /// Stable quiz identifier.
    pub id: Uuid,
    /// Course this quiz belongs to.
    pub course_id: CourseId,
    /// Quiz heading.
    pub title: String,
    /// Ordered questions.
    pub questions: Vec<Question>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Quiz {
    /// Build a quiz after validating the question set.
    pub fn new(
        id: Uuid,
        course_id: CourseId,
        title: impl Into<String>,
        questions: Vec<Question>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, QuizValidationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(QuizValidationError::EmptyTitle);
        }
        if questions.is_empty() {
            return Err(QuizValidationError::NoQuestions);
        }
        for (index, question) in questions.iter().enumerate() {
            if question.prompt.trim().is_empty() {
                return Err(QuizValidationError::EmptyPrompt { index });
            }
            if question.choices.len() < 2 {
                return Err(QuizValidationError::TooFewChoices { index });
            }
            if (question.correct_choice as usize) >= question.choices.len() {
                return Err(QuizValidationError::CorrectChoiceOutOfRange { index });
            }
            if question.points == 0 {
                return Err(QuizValidationError::ZeroPoints { index });
            }
        }
        Ok(Self {
            id,
            course_id,
            title,
            questions,
            created_at,
        })
    }

    /// Sum of the points on offer.
    pub fn max_score(&self) -> u32 {
        self.questions.iter().map(|q| q.points).sum()
    }

    /// Grade one set of answers.
    ///
    /// Answers are zero-based choice indices aligned with the question order.
    /// Every question must be answered; a wrong or out-of-range index simply
    /// scores zero for that question.
    pub fn grade(&self, answers: &[u32]) -> Result<u32, QuizValidationError> {
        if answers.len() != self.questions.len() {
            return Err(QuizValidationError::AnswerCountMismatch {
                expected: self.questions.len(),
                actual: answers.len(),
            });
        }
        let score = self
            .questions
            .iter()
            .zip(answers)
            .filter(|(question, answer)| question.correct_choice == **answer)
            .map(|(question, _)| question.points)
            .sum();
        Ok(score)
    }
}

/// A graded quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    /// Stable attempt identifier.
    pub id: Uuid,
    /// The quiz attempted.
    pub quiz_id: Uuid,
    /// The student who submitted.
    #[schema(value_type = String)]
    pub student_id: UserId,
    /// Chosen answer indices, aligned with the question order.
    pub answers: Vec<u32>,
    /// Points earned.
    pub score: u32,
    /// Points on offer at submission time.
    pub max_score: u32,
    /// Submission timestamp.
    pub submitted_at: DateTime<Utc>,
}

impl QuizAttempt {
    /// Grade and record an attempt against a quiz.
    pub fn submit(
        quiz: &Quiz,
        student_id: UserId,
        answers: Vec<u32>,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self, QuizValidationError> {
        let score = quiz.grade(&answers)?;
        Ok(Self {
            id: Uuid::new_v4(),
            quiz_id: quiz.id,
            student_id,
            answers,
            score,
            max_score: quiz.max_score(),
            submitted_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn question(correct: u32, points: u32) -> Question {
        Question {
            prompt: "Which keyword borrows?".into(),
            choices: vec!["let".into(), "ref".into(), "mut".into()],
            correct_choice: correct,
            points,
        }
    }

    fn quiz(questions: Vec<Question>) -> Result<Quiz, QuizValidationError> {
        Quiz::new(
            Uuid::new_v4(),
            CourseId::random(),
            "Borrowing basics",
            questions,
            Utc::now(),
        )
    }

    #[rstest]
    fn grades_sum_points_for_correct_answers() {
        let quiz = quiz(vec![question(1, 2), question(0, 3), question(2, 5)])
            .expect("valid quiz");
        assert_eq!(quiz.max_score(), 10);
        assert_eq!(quiz.grade(&[1, 0, 2]).expect("graded"), 10);
        assert_eq!(quiz.grade(&[1, 1, 1]).expect("graded"), 2);
        assert_eq!(quiz.grade(&[0, 1, 0]).expect("graded"), 0);
    }

    #[rstest]
    fn out_of_range_answers_score_zero_without_failing() {
        let quiz = quiz(vec![question(1, 4)]).expect("valid quiz");
        assert_eq!(quiz.grade(&[99]).expect("graded"), 0);
    }

    #[rstest]
    fn grade_rejects_answer_count_mismatch() {
        let quiz = quiz(vec![question(0, 1), question(0, 1)]).expect("valid quiz");
        let err = quiz.grade(&[0]).expect_err("mismatch rejected");
        assert_eq!(
            err,
            QuizValidationError::AnswerCountMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[rstest]
    fn validation_rejects_degenerate_questions() {
        assert_eq!(quiz(vec![]).expect_err("empty"), QuizValidationError::NoQuestions);

        let mut blank = question(0, 1);
        blank.prompt = "  ".into();
        assert_eq!(
            quiz(vec![blank]).expect_err("blank prompt"),
            QuizValidationError::EmptyPrompt { index: 0 }
        );

        let mut single = question(0, 1);
        single.choices = vec!["only".into()];
        assert_eq!(
            quiz(vec![single]).expect_err("one choice"),
            QuizValidationError::TooFewChoices { index: 0 }
        );

        assert_eq!(
            quiz(vec![question(3, 1)]).expect_err("bad index"),
            QuizValidationError::CorrectChoiceOutOfRange { index: 0 }
        );

        assert_eq!(
            quiz(vec![question(0, 0)]).expect_err("zero points"),
            QuizValidationError::ZeroPoints { index: 0 }
        );
    }

    #[rstest]
    fn submit_records_score_and_ceiling() {
        let quiz = quiz(vec![question(1, 2), question(2, 3)]).expect("valid quiz");
        let attempt = QuizAttempt::submit(&quiz, UserId::random(), vec![1, 0], Utc::now())
            .expect("attempt graded");
        assert_eq!(attempt.score, 2);
        assert_eq!(attempt.max_score, 5);
        assert_eq!(attempt.quiz_id, quiz.id);
    }
}
