use std::collections::HashSet;

use axum::{extract::State, routing::post, Json, Router};
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::{
    db::{queries::questions, Question},
    server::{
        app::AppState,
        deserializers::{as_integer, deserialize_integer_list, text_of},
        extractors::ApiJson,
    },
    telemetry::QUIZ_QUESTIONS_SERVED,
};

use super::ApiResponse;

#[derive(Deserialize)]
struct QuizRequest {
    quiz_category: QuizCategory,
    #[serde(deserialize_with = "deserialize_integer_list")]
    previous_questions: Vec<i64>,
}

#[derive(Deserialize)]
struct QuizCategory {
    #[serde(default)]
    id: Value,
}

impl QuizCategory {
    /// `None` for "all categories": a missing/null id or anything equal to `0`
    /// (`0`, `0.0`, `false`).
    fn filter(&self) -> Option<String> {
        match &self.id {
            Value::Null => None,
            id => match as_integer(id) {
                Some(0) => None,
                Some(n) if id.is_number() => Some(n.to_string()),
                _ => Some(text_of(id)),
            },
        }
    }
}

#[derive(Serialize)]
struct QuizResponse {
    success: bool,
    question: Option<Question>,
}

/// Uniformly picks one question that is not in `previous`. `None` means the quiz is over.
fn pick_next_question<R: Rng + ?Sized>(
    questions: Vec<Question>,
    previous: &[i64],
    rng: &mut R,
) -> Option<Question> {
    let seen: HashSet<i64> = previous.iter().copied().collect();
    let candidates: Vec<Question> = questions
        .into_iter()
        .filter(|q| !seen.contains(&q.id))
        .collect();
    candidates.choose(rng).cloned()
}

async fn next_quiz_question(
    State(pool): State<SqlitePool>,
    ApiJson(request): ApiJson<QuizRequest>,
) -> ApiResponse<Json<QuizResponse>> {
    let category = request.quiz_category.filter();
    let questions = match &category {
        Some(category) => questions::get_questions_by_category(&pool, category).await?,
        None => questions::get_all_questions(&pool).await?,
    };

    let question = pick_next_question(
        questions,
        &request.previous_questions,
        &mut rand::thread_rng(),
    );
    match &question {
        Some(question) => {
            QUIZ_QUESTIONS_SERVED
                .with_label_values(&[category.as_deref().unwrap_or("all")])
                .inc();
            tracing::debug!(question_id = question.id, "Next quiz question");
        }
        None => tracing::debug!("Quiz exhausted"),
    }

    Ok(Json(QuizResponse {
        success: true,
        question,
    }))
}

pub fn quizzes_router(state: AppState) -> Router {
    Router::new()
        .route("/quizzes", post(next_quiz_question))
        .with_state(state)
}
