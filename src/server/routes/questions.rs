use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{categories::get_all_categories, questions},
        NewQuestion, Question,
    },
    server::{
        app::AppState,
        deserializers::{
            as_integer, deserialize_lenient_i64, deserialize_present, is_truthy, text_of,
        },
        errors::AppError,
        extractors::{ApiJson, ApiPath},
    },
    telemetry::QUESTIONS_CREATED,
};

use super::{
    categories::{category_map, CategoryMap},
    ApiResponse,
};

const QUESTIONS_PER_PAGE: i64 = 10;

#[derive(Deserialize)]
struct PageQuery {
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    page: Option<i64>,
}

/// Body of `POST /questions`. The presence of `searchTerm` turns it into a search,
/// whatever else is sent along.
#[derive(Deserialize)]
struct QuestionsPayload {
    #[serde(rename = "searchTerm", default, deserialize_with = "deserialize_present")]
    search_term: Option<Value>,
    #[serde(flatten)]
    fields: QuestionFields,
}

#[derive(Deserialize)]
struct QuestionFields {
    question: Option<Value>,
    answer: Option<Value>,
    category: Option<Value>,
    difficulty: Option<Value>,
}

#[derive(Debug, PartialEq)]
enum QuestionsRequest {
    /// `None` lists every question.
    Search(Option<String>),
    Create(NewQuestion),
}

impl QuestionsPayload {
    fn into_request(self) -> Result<QuestionsRequest, AppError> {
        if let Some(term) = self.search_term {
            let term = is_truthy(&term).then(|| text_of(&term));
            return Ok(QuestionsRequest::Search(term));
        }
        self.fields.into_new_question().map(QuestionsRequest::Create)
    }
}

impl QuestionFields {
    fn into_new_question(self) -> Result<NewQuestion, AppError> {
        let (Some(question), Some(answer), Some(category), Some(difficulty)) = (
            self.question.filter(is_truthy),
            self.answer.filter(is_truthy),
            self.category.filter(is_truthy),
            self.difficulty.filter(is_truthy),
        ) else {
            return Err(AppError::Unprocessable);
        };
        let difficulty = match &difficulty {
            Value::String(s) => s.trim().parse().ok(),
            other => as_integer(other),
        }
        .ok_or(AppError::Unprocessable)?;

        Ok(NewQuestion {
            question: text_of(&question),
            answer: text_of(&answer),
            category: text_of(&category),
            difficulty,
        })
    }
}

#[derive(Serialize)]
struct QuestionsPage {
    success: bool,
    questions: Vec<Question>,
    total_questions: i64,
    categories: CategoryMap,
    current_category: Option<String>,
}

#[derive(Serialize)]
struct SearchResponse {
    success: bool,
    total_questions: usize,
    questions: Vec<Question>,
}

#[derive(Serialize)]
struct CreatedResponse {
    success: bool,
    created_question_id: i64,
}

#[derive(Serialize)]
struct DeletedResponse {
    success: bool,
    question_id: i64,
}

async fn list_questions(
    State(pool): State<SqlitePool>,
    Query(PageQuery { page }): Query<PageQuery>,
) -> ApiResponse<Json<QuestionsPage>> {
    let page = page.unwrap_or(1);
    if page < 1 {
        return Err(AppError::NotFound);
    }
    let offset = (page - 1).saturating_mul(QUESTIONS_PER_PAGE);
    let questions = questions::get_questions_page(&pool, QUESTIONS_PER_PAGE, offset).await?;
    if questions.is_empty() {
        return Err(AppError::NotFound);
    }

    Ok(Json(QuestionsPage {
        success: true,
        questions,
        total_questions: questions::count_questions(&pool).await?,
        categories: category_map(get_all_categories(&pool).await?),
        current_category: None,
    }))
}

async fn create_or_search_questions(
    State(pool): State<SqlitePool>,
    ApiJson(payload): ApiJson<QuestionsPayload>,
) -> ApiResponse<Response> {
    match payload.into_request()? {
        QuestionsRequest::Search(term) => {
            let questions = match term {
                Some(term) => questions::search_questions(&pool, &term).await?,
                None => questions::get_all_questions(&pool).await?,
            };
            Ok(Json(SearchResponse {
                success: true,
                total_questions: questions.len(),
                questions,
            })
            .into_response())
        }
        QuestionsRequest::Create(new_question) => {
            let id = questions::create_question(&pool, &new_question)
                .await
                .map_err(|err| {
                    tracing::error!("Failed to create question: {err}");
                    AppError::Unprocessable
                })?;
            QUESTIONS_CREATED.inc();
            tracing::info!(question_id = id, "Question created");
            Ok(Json(CreatedResponse {
                success: true,
                created_question_id: id,
            })
            .into_response())
        }
    }
}

async fn delete_question(
    State(pool): State<SqlitePool>,
    ApiPath(question_id): ApiPath<i64>,
) -> ApiResponse<Json<DeletedResponse>> {
    if !questions::delete_question(&pool, question_id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(question_id, "Question deleted");
    Ok(Json(DeletedResponse {
        success: true,
        question_id,
    }))
}

pub fn questions_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/questions",
            get(list_questions).post(create_or_search_questions),
        )
        .route("/questions/{id}", delete(delete_question))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: Value) -> Result<QuestionsRequest, AppError> {
        serde_json::from_value::<QuestionsPayload>(body)
            .unwrap()
            .into_request()
    }

    #[test]
    fn search_term_wins_over_question_fields() {
        let request = parse(json!({
            "searchTerm": "title",
            "question": "q",
            "answer": "a",
            "category": "1",
            "difficulty": 1
        }));
        assert_eq!(request.unwrap(), QuestionsRequest::Search(Some("title".to_owned())));
    }

    #[test]
    fn falsy_search_term_lists_everything() {
        for term in [json!(""), json!(null), json!(0)] {
            let request = parse(json!({ "searchTerm": term }));
            assert_eq!(request.unwrap(), QuestionsRequest::Search(None));
        }
    }

    #[test]
    fn numeric_category_is_stored_as_text() {
        let request = parse(json!({
            "question": "Heaviest element?",
            "answer": "Oganesson",
            "category": 1,
            "difficulty": "4"
        }));
        assert_eq!(
            request.unwrap(),
            QuestionsRequest::Create(NewQuestion {
                question: "Heaviest element?".to_owned(),
                answer: "Oganesson".to_owned(),
                category: "1".to_owned(),
                difficulty: 4,
            })
        );
    }

    #[test]
    fn falsy_or_missing_fields_are_rejected() {
        let complete = json!({"question": "q", "answer": "a", "category": "1", "difficulty": 2});
        for field in ["question", "answer", "category", "difficulty"] {
            let mut missing = complete.clone();
            missing.as_object_mut().unwrap().remove(field);
            assert!(matches!(parse(missing), Err(AppError::Unprocessable)));

            let mut blank = complete.clone();
            blank[field] = json!("");
            assert!(matches!(parse(blank), Err(AppError::Unprocessable)));
        }
    }

    #[test]
    fn integral_float_and_true_difficulties_are_accepted() {
        for (sent, stored) in [(json!(2.0), 2), (json!(true), 1)] {
            let request = parse(json!({
                "question": "q",
                "answer": "a",
                "category": "1",
                "difficulty": sent
            }));
            match request.unwrap() {
                QuestionsRequest::Create(new_question) => assert_eq!(new_question.difficulty, stored),
                other => panic!("expected a create request, got {other:?}"),
            }
        }
        let fractional = parse(json!({
            "question": "q",
            "answer": "a",
            "category": "1",
            "difficulty": 2.5
        }));
        assert!(matches!(fractional, Err(AppError::Unprocessable)));
    }

    #[test]
    fn difficulty_must_be_an_integer() {
        let request = parse(json!({
            "question": "q",
            "answer": "a",
            "category": "1",
            "difficulty": "hard"
        }));
        assert!(matches!(request, Err(AppError::Unprocessable)));
    }
}
