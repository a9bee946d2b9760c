mod categories;
mod questions;
mod quizzes;

use super::errors::AppError;

pub use categories::category_router;
pub use questions::questions_router;
pub use quizzes::quizzes_router;

pub type ApiResponse<T> = Result<T, AppError>;
