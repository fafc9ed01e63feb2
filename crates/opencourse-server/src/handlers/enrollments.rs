//! Enrollment handlers.

use axum::{Json, extract::State, response::IntoResponse};

use opencourse_auth::CurrentUser;
use opencourse_auth::policy::{self, EnrollmentListFilter};

use crate::error::ApiResult;
use crate::handlers::dto::EnrollmentResponse;
use crate::state::AppState;

/// GET /enrollments
///
/// Students list their own enrollments, newest first. Instructors get an
/// empty list — silently, by design.
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let rows = match policy::enrollment_list_filter(&user) {
        EnrollmentListFilter::OwnRows(id) => state.db.enrollments().list_for_student(id).await?,
        EnrollmentListFilter::Empty => Vec::new(),
    };

    let student = user.profile();
    let enrollments: Vec<EnrollmentResponse> = rows
        .into_iter()
        .map(|(enrollment, course, instructor)| {
            EnrollmentResponse::new(enrollment, course, instructor, student.clone())
        })
        .collect();

    Ok(Json(enrollments))
}
