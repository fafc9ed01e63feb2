//! Course handlers.
//!
//! Every point operation resolves the target first (404 when it truly does
//! not exist) and only then consults the policy engine (403 when it exists
//! but access is denied).

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use opencourse_auth::CurrentUser;
use opencourse_auth::policy::{self, ChapterListFilter, CourseAction, CourseListFilter};
use opencourse_db_postgres::JoinOutcome;

use crate::error::{ApiError, ApiResult};
use crate::handlers::dto::{
    ChapterResponse, CourseCreateRequest, CourseResponse, CourseUpdateRequest, JoinResponse,
};
use crate::handlers::validate::{FieldErrors, reject_blank, require_text};
use crate::state::AppState;

/// GET /courses
///
/// Instructors see what they own; students see the whole catalog.
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let rows = match policy::course_list_filter(&user) {
        CourseListFilter::All => state.db.courses().list_all().await?,
        CourseListFilter::OwnedBy(id) => state.db.courses().list_by_instructor(id).await?,
    };

    let courses: Vec<CourseResponse> = rows
        .into_iter()
        .map(|(course, instructor)| CourseResponse::new(course, instructor))
        .collect();

    Ok(Json(courses))
}

/// POST /courses
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CourseCreateRequest>,
) -> ApiResult<impl IntoResponse> {
    policy::authorize_course_create(&user)?;

    let mut errors = FieldErrors::new();
    let title = require_text(&mut errors, "title", req.title);
    if !errors.is_empty() {
        return Err(ApiError::Validation { errors });
    }
    let title = title.unwrap_or_default();
    let description = req.description.unwrap_or_default();

    let course = state
        .db
        .courses()
        .create(user.id, &title, &description)
        .await?;

    tracing::info!(course_id = %course.id, instructor_id = %user.id, "course created");

    Ok((
        StatusCode::CREATED,
        Json(CourseResponse::new(course, user.profile())),
    ))
}

/// GET /courses/{id}
pub async fn retrieve(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let (course, instructor) = state
        .db
        .courses()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    policy::authorize_course_view(&user, &course)?;

    Ok(Json(CourseResponse::new(course, instructor)))
}

/// PUT /courses/{id}
///
/// Partial semantics: absent fields keep their current value.
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CourseUpdateRequest>,
) -> ApiResult<impl IntoResponse> {
    let (course, instructor) = state
        .db
        .courses()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    policy::authorize_course_mutation(&user, &course, CourseAction::Update)?;

    let mut errors = FieldErrors::new();
    reject_blank(&mut errors, "title", &req.title);
    if !errors.is_empty() {
        return Err(ApiError::Validation { errors });
    }

    let updated = state
        .db
        .courses()
        .update(id, req.title.as_deref(), req.description.as_deref())
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    Ok(Json(CourseResponse::new(updated, instructor)))
}

/// DELETE /courses/{id}
pub async fn destroy(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let (course, _) = state
        .db
        .courses()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    policy::authorize_course_mutation(&user, &course, CourseAction::Delete)?;

    state.db.courses().delete(id).await?;

    tracing::info!(course_id = %id, "course deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /courses/{id}/join
///
/// Idempotent: the second join reports the existing enrollment instead of
/// erroring, and concurrent duplicates collapse to one row in storage.
pub async fn join(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let (course, _) = state
        .db
        .courses()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    policy::authorize_join(&user)?;

    let outcome = state.db.enrollments().join_course(user.id, course.id).await?;

    let (status, message) = match outcome {
        JoinOutcome::Created => (StatusCode::CREATED, "Successfully joined the course"),
        JoinOutcome::AlreadyEnrolled => (StatusCode::OK, "Already enrolled in this course"),
    };

    Ok((status, Json(JoinResponse { message })))
}

/// GET /courses/{id}/chapters
///
/// Owners see everything; enrolled students see public chapters; everyone
/// else is denied.
pub async fn chapters(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let (course, _) = state
        .db
        .courses()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    let enrolled = if user.is_student() {
        state.db.enrollments().is_enrolled(user.id, course.id).await?
    } else {
        false
    };

    let filter = policy::course_chapter_filter(&user, &course, enrolled)?;
    let only_public = matches!(filter, ChapterListFilter::PublicOnly);

    let rows = state
        .db
        .chapters()
        .list_for_course(course.id, only_public)
        .await?;

    let chapters: Vec<ChapterResponse> = rows
        .into_iter()
        .map(|chapter| ChapterResponse::new(chapter, course.title.clone()))
        .collect();

    Ok(Json(chapters))
}
