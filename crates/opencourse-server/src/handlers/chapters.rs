//! Chapter handlers.
//!
//! Chapter mutability is gated entirely by the parent course's ownership, so
//! every point operation resolves the chapter together with its course.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use opencourse_auth::CurrentUser;
use opencourse_auth::policy::{self, ChapterAction, GlobalChapterFilter};
use opencourse_core::Visibility;

use crate::error::{ApiError, ApiResult};
use crate::handlers::dto::{ChapterCreateRequest, ChapterResponse, ChapterUpdateRequest};
use crate::handlers::validate::{
    FieldErrors, check_content_is_object, reject_blank, require_text,
};
use crate::state::AppState;

fn parse_visibility(
    errors: &mut FieldErrors,
    value: &Option<String>,
) -> Option<Visibility> {
    match value {
        None => None,
        Some(s) => match s.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                errors.insert(
                    "visibility".to_string(),
                    format!("\"{s}\" is not a valid choice."),
                );
                None
            }
        },
    }
}

/// GET /chapters
///
/// Cross-course listing: instructors get the chapters of their own courses,
/// students the public chapters of courses they joined.
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let rows = match policy::global_chapter_filter(&user) {
        GlobalChapterFilter::OwnedCourses(id) => state.db.chapters().list_owned_by(id).await?,
        GlobalChapterFilter::EnrolledPublic(id) => {
            state.db.chapters().list_enrolled_public(id).await?
        }
    };

    let chapters: Vec<ChapterResponse> = rows
        .into_iter()
        .map(|(chapter, course_title)| ChapterResponse::new(chapter, course_title))
        .collect();

    Ok(Json(chapters))
}

/// POST /chapters
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<ChapterCreateRequest>,
) -> ApiResult<impl IntoResponse> {
    let Some(course_id) = req.course else {
        return Err(ApiError::validation("course", "This field is required."));
    };

    let (course, _) = state
        .db
        .courses()
        .find_by_id(course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;

    policy::authorize_chapter_mutation(&user, &course, ChapterAction::Create)?;

    let mut errors = FieldErrors::new();
    let title = require_text(&mut errors, "title", req.title);
    check_content_is_object(&mut errors, &req.content);
    let visibility = parse_visibility(&mut errors, &req.visibility);
    if !errors.is_empty() {
        return Err(ApiError::Validation { errors });
    }

    let title = title.unwrap_or_default();
    let content = req.content.unwrap_or_else(|| serde_json::json!({}));
    let visibility = visibility.unwrap_or(Visibility::Public);
    let position = req.position.unwrap_or(0);

    let chapter = state
        .db
        .chapters()
        .create(course.id, &title, &content, visibility, position)
        .await?;

    tracing::info!(chapter_id = %chapter.id, course_id = %course.id, "chapter created");

    Ok((
        StatusCode::CREATED,
        Json(ChapterResponse::new(chapter, course.title)),
    ))
}

/// GET /chapters/{id}
pub async fn retrieve(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let (chapter, course) = state
        .db
        .chapters()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Chapter not found"))?;

    let enrolled = if user.is_student() {
        state.db.enrollments().is_enrolled(user.id, course.id).await?
    } else {
        false
    };

    policy::authorize_chapter_view(&user, &course, &chapter, enrolled)?;

    Ok(Json(ChapterResponse::new(chapter, course.title)))
}

/// PUT /chapters/{id}
///
/// Partial semantics: absent fields keep their current value.
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ChapterUpdateRequest>,
) -> ApiResult<impl IntoResponse> {
    let (_, course) = state
        .db
        .chapters()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Chapter not found"))?;

    policy::authorize_chapter_mutation(&user, &course, ChapterAction::Update)?;

    let mut errors = FieldErrors::new();
    reject_blank(&mut errors, "title", &req.title);
    check_content_is_object(&mut errors, &req.content);
    let visibility = parse_visibility(&mut errors, &req.visibility);
    if !errors.is_empty() {
        return Err(ApiError::Validation { errors });
    }

    let updated = state
        .db
        .chapters()
        .update(
            id,
            req.title.as_deref(),
            req.content.as_ref(),
            visibility,
            req.position,
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Chapter not found"))?;

    Ok(Json(ChapterResponse::new(updated, course.title)))
}

/// DELETE /chapters/{id}
pub async fn destroy(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let (_, course) = state
        .db
        .chapters()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Chapter not found"))?;

    policy::authorize_chapter_mutation(&user, &course, ChapterAction::Delete)?;

    state.db.chapters().delete(id).await?;

    tracing::info!(chapter_id = %id, "chapter deleted");

    Ok(StatusCode::NO_CONTENT)
}
