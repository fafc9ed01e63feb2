//! Access policy engine.
//!
//! Pure decision logic: given the acting user and the resource shapes, every
//! function either returns a row filter for a listing or an allow/deny
//! verdict for a point operation. No I/O happens here; callers resolve
//! resources and enrollment state first and pass them in.
//!
//! The two decision kinds deliberately fail differently:
//!
//! - **listings** degrade silently — a student listing courses never sees an
//!   error, the rows are just filtered (possibly to nothing);
//! - **point operations** (create/update/delete/join, single-object reads)
//!   deny loudly with a [`PolicyDenial`] that maps to 403.
//!
//! Every function matches exhaustively on [`Role`], so a new role would fail
//! to compile rather than fall through to an implicit deny.

use uuid::Uuid;

use opencourse_core::{Chapter, Course, Role, User, Visibility};

// ============================================================================
// Denials
// ============================================================================

/// An explicit authorization denial, surfaced to the caller as 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PolicyDenial {
    /// A student attempted to create a course.
    #[error("Only instructors can create courses")]
    CourseCreateRequiresInstructor,

    /// A student attempted to update a course.
    #[error("Only instructors can update courses")]
    CourseUpdateRequiresInstructor,

    /// A student attempted to delete a course.
    #[error("Only instructors can delete courses")]
    CourseDeleteRequiresInstructor,

    /// An instructor attempted to update a course they do not own.
    #[error("You can only update your own courses")]
    CourseUpdateNotOwner,

    /// An instructor attempted to delete a course they do not own.
    #[error("You can only delete your own courses")]
    CourseDeleteNotOwner,

    /// An instructor attempted to join a course.
    #[error("Only students can join courses")]
    JoinRequiresStudent,

    /// An instructor inspected a course (or its chapters) they do not own.
    #[error("You do not have permission to view this course")]
    CourseViewNotOwner,

    /// A student touched chapters of a course they have not joined.
    #[error("You must enroll in this course first")]
    EnrollmentRequired,

    /// A student attempted to read a private chapter.
    #[error("You do not have permission to view this chapter")]
    ChapterNotVisible,

    /// A student attempted to create a chapter.
    #[error("Only instructors can create chapters")]
    ChapterCreateRequiresInstructor,

    /// A student attempted to update a chapter.
    #[error("Only instructors can update chapters")]
    ChapterUpdateRequiresInstructor,

    /// A student attempted to delete a chapter.
    #[error("Only instructors can delete chapters")]
    ChapterDeleteRequiresInstructor,

    /// An instructor attempted to add a chapter to a course they do not own.
    #[error("You can only add chapters to your own courses")]
    ChapterCreateNotOwner,

    /// An instructor attempted to update a chapter of a course they do not own.
    #[error("You can only update chapters in your own courses")]
    ChapterUpdateNotOwner,

    /// An instructor attempted to delete a chapter of a course they do not own.
    #[error("You can only delete chapters from your own courses")]
    ChapterDeleteNotOwner,
}

// ============================================================================
// Filters (row-level visibility)
// ============================================================================

/// Which courses a listing should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseListFilter {
    /// The whole catalog.
    All,
    /// Only courses owned by the given instructor.
    OwnedBy(Uuid),
}

/// Which chapters of a single course a listing should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterListFilter {
    /// Every chapter, public and private.
    AllVisibilities,
    /// Public chapters only.
    PublicOnly,
}

/// Which chapters a cross-course listing should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalChapterFilter {
    /// All chapters of courses owned by the given instructor.
    OwnedCourses(Uuid),
    /// Public chapters of courses the given student is enrolled in.
    EnrolledPublic(Uuid),
}

/// Which enrollments a listing should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentListFilter {
    /// The given student's own rows.
    OwnRows(Uuid),
    /// Nothing; instructors get an empty result, not an error.
    Empty,
}

// ============================================================================
// Point actions
// ============================================================================

/// Mutations on a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseAction {
    /// Update title/description.
    Update,
    /// Delete the course and, by cascade, its chapters and enrollments.
    Delete,
}

/// Mutations on a chapter, gated by the parent course's ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterAction {
    /// Add a chapter to a course.
    Create,
    /// Update a chapter.
    Update,
    /// Delete a chapter.
    Delete,
}

// ============================================================================
// Decisions
// ============================================================================

/// Row filter for the course catalog.
///
/// Instructors see only what they own; students browse everything. The
/// asymmetry is intentional catalog behavior, not an oversight.
#[must_use]
pub fn course_list_filter(actor: &User) -> CourseListFilter {
    match actor.role {
        Role::Instructor => CourseListFilter::OwnedBy(actor.id),
        Role::Student => CourseListFilter::All,
    }
}

/// May the actor create a course?
///
/// # Errors
///
/// Denies students.
pub fn authorize_course_create(actor: &User) -> Result<(), PolicyDenial> {
    match actor.role {
        Role::Instructor => Ok(()),
        Role::Student => Err(PolicyDenial::CourseCreateRequiresInstructor),
    }
}

/// May the actor read a single course?
///
/// Students may read any course (they browse the catalog to decide whether
/// to join); instructors may read only their own.
///
/// # Errors
///
/// Denies non-owner instructors.
pub fn authorize_course_view(actor: &User, course: &Course) -> Result<(), PolicyDenial> {
    match actor.role {
        Role::Student => Ok(()),
        Role::Instructor => {
            if course.is_owned_by(actor.id) {
                Ok(())
            } else {
                Err(PolicyDenial::CourseViewNotOwner)
            }
        }
    }
}

/// May the actor update or delete a course?
///
/// # Errors
///
/// Denies students and non-owner instructors, with distinct messages.
pub fn authorize_course_mutation(
    actor: &User,
    course: &Course,
    action: CourseAction,
) -> Result<(), PolicyDenial> {
    match actor.role {
        Role::Student => Err(match action {
            CourseAction::Update => PolicyDenial::CourseUpdateRequiresInstructor,
            CourseAction::Delete => PolicyDenial::CourseDeleteRequiresInstructor,
        }),
        Role::Instructor => {
            if course.is_owned_by(actor.id) {
                Ok(())
            } else {
                Err(match action {
                    CourseAction::Update => PolicyDenial::CourseUpdateNotOwner,
                    CourseAction::Delete => PolicyDenial::CourseDeleteNotOwner,
                })
            }
        }
    }
}

/// May the actor join a course?
///
/// # Errors
///
/// Denies instructors.
pub fn authorize_join(actor: &User) -> Result<(), PolicyDenial> {
    match actor.role {
        Role::Student => Ok(()),
        Role::Instructor => Err(PolicyDenial::JoinRequiresStudent),
    }
}

/// Row filter for listing one course's chapters.
///
/// `enrolled` is the caller-resolved enrollment state of the actor in this
/// course; it is ignored for instructors.
///
/// # Errors
///
/// Denies non-owner instructors and unenrolled students.
pub fn course_chapter_filter(
    actor: &User,
    course: &Course,
    enrolled: bool,
) -> Result<ChapterListFilter, PolicyDenial> {
    match actor.role {
        Role::Instructor => {
            if course.is_owned_by(actor.id) {
                Ok(ChapterListFilter::AllVisibilities)
            } else {
                Err(PolicyDenial::CourseViewNotOwner)
            }
        }
        Role::Student => {
            if enrolled {
                Ok(ChapterListFilter::PublicOnly)
            } else {
                Err(PolicyDenial::EnrollmentRequired)
            }
        }
    }
}

/// May the actor read a single chapter?
///
/// # Errors
///
/// Denies non-owner instructors, unenrolled students, and enrolled students
/// on private chapters.
pub fn authorize_chapter_view(
    actor: &User,
    course: &Course,
    chapter: &Chapter,
    enrolled: bool,
) -> Result<(), PolicyDenial> {
    match actor.role {
        Role::Instructor => {
            if course.is_owned_by(actor.id) {
                Ok(())
            } else {
                Err(PolicyDenial::CourseViewNotOwner)
            }
        }
        Role::Student => {
            if !enrolled {
                Err(PolicyDenial::EnrollmentRequired)
            } else if chapter.visibility == Visibility::Private {
                Err(PolicyDenial::ChapterNotVisible)
            } else {
                Ok(())
            }
        }
    }
}

/// May the actor create/update/delete chapters of a course?
///
/// Chapter mutability is derived entirely from the parent course's
/// ownership; no property of the chapter itself participates.
///
/// # Errors
///
/// Denies students and non-owner instructors, with per-action messages.
pub fn authorize_chapter_mutation(
    actor: &User,
    course: &Course,
    action: ChapterAction,
) -> Result<(), PolicyDenial> {
    match actor.role {
        Role::Student => Err(match action {
            ChapterAction::Create => PolicyDenial::ChapterCreateRequiresInstructor,
            ChapterAction::Update => PolicyDenial::ChapterUpdateRequiresInstructor,
            ChapterAction::Delete => PolicyDenial::ChapterDeleteRequiresInstructor,
        }),
        Role::Instructor => {
            if course.is_owned_by(actor.id) {
                Ok(())
            } else {
                Err(match action {
                    ChapterAction::Create => PolicyDenial::ChapterCreateNotOwner,
                    ChapterAction::Update => PolicyDenial::ChapterUpdateNotOwner,
                    ChapterAction::Delete => PolicyDenial::ChapterDeleteNotOwner,
                })
            }
        }
    }
}

/// Row filter for the cross-course chapter listing.
#[must_use]
pub fn global_chapter_filter(actor: &User) -> GlobalChapterFilter {
    match actor.role {
        Role::Instructor => GlobalChapterFilter::OwnedCourses(actor.id),
        Role::Student => GlobalChapterFilter::EnrolledPublic(actor.id),
    }
}

/// Row filter for the enrollment listing.
#[must_use]
pub fn enrollment_list_filter(actor: &User) -> EnrollmentListFilter {
    match actor.role {
        Role::Student => EnrollmentListFilter::OwnRows(actor.id),
        Role::Instructor => EnrollmentListFilter::Empty,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn instructor() -> User {
        User::new("ada@example.com", "ada", "hash", Role::Instructor)
    }

    fn student() -> User {
        User::new("bob@example.com", "bob", "hash", Role::Student)
    }

    fn course_owned_by(owner: &User) -> Course {
        Course {
            id: Uuid::new_v4(),
            title: "Rust 101".to_string(),
            description: String::new(),
            instructor_id: owner.id,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    fn chapter_in(course: &Course, visibility: Visibility) -> Chapter {
        Chapter {
            id: Uuid::new_v4(),
            course_id: course.id,
            title: "Intro".to_string(),
            content: serde_json::json!({}),
            visibility,
            position: 0,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn test_course_listing_is_asymmetric() {
        let teacher = instructor();
        assert_eq!(
            course_list_filter(&teacher),
            CourseListFilter::OwnedBy(teacher.id)
        );
        assert_eq!(course_list_filter(&student()), CourseListFilter::All);
    }

    #[test]
    fn test_students_cannot_create_courses() {
        assert_eq!(
            authorize_course_create(&student()),
            Err(PolicyDenial::CourseCreateRequiresInstructor)
        );
        assert!(authorize_course_create(&instructor()).is_ok());
    }

    #[test]
    fn test_course_mutation_owner_only() {
        let owner = instructor();
        let other = instructor();
        let course = course_owned_by(&owner);

        assert!(authorize_course_mutation(&owner, &course, CourseAction::Update).is_ok());
        assert!(authorize_course_mutation(&owner, &course, CourseAction::Delete).is_ok());

        // Another instructor is forbidden, not "not found".
        assert_eq!(
            authorize_course_mutation(&other, &course, CourseAction::Update),
            Err(PolicyDenial::CourseUpdateNotOwner)
        );
        assert_eq!(
            authorize_course_mutation(&other, &course, CourseAction::Delete),
            Err(PolicyDenial::CourseDeleteNotOwner)
        );
    }

    #[test]
    fn test_course_mutation_denied_for_students() {
        let owner = instructor();
        let course = course_owned_by(&owner);
        assert_eq!(
            authorize_course_mutation(&student(), &course, CourseAction::Update),
            Err(PolicyDenial::CourseUpdateRequiresInstructor)
        );
        assert_eq!(
            authorize_course_mutation(&student(), &course, CourseAction::Delete),
            Err(PolicyDenial::CourseDeleteRequiresInstructor)
        );
    }

    #[test]
    fn test_course_view() {
        let owner = instructor();
        let other = instructor();
        let course = course_owned_by(&owner);

        assert!(authorize_course_view(&owner, &course).is_ok());
        assert!(authorize_course_view(&student(), &course).is_ok());
        assert_eq!(
            authorize_course_view(&other, &course),
            Err(PolicyDenial::CourseViewNotOwner)
        );
    }

    #[test]
    fn test_only_students_join() {
        assert!(authorize_join(&student()).is_ok());
        assert_eq!(
            authorize_join(&instructor()),
            Err(PolicyDenial::JoinRequiresStudent)
        );
    }

    #[test]
    fn test_chapter_listing_for_owner_includes_private() {
        let owner = instructor();
        let course = course_owned_by(&owner);
        assert_eq!(
            course_chapter_filter(&owner, &course, false),
            Ok(ChapterListFilter::AllVisibilities)
        );
    }

    #[test]
    fn test_chapter_listing_denied_for_other_instructor() {
        let owner = instructor();
        let other = instructor();
        let course = course_owned_by(&owner);
        assert_eq!(
            course_chapter_filter(&other, &course, false),
            Err(PolicyDenial::CourseViewNotOwner)
        );
    }

    #[test]
    fn test_chapter_listing_requires_enrollment() {
        let owner = instructor();
        let course = course_owned_by(&owner);
        let viewer = student();

        assert_eq!(
            course_chapter_filter(&viewer, &course, false),
            Err(PolicyDenial::EnrollmentRequired)
        );
        assert_eq!(
            course_chapter_filter(&viewer, &course, true),
            Ok(ChapterListFilter::PublicOnly)
        );
    }

    #[test]
    fn test_chapter_view_visibility_gate() {
        let owner = instructor();
        let course = course_owned_by(&owner);
        let public = chapter_in(&course, Visibility::Public);
        let private = chapter_in(&course, Visibility::Private);
        let viewer = student();

        // Owner sees both.
        assert!(authorize_chapter_view(&owner, &course, &private, false).is_ok());

        // Enrolled student sees public only.
        assert!(authorize_chapter_view(&viewer, &course, &public, true).is_ok());
        assert_eq!(
            authorize_chapter_view(&viewer, &course, &private, true),
            Err(PolicyDenial::ChapterNotVisible)
        );

        // Unenrolled student sees nothing.
        assert_eq!(
            authorize_chapter_view(&viewer, &course, &public, false),
            Err(PolicyDenial::EnrollmentRequired)
        );
    }

    #[test]
    fn test_chapter_mutation_gated_by_parent_ownership() {
        let owner = instructor();
        let other = instructor();
        let course = course_owned_by(&owner);

        for action in [ChapterAction::Create, ChapterAction::Update, ChapterAction::Delete] {
            assert!(authorize_chapter_mutation(&owner, &course, action).is_ok());
            assert!(authorize_chapter_mutation(&other, &course, action).is_err());
            assert!(authorize_chapter_mutation(&student(), &course, action).is_err());
        }
    }

    #[test]
    fn test_chapter_mutation_messages() {
        let owner = instructor();
        let other = instructor();
        let course = course_owned_by(&owner);

        assert_eq!(
            authorize_chapter_mutation(&other, &course, ChapterAction::Create)
                .unwrap_err()
                .to_string(),
            "You can only add chapters to your own courses"
        );
        assert_eq!(
            authorize_chapter_mutation(&student(), &course, ChapterAction::Delete)
                .unwrap_err()
                .to_string(),
            "Only instructors can delete chapters"
        );
    }

    #[test]
    fn test_global_chapter_filter() {
        let teacher = instructor();
        let learner = student();
        assert_eq!(
            global_chapter_filter(&teacher),
            GlobalChapterFilter::OwnedCourses(teacher.id)
        );
        assert_eq!(
            global_chapter_filter(&learner),
            GlobalChapterFilter::EnrolledPublic(learner.id)
        );
    }

    #[test]
    fn test_enrollment_listing_silently_empty_for_instructors() {
        let teacher = instructor();
        let learner = student();
        assert_eq!(
            enrollment_list_filter(&learner),
            EnrollmentListFilter::OwnRows(learner.id)
        );
        // An instructor gets an empty set, never an error.
        assert_eq!(
            enrollment_list_filter(&teacher),
            EnrollmentListFilter::Empty
        );
    }
}
