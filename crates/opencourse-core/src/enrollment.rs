//! Enrollments.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A student's membership in a course.
///
/// The (student, course) pair is unique — joining twice is idempotent and
/// never produces a second row. Enrollments are created by the join action,
/// never updated, and removed only by cascade when the student or course is
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    /// Unique identifier.
    pub id: Uuid,

    /// The enrolled student.
    pub student_id: Uuid,

    /// The joined course.
    pub course_id: Uuid,

    /// When the student joined.
    #[serde(with = "time::serde::rfc3339")]
    pub enrolled_at: OffsetDateTime,
}
