//! # opencourse-core
//!
//! Core domain types for the OpenCourse learning-management server.
//!
//! This crate holds the ownership model shared by every other crate:
//!
//! - [`User`] with a closed [`Role`] (student or instructor)
//! - [`Course`] owned by exactly one instructor
//! - [`Chapter`] belonging to a course, gated by [`Visibility`]
//! - [`Enrollment`] joining a student to a course
//!
//! The types here are plain data with serde support; persistence and
//! authorization live in `opencourse-db-postgres` and `opencourse-auth`.

pub mod chapter;
pub mod course;
pub mod enrollment;
pub mod role;
pub mod user;

pub use chapter::{Chapter, ParseVisibilityError, Visibility};
pub use course::Course;
pub use enrollment::Enrollment;
pub use role::{ParseRoleError, Role};
pub use user::{User, UserProfile};
