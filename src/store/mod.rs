pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::user::{Dean, Student};

/// The document-store contract the application is written against.
///
/// Students and deans live in separate collections; `universityID` is
/// unique within each collection (not across the two — the combined
/// namespace is unenforced). Students are saved unconditionally since a
/// student's record is only ever mutated by that student's own requests.
/// Dean records are the one contended resource, so their saves are
/// conditional on the version the caller read.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new student. Fails with a validation error if the
    /// university ID is already registered in the student collection.
    async fn insert_student(&self, student: &Student) -> Result<()>;

    /// Inserts a new dean. Fails with a validation error if the
    /// university ID is already registered in the dean collection.
    async fn insert_dean(&self, dean: &Dean) -> Result<()>;

    /// Finds a student by record ID.
    async fn find_student_by_id(&self, id: Uuid) -> Result<Option<Student>>;

    /// Finds a dean by record ID.
    async fn find_dean_by_id(&self, id: Uuid) -> Result<Option<Dean>>;

    /// Finds a student by university ID.
    async fn find_student_by_university_id(&self, university_id: &str)
        -> Result<Option<Student>>;

    /// Finds a dean by university ID.
    async fn find_dean_by_university_id(&self, university_id: &str) -> Result<Option<Dean>>;

    /// Lists every dean in record (insertion) order.
    async fn list_deans(&self) -> Result<Vec<Dean>>;

    /// Saves a mutated student record.
    async fn save_student(&self, student: &Student) -> Result<()>;

    /// Saves a mutated dean record if its stored version still equals
    /// `dean.version`, bumping the version on success. Returns
    /// `Ok(false)` when another writer got there first.
    async fn save_dean_checked(&self, dean: &Dean) -> Result<bool>;
}
