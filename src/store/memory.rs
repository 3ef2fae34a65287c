use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::user::{Dean, Student};
use crate::store::UserStore;

/// In-process store backend.
///
/// Backs the test suite and local development; collections are plain
/// vectors so record order is insertion order, matching the production
/// backend's `seq` ordering.
#[derive(Clone, Default)]
pub struct MemoryStore {
    students: Arc<RwLock<Vec<Student>>>,
    deans: Arc<RwLock<Vec<Dean>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_student(&self, student: &Student) -> Result<()> {
        let mut students = self.students.write().await;
        if students
            .iter()
            .any(|s| s.university_id == student.university_id)
        {
            return Err(AppError::Validation(
                "University ID is already registered".to_string(),
            ));
        }
        students.push(student.clone());
        Ok(())
    }

    async fn insert_dean(&self, dean: &Dean) -> Result<()> {
        let mut deans = self.deans.write().await;
        if deans.iter().any(|d| d.university_id == dean.university_id) {
            return Err(AppError::Validation(
                "University ID is already registered".to_string(),
            ));
        }
        deans.push(dean.clone());
        Ok(())
    }

    async fn find_student_by_id(&self, id: Uuid) -> Result<Option<Student>> {
        Ok(self
            .students
            .read()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn find_dean_by_id(&self, id: Uuid) -> Result<Option<Dean>> {
        Ok(self.deans.read().await.iter().find(|d| d.id == id).cloned())
    }

    async fn find_student_by_university_id(
        &self,
        university_id: &str,
    ) -> Result<Option<Student>> {
        Ok(self
            .students
            .read()
            .await
            .iter()
            .find(|s| s.university_id == university_id)
            .cloned())
    }

    async fn find_dean_by_university_id(&self, university_id: &str) -> Result<Option<Dean>> {
        Ok(self
            .deans
            .read()
            .await
            .iter()
            .find(|d| d.university_id == university_id)
            .cloned())
    }

    async fn list_deans(&self) -> Result<Vec<Dean>> {
        Ok(self.deans.read().await.clone())
    }

    async fn save_student(&self, student: &Student) -> Result<()> {
        let mut students = self.students.write().await;
        match students.iter_mut().find(|s| s.id == student.id) {
            Some(existing) => {
                *existing = student.clone();
                Ok(())
            }
            None => Err(AppError::Persistence(format!(
                "Student {} no longer exists",
                student.id
            ))),
        }
    }

    async fn save_dean_checked(&self, dean: &Dean) -> Result<bool> {
        let mut deans = self.deans.write().await;
        match deans.iter_mut().find(|d| d.id == dean.id) {
            Some(existing) => {
                if existing.version != dean.version {
                    return Ok(false);
                }
                *existing = dean.clone();
                existing.version = dean.version + 1;
                Ok(true)
            }
            None => Err(AppError::Persistence(format!(
                "Dean {} no longer exists",
                dean.id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Slot;
    use serde_json::json;

    fn dean(name: &str, university_id: &str) -> Dean {
        Dean::new(
            name.to_string(),
            university_id.to_string(),
            "hash".to_string(),
            Slot::intake_all(vec![json!([9, 0])]),
        )
    }

    #[tokio::test]
    async fn duplicate_university_id_is_rejected_per_collection() {
        let store = MemoryStore::new();
        store.insert_dean(&dean("Alice", "D-1")).await.unwrap();
        let err = store.insert_dean(&dean("Bob", "D-1")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // The same ID in the *student* collection is allowed: uniqueness
        // is per collection, not across the combined namespace.
        let student = Student::new("Carol".into(), "D-1".into(), "hash".into());
        store.insert_student(&student).await.unwrap();
    }

    #[tokio::test]
    async fn checked_save_detects_stale_version() {
        let store = MemoryStore::new();
        let d = dean("Alice", "D-1");
        store.insert_dean(&d).await.unwrap();

        let mut first = store.find_dean_by_id(d.id).await.unwrap().unwrap();
        let second = store.find_dean_by_id(d.id).await.unwrap().unwrap();

        first.available_slots.clear();
        assert!(store.save_dean_checked(&first).await.unwrap());
        assert!(!store.save_dean_checked(&second).await.unwrap());

        let stored = store.find_dean_by_id(d.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
        assert!(stored.available_slots.is_empty());
    }

    #[tokio::test]
    async fn list_deans_preserves_insertion_order() {
        let store = MemoryStore::new();
        store.insert_dean(&dean("Alice", "D-1")).await.unwrap();
        store.insert_dean(&dean("Bob", "D-2")).await.unwrap();
        let names: Vec<String> = store
            .list_deans()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["Alice".to_string(), "Bob".to_string()]);
    }
}
