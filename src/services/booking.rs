use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::user::Slot;
use crate::services::catalog;
use crate::store::UserStore;

/// How many times the dean read-modify-write is retried on a lost race
/// before the booking is abandoned.
const MAX_SAVE_ATTEMPTS: usize = 3;

/// Books one of a dean's available slots for a student.
///
/// The target is named by the dean's exact (case-sensitive) name and a
/// 1-based ordinal into that dean's slots as listed in the catalog. When
/// several deans share a name the first in record order is chosen.
///
/// The dean mutation is a version-checked read-modify-write: the record
/// is re-fetched fresh, the selected slot is located BY ID (the catalog
/// snapshot is never written back), and the save succeeds only if no
/// other writer touched the record in between. A lost race re-reads the
/// record; if the slot is gone, another student won it and the booking
/// fails with `SlotNotFound`. Two concurrent bookings of the same slot
/// therefore complete for at most one caller.
///
/// If crediting the student fails after the dean was already saved, the
/// slot is restored to the dean's pool before the error is surfaced, so
/// a slot is never lost to a partial write.
pub async fn book(
    store: &dyn UserStore,
    student_id: Uuid,
    dean_name: &str,
    slot_number: usize,
) -> Result<Vec<Slot>> {
    let mut student = store
        .find_student_by_id(student_id)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("No student found".to_string()))?;

    let snapshot = catalog::list_available_slots(store).await?;
    let entry = snapshot
        .iter()
        .find(|entry| entry.dean_name == dean_name)
        .ok_or(AppError::DeanNotFound)?;

    let selected = slot_number
        .checked_sub(1)
        .and_then(|index| entry.slots.get(index))
        .ok_or(AppError::SlotNotFound)?
        .clone();

    tracing::debug!(
        "Student {} booking slot {} of dean {}",
        student.id,
        selected.id,
        entry.dean_name
    );

    remove_from_pool(store, entry.dean_id, &selected).await?;

    student.booked_slots.push(selected.clone());
    if let Err(e) = store.save_student(&student).await {
        tracing::error!(
            "Failed to credit slot {} to student {}, restoring dean pool: {}",
            selected.id,
            student.id,
            e
        );
        restore_to_pool(store, entry.dean_id, selected).await;
        return Err(e);
    }

    tracing::info!(
        "Slot {} booked by student {} from dean {}",
        selected.id,
        student.id,
        entry.dean_name
    );
    Ok(student.booked_slots)
}

/// Removes `slot` from the dean's available pool with a version-checked
/// save, retrying a bounded number of times on lost races.
async fn remove_from_pool(store: &dyn UserStore, dean_id: Uuid, slot: &Slot) -> Result<()> {
    for _ in 0..MAX_SAVE_ATTEMPTS {
        let mut dean = store
            .find_dean_by_id(dean_id)
            .await?
            .ok_or(AppError::DeanNotFound)?;

        let position = dean
            .available_slots
            .iter()
            .position(|s| s.id == slot.id)
            .ok_or(AppError::SlotNotFound)?;
        dean.available_slots.remove(position);

        if store.save_dean_checked(&dean).await? {
            return Ok(());
        }
        tracing::debug!("Dean {} changed during booking, retrying", dean_id);
    }

    Err(AppError::Persistence(
        "Dean record kept changing during booking".to_string(),
    ))
}

/// Puts `slot` back into the dean's available pool. Best effort: the
/// booking already failed, so a second failure here is only logged.
async fn restore_to_pool(store: &dyn UserStore, dean_id: Uuid, slot: Slot) {
    for _ in 0..MAX_SAVE_ATTEMPTS {
        let mut dean = match store.find_dean_by_id(dean_id).await {
            Ok(Some(dean)) => dean,
            Ok(None) => {
                tracing::error!("Dean {} vanished while restoring slot {}", dean_id, slot.id);
                return;
            }
            Err(e) => {
                tracing::error!("Failed to re-read dean {} for restore: {}", dean_id, e);
                return;
            }
        };

        dean.available_slots.push(slot.clone());
        match store.save_dean_checked(&dean).await {
            Ok(true) => {
                tracing::warn!("Slot {} restored to dean {}", slot.id, dean_id);
                return;
            }
            Ok(false) => continue,
            Err(e) => {
                tracing::error!("Failed to restore slot {} to dean {}: {}", slot.id, dean_id, e);
                return;
            }
        }
    }
    tracing::error!(
        "Gave up restoring slot {} to dean {} after {} attempts",
        slot.id,
        dean_id,
        MAX_SAVE_ATTEMPTS
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{Dean, Student};
    use crate::store::memory::MemoryStore;
    use serde_json::json;

    async fn seed(store: &MemoryStore, slots: Vec<serde_json::Value>) -> (Student, Dean) {
        let student = Student::new("Sam".into(), "S-1".into(), "hash".into());
        let dean = Dean::new(
            "Alice".into(),
            "D-1".into(),
            "hash".into(),
            Slot::intake_all(slots),
        );
        store.insert_student(&student).await.unwrap();
        store.insert_dean(&dean).await.unwrap();
        (student, dean)
    }

    #[tokio::test]
    async fn booking_moves_the_targeted_slot() {
        let store = MemoryStore::new();
        let (student, dean) = seed(&store, vec![json!([9, 0]), json!([10, 0])]).await;

        let booked = book(&store, student.id, "Alice", 2).await.unwrap();
        assert_eq!(booked.len(), 1);
        assert_eq!(booked[0].detail, json!([10, 0]));

        let dean = store.find_dean_by_id(dean.id).await.unwrap().unwrap();
        assert_eq!(dean.available_slots.len(), 1);
        assert_eq!(dean.available_slots[0].detail, json!([9, 0]));

        let student = store.find_student_by_id(student.id).await.unwrap().unwrap();
        assert_eq!(student.booked_slots.len(), 1);
        assert_eq!(student.booked_slots[0].detail, json!([10, 0]));
    }

    #[tokio::test]
    async fn unknown_dean_fails_without_mutation() {
        let store = MemoryStore::new();
        let (student, dean) = seed(&store, vec![json!([9, 0])]).await;

        let err = book(&store, student.id, "Zeke", 1).await.unwrap_err();
        assert!(matches!(err, AppError::DeanNotFound));

        let dean = store.find_dean_by_id(dean.id).await.unwrap().unwrap();
        assert_eq!(dean.available_slots.len(), 1);
        let student = store.find_student_by_id(student.id).await.unwrap().unwrap();
        assert!(student.booked_slots.is_empty());
    }

    #[tokio::test]
    async fn dean_name_match_is_case_sensitive() {
        let store = MemoryStore::new();
        let (student, _) = seed(&store, vec![json!([9, 0])]).await;

        let err = book(&store, student.id, "alice", 1).await.unwrap_err();
        assert!(matches!(err, AppError::DeanNotFound));
    }

    #[tokio::test]
    async fn out_of_range_ordinal_fails_without_mutation() {
        let store = MemoryStore::new();
        let (student, dean) = seed(&store, vec![json!([9, 0])]).await;

        for ordinal in [0, 2, 99] {
            let err = book(&store, student.id, "Alice", ordinal).await.unwrap_err();
            assert!(matches!(err, AppError::SlotNotFound));
        }

        let dean = store.find_dean_by_id(dean.id).await.unwrap().unwrap();
        assert_eq!(dean.available_slots.len(), 1);
        let student = store.find_student_by_id(student.id).await.unwrap().unwrap();
        assert!(student.booked_slots.is_empty());
    }

    #[tokio::test]
    async fn vanished_student_is_unauthenticated() {
        let store = MemoryStore::new();
        seed(&store, vec![json!([9, 0])]).await;

        let err = book(&store, Uuid::new_v4(), "Alice", 1).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn duplicate_payloads_lose_exactly_one_slot() {
        let store = MemoryStore::new();
        let (student, dean) = seed(&store, vec![json!([9, 0]), json!([9, 0])]).await;

        let booked = book(&store, student.id, "Alice", 1).await.unwrap();
        assert_eq!(booked.len(), 1);

        let dean = store.find_dean_by_id(dean.id).await.unwrap().unwrap();
        assert_eq!(dean.available_slots.len(), 1);
        assert_eq!(dean.available_slots[0].detail, json!([9, 0]));
        assert_ne!(dean.available_slots[0].id, booked[0].id);
    }

    #[tokio::test]
    async fn first_dean_wins_on_shared_names() {
        let store = MemoryStore::new();
        let student = Student::new("Sam".into(), "S-1".into(), "hash".into());
        store.insert_student(&student).await.unwrap();

        let first = Dean::new(
            "Alice".into(),
            "D-1".into(),
            "hash".into(),
            Slot::intake_all(vec![json!([9, 0])]),
        );
        let second = Dean::new(
            "Alice".into(),
            "D-2".into(),
            "hash".into(),
            Slot::intake_all(vec![json!([14, 0])]),
        );
        store.insert_dean(&first).await.unwrap();
        store.insert_dean(&second).await.unwrap();

        let booked = book(&store, student.id, "Alice", 1).await.unwrap();
        assert_eq!(booked[0].detail, json!([9, 0]));

        let untouched = store.find_dean_by_id(second.id).await.unwrap().unwrap();
        assert_eq!(untouched.available_slots.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_bookings_of_one_slot_let_exactly_one_win() {
        let store = MemoryStore::new();
        let alice = Student::new("Alice".into(), "S-1".into(), "hash".into());
        let bob = Student::new("Bob".into(), "S-2".into(), "hash".into());
        let dean = Dean::new(
            "Dean".into(),
            "D-1".into(),
            "hash".into(),
            Slot::intake_all(vec![json!([9, 0])]),
        );
        store.insert_student(&alice).await.unwrap();
        store.insert_student(&bob).await.unwrap();
        store.insert_dean(&dean).await.unwrap();

        let (a, b) = tokio::join!(
            book(&store, alice.id, "Dean", 1),
            book(&store, bob.id, "Dean", 1),
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one booking must win: {:?} / {:?}", a, b);

        let dean = store.find_dean_by_id(dean.id).await.unwrap().unwrap();
        assert!(dean.available_slots.is_empty());

        let alice = store.find_student_by_id(alice.id).await.unwrap().unwrap();
        let bob = store.find_student_by_id(bob.id).await.unwrap().unwrap();
        assert_eq!(alice.booked_slots.len() + bob.booked_slots.len(), 1);
    }
}
