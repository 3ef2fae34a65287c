use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A bookable unit of time offered by a dean.
///
/// The payload a client submits for a slot is opaque to the system; it is
/// stored verbatim in `detail`. Every slot gets a generated identifier at
/// intake, and all removal and booking operations go by that identifier,
/// so two slots with identical payloads remain distinct records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slot {
    /// The stable identity of this slot.
    pub id: Uuid,
    /// The opaque client-supplied payload, e.g. `[9, 0]`.
    pub detail: Value,
}

impl Slot {
    /// Wraps a raw payload in a new slot with a fresh identifier.
    pub fn new(detail: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            detail,
        }
    }

    /// Normalizes a raw `availableSlots` array into individual slots.
    ///
    /// One level of grouping is flattened: an element that is itself a
    /// non-empty array whose every member is an array counts as a group
    /// and contributes one slot per member. Any other element is a single
    /// slot payload. `[[9,0],[10,0]]` yields two slots with details
    /// `[9,0]` and `[10,0]`; `[[[9,0],[10,0]]]` yields the same two.
    pub fn intake_all(raw: Vec<Value>) -> Vec<Slot> {
        let mut slots = Vec::new();
        for value in raw {
            let is_group = matches!(
                &value,
                Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_array)
            );
            if is_group {
                if let Value::Array(items) = value {
                    slots.extend(items.into_iter().map(Slot::new));
                }
            } else {
                slots.push(Slot::new(value));
            }
        }
        slots
    }
}

/// A user who books slots offered by deans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    /// The unique identifier for the student.
    pub id: Uuid,
    /// The student's full name.
    pub name: String,
    /// The student's university ID, unique among students.
    #[serde(rename = "universityID")]
    pub university_id: String,
    /// The student's hashed password. Never serialized into responses;
    /// response payloads are built field by field in the handlers.
    #[serde(rename = "passwordHash")]
    pub password_hash: String,
    /// The slots this student has booked, in booking order.
    #[serde(rename = "bookedSlots")]
    pub booked_slots: Vec<Slot>,
}

impl Student {
    /// Creates a new student with no booked slots.
    pub fn new(name: String, university_id: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            university_id,
            password_hash,
            booked_slots: Vec::new(),
        }
    }
}

/// A user who owns and offers bookable slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dean {
    /// The unique identifier for the dean.
    pub id: Uuid,
    /// The dean's full name. Booking resolves deans by exact name match;
    /// if two deans share a name, the first in record order wins.
    pub name: String,
    /// The dean's university ID, unique among deans.
    #[serde(rename = "universityID")]
    pub university_id: String,
    /// The dean's hashed password.
    #[serde(rename = "passwordHash")]
    pub password_hash: String,
    /// The slots this dean currently offers.
    #[serde(rename = "availableSlots")]
    pub available_slots: Vec<Slot>,
    /// Slots awaiting confirmation.
    #[serde(rename = "pendingSlots")]
    pub pending_slots: Vec<Slot>,
    /// Optimistic-concurrency version of this record. Conditional saves
    /// compare against the version read and bump it on success.
    pub version: i64,
}

impl Dean {
    /// Creates a new dean offering the given slots.
    pub fn new(
        name: String,
        university_id: String,
        password_hash: String,
        available_slots: Vec<Slot>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            university_id,
            password_hash,
            available_slots,
            pending_slots: Vec::new(),
            version: 0,
        }
    }
}

/// A resolved user of either role.
#[derive(Debug, Clone)]
pub enum User {
    Student(Student),
    Dean(Dean),
}

impl User {
    /// Returns the user's unique identifier.
    pub fn id(&self) -> Uuid {
        match self {
            User::Student(s) => s.id,
            User::Dean(d) => d.id,
        }
    }

    /// Returns the user's name.
    pub fn name(&self) -> &str {
        match self {
            User::Student(s) => &s.name,
            User::Dean(d) => &d.name,
        }
    }

    /// Returns the user's university ID.
    pub fn university_id(&self) -> &str {
        match self {
            User::Student(s) => &s.university_id,
            User::Dean(d) => &d.university_id,
        }
    }

    /// Returns the user's password hash.
    pub fn password_hash(&self) -> &str {
        match self {
            User::Student(s) => &s.password_hash,
            User::Dean(d) => &d.password_hash,
        }
    }
}
