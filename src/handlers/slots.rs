use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    models::user::{Slot, User},
    services::{booking, catalog},
    state::AppState,
};

/// One dean's entry in the slot listing.
#[derive(Serialize)]
pub struct SlotListEntry {
    #[serde(rename = "deanName")]
    pub dean_name: String,
    pub slots: Vec<Slot>,
}

/// The request payload for booking a slot.
#[derive(Deserialize, Debug)]
pub struct BookSlotRequest {
    #[serde(rename = "deanName")]
    pub dean_name: Option<String>,
    #[serde(rename = "slotNumber")]
    pub slot_number: Option<usize>,
}

/// The response payload for a successful booking: the student's full
/// updated booked list.
#[derive(Serialize)]
pub struct BookSlotResponse {
    #[serde(rename = "bookedSlot")]
    pub booked_slot: Vec<Slot>,
}

/// Lists every dean's available slots.
#[axum::debug_handler]
pub async fn list_slots(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse> {
    tracing::debug!("Listing slots for user {}", user.id());

    let entries: Vec<SlotListEntry> = catalog::list_available_slots(state.store.as_ref())
        .await?
        .into_iter()
        .map(|entry| SlotListEntry {
            dean_name: entry.dean_name,
            slots: entry.slots,
        })
        .collect();

    Ok((StatusCode::OK, Json(entries)).into_response())
}

/// Books a slot for the authenticated student.
#[axum::debug_handler]
pub async fn book_slot(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<BookSlotRequest>,
) -> Result<Response> {
    let student = match user {
        User::Student(student) => student,
        User::Dean(_) => {
            return Err(AppError::Unauthenticated("No student found".to_string()));
        }
    };

    let (dean_name, slot_number) = match (payload.dean_name, payload.slot_number) {
        (Some(dean_name), Some(slot_number)) if !dean_name.is_empty() => {
            (dean_name, slot_number)
        }
        _ => {
            return Err(AppError::Validation(
                "Please provide a dean name and a slot number".to_string(),
            ));
        }
    };

    tracing::info!(
        "Booking attempt by student {}: dean {}, slot {}",
        student.id,
        dean_name,
        slot_number
    );

    let booked = booking::book(state.store.as_ref(), student.id, &dean_name, slot_number).await?;

    let response = BookSlotResponse {
        booked_slot: booked,
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}
