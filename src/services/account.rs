use serde_json::Value;

use crate::auth::password;
use crate::auth::token::TokenSigner;
use crate::error::{AppError, Result};
use crate::models::user::{Dean, Slot, Student};
use crate::store::UserStore;
use crate::validation::auth::{validate_name, validate_password, validate_university_id};

/// A validated request to create an account.
///
/// Built from the raw signup payload before any record is constructed:
/// an unrecognized role never reaches the store, and each variant
/// carries exactly the fields its role accepts (a student cannot smuggle
/// in an `availableSlots` pool).
#[derive(Debug)]
pub enum UserCreationRequest {
    Student {
        name: String,
        university_id: String,
        password: String,
    },
    Dean {
        name: String,
        university_id: String,
        password: String,
        available_slots: Vec<Value>,
    },
}

impl UserCreationRequest {
    /// Validates raw signup fields into a typed creation request.
    pub fn new(
        role: Option<String>,
        name: Option<String>,
        university_id: Option<String>,
        password: Option<String>,
        available_slots: Option<Vec<Value>>,
    ) -> Result<Self> {
        let role = role.ok_or_else(|| {
            AppError::Role("User must have a defined role".to_string())
        })?;

        let name = name.unwrap_or_default();
        let university_id = university_id.unwrap_or_default();
        let password = password.unwrap_or_default();
        validate_name(&name)?;
        validate_university_id(&university_id)?;
        validate_password(&password)?;

        match role.as_str() {
            "student" => Ok(UserCreationRequest::Student {
                name,
                university_id,
                password,
            }),
            "dean" => Ok(UserCreationRequest::Dean {
                name,
                university_id,
                password,
                available_slots: available_slots.unwrap_or_default(),
            }),
            _ => Err(AppError::Role("User must have a defined role".to_string())),
        }
    }
}

/// The outcome of a successful signup: the new account is logged in
/// immediately.
#[derive(Debug)]
pub struct CreatedAccount {
    pub token: String,
    pub name: String,
    pub university_id: String,
}

/// Creates the account described by `request`, stores it, and signs a
/// session token for it.
pub async fn create_account(
    store: &dyn UserStore,
    signer: &TokenSigner,
    request: UserCreationRequest,
) -> Result<CreatedAccount> {
    match request {
        UserCreationRequest::Student {
            name,
            university_id,
            password,
        } => {
            tracing::debug!("Creating student account: {}", university_id);
            let password_hash = password::hash_password_blocking(password).await?;
            let student = Student::new(name, university_id, password_hash);
            store.insert_student(&student).await?;

            let token = signer.sign(student.id)?;
            tracing::info!("Student created with ID: {}", student.id);
            Ok(CreatedAccount {
                token,
                name: student.name,
                university_id: student.university_id,
            })
        }
        UserCreationRequest::Dean {
            name,
            university_id,
            password,
            available_slots,
        } => {
            tracing::debug!("Creating dean account: {}", university_id);
            let password_hash = password::hash_password_blocking(password).await?;
            let slots = Slot::intake_all(available_slots);
            let dean = Dean::new(name, university_id, password_hash, slots);
            store.insert_dean(&dean).await?;

            let token = signer.sign(dean.id)?;
            tracing::info!("Dean created with ID: {}", dean.id);
            Ok(CreatedAccount {
                token,
                name: dean.name,
                university_id: dean.university_id,
            })
        }
    }
}
