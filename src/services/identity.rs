use crate::auth::password;
use crate::auth::token::TokenSigner;
use crate::error::{AppError, Result};
use crate::models::user::User;
use crate::store::UserStore;

/// Resolves a bearer token to a concrete user record.
///
/// The subject is looked up among students first, then deans. A valid
/// token whose subject matches neither collection (the account vanished
/// after issuance) is treated the same as an invalid one.
pub async fn resolve_by_token(
    store: &dyn UserStore,
    signer: &TokenSigner,
    token: &str,
) -> Result<User> {
    let claims = signer.verify(token)?;

    if let Some(student) = store.find_student_by_id(claims.sub).await? {
        return Ok(User::Student(student));
    }
    if let Some(dean) = store.find_dean_by_id(claims.sub).await? {
        return Ok(User::Dean(dean));
    }

    tracing::warn!("Token subject {} matches no account", claims.sub);
    Err(AppError::Unauthenticated(
        "User does not exist".to_string(),
    ))
}

/// Resolves login credentials to a concrete user record.
///
/// Students are tried before deans. An unknown university ID and a wrong
/// password both produce the same `InvalidCredentials` error so a caller
/// cannot probe which IDs exist.
pub async fn resolve_by_credentials(
    store: &dyn UserStore,
    university_id: &str,
    password: &str,
) -> Result<User> {
    let user = match store.find_student_by_university_id(university_id).await? {
        Some(student) => User::Student(student),
        None => match store.find_dean_by_university_id(university_id).await? {
            Some(dean) => User::Dean(dean),
            None => return Err(AppError::InvalidCredentials),
        },
    };

    let verified = password::verify_password_blocking(
        password.to_string(),
        user.password_hash().to_string(),
    )
    .await?;

    if !verified {
        return Err(AppError::InvalidCredentials);
    }

    tracing::info!("User authenticated: {}", user.id());
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::auth::token::TokenSigner;
    use crate::config::Config;
    use crate::models::user::{Dean, Student};
    use crate::store::memory::MemoryStore;

    fn signer() -> TokenSigner {
        TokenSigner::new(&Config {
            database_url: String::new(),
            jwt_secret: "a-secret-of-sufficient-length!!".to_string(),
            token_ttl_hours: 1,
            port: 0,
        })
    }

    #[tokio::test]
    async fn token_resolves_student_then_dean() {
        let store = MemoryStore::new();
        let signer = signer();

        let student = Student::new("Sam".into(), "S-1".into(), "hash".into());
        let dean = Dean::new("Alice".into(), "D-1".into(), "hash".into(), Vec::new());
        store.insert_student(&student).await.unwrap();
        store.insert_dean(&dean).await.unwrap();

        let token = signer.sign(student.id).unwrap();
        let resolved = resolve_by_token(&store, &signer, &token).await.unwrap();
        assert!(matches!(resolved, User::Student(ref s) if s.id == student.id));

        let token = signer.sign(dean.id).unwrap();
        let resolved = resolve_by_token(&store, &signer, &token).await.unwrap();
        assert!(matches!(resolved, User::Dean(ref d) if d.id == dean.id));
    }

    #[tokio::test]
    async fn token_for_vanished_account_is_unauthenticated() {
        let store = MemoryStore::new();
        let signer = signer();
        let token = signer.sign(uuid::Uuid::new_v4()).unwrap();
        assert!(matches!(
            resolve_by_token(&store, &signer, &token).await,
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn unknown_id_and_wrong_password_are_indistinguishable() {
        let store = MemoryStore::new();
        let hash = hash_password("right password").unwrap();
        let student = Student::new("Sam".into(), "S-1".into(), hash);
        store.insert_student(&student).await.unwrap();

        let unknown = resolve_by_credentials(&store, "S-404", "right password")
            .await
            .unwrap_err();
        let wrong = resolve_by_credentials(&store, "S-1", "wrong password")
            .await
            .unwrap_err();

        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn correct_credentials_resolve_both_roles() {
        let store = MemoryStore::new();
        let hash = hash_password("open sesame").unwrap();
        let student = Student::new("Sam".into(), "S-1".into(), hash.clone());
        let dean = Dean::new("Alice".into(), "D-1".into(), hash, Vec::new());
        store.insert_student(&student).await.unwrap();
        store.insert_dean(&dean).await.unwrap();

        let resolved = resolve_by_credentials(&store, "S-1", "open sesame")
            .await
            .unwrap();
        assert!(matches!(resolved, User::Student(_)));

        let resolved = resolve_by_credentials(&store, "D-1", "open sesame")
            .await
            .unwrap();
        assert!(matches!(resolved, User::Dean(_)));
    }
}
