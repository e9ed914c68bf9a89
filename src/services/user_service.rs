use tracing::{error, warn};

use crate::db::{StoreError, UserStore};
use crate::errors::AppError;
use crate::models::{
    normalize_email, validate_username, CurrentUser, LoginRequest, NewUser, RegisterUser, Role,
    TokenResponse, UserResponse,
};
use crate::services::auth::AuthHandler;

const INVALID_CREDENTIALS: &str = "Invalid email and/or password";

pub async fn register(
    store: &dyn UserStore,
    auth: &AuthHandler,
    input: RegisterUser,
) -> Result<UserResponse, AppError> {
    let username = input.username.trim().to_string();
    validate_username(&username)?;
    let email = normalize_email(&input.email)?;
    if input.password.is_empty() {
        return Err(AppError::Validation("Password cannot be empty".into()));
    }

    let password_hash = auth.hash_password(&input.password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        AppError::Internal(e.to_string())
    })?;
    let new_user = NewUser { username, email, password_hash, role: input.role };

    let id = match store.insert_one(new_user.clone()).await {
        Ok(id) => id,
        Err(StoreError::Duplicate(_)) => {
            return Err(AppError::Conflict(format!(
                "User with email {} or username {} already exists",
                new_user.email, new_user.username
            )))
        }
        Err(e) => return Err(e.into()),
    };
    Ok(UserResponse::from(new_user.with_id(id)))
}

/// Unknown email and wrong password fail the same way.
pub async fn login(
    store: &dyn UserStore,
    auth: &AuthHandler,
    input: LoginRequest,
) -> Result<TokenResponse, AppError> {
    let email = normalize_email(&input.email)
        .map_err(|_| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;
    let user = store
        .find_by_email(&email)
        .await?
        .filter(|u| auth.verify_password(&input.password, &u.password_hash))
        .ok_or_else(|| {
            warn!("Failed login attempt for {}", email);
            AppError::Unauthorized(INVALID_CREDENTIALS.into())
        })?;

    let token = auth.encode_token(&user).map_err(|e| {
        error!("Failed to issue token for {}: {}", email, e);
        AppError::Internal(e.to_string())
    })?;
    Ok(TokenResponse { token })
}

pub async fn list_all(
    store: &dyn UserStore,
    current: &CurrentUser,
) -> Result<Vec<UserResponse>, AppError> {
    if current.role != Role::Admin {
        return Err(AppError::Forbidden("Only admins can list users".into()));
    }
    let users = store.find_all().await?;
    Ok(users.into_iter().map(UserResponse::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryUserStore;
    use chrono::Duration;

    fn auth() -> AuthHandler {
        AuthHandler::new("test-secret", Duration::hours(1))
    }

    fn registration(username: &str, email: &str, role: Role) -> RegisterUser {
        RegisterUser {
            username: username.to_string(),
            email: email.to_string(),
            password: "correct horse".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryUserStore::new();
        let auth = auth();
        let user = register(&store, &auth, registration("jane", "Jane@Example.com", Role::Operator))
            .await
            .unwrap();
        assert_eq!(user.email, "jane@example.com");

        let login_ok = login(
            &store,
            &auth,
            LoginRequest { email: "jane@example.com".into(), password: "correct horse".into() },
        )
        .await
        .unwrap();
        let current = auth.decode_token(&login_ok.token).unwrap();
        assert_eq!(current.username, "jane");
        assert_eq!(current.role, Role::Operator);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = MemoryUserStore::new();
        let auth = auth();
        register(&store, &auth, registration("jane", "jane@example.com", Role::Operator))
            .await
            .unwrap();

        let wrong_password = login(
            &store,
            &auth,
            LoginRequest { email: "jane@example.com".into(), password: "nope".into() },
        )
        .await
        .unwrap_err();
        let unknown_email = login(
            &store,
            &auth,
            LoginRequest { email: "joe@example.com".into(), password: "correct horse".into() },
        )
        .await
        .unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_register_validation_and_conflict() {
        let store = MemoryUserStore::new();
        let auth = auth();

        let short = register(&store, &auth, registration("jo", "jo@example.com", Role::Admin)).await;
        assert!(matches!(short, Err(AppError::Validation(_))));

        let bad_email = register(&store, &auth, registration("joanna", "joanna", Role::Admin)).await;
        assert!(matches!(bad_email, Err(AppError::Validation(_))));

        register(&store, &auth, registration("joanna", "jo@example.com", Role::Admin))
            .await
            .unwrap();
        let dup = register(&store, &auth, registration("joanna2", "JO@example.com", Role::Admin)).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_list_requires_admin() {
        let store = MemoryUserStore::new();
        let operator = CurrentUser {
            email: "op@example.com".into(),
            username: "op".into(),
            role: Role::Operator,
        };
        assert!(matches!(list_all(&store, &operator).await, Err(AppError::Forbidden(_))));

        let admin = CurrentUser { role: Role::Admin, ..operator };
        assert!(list_all(&store, &admin).await.unwrap().is_empty());
    }
}
