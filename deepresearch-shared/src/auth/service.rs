/// Authentication service
///
/// [`AuthService`] owns everything needed to turn credentials into a user and
/// a user into a token: the database pool, the signing secret, and the token
/// lifetime. It is cheap to clone and is shared through application state.
///
/// # Example
///
/// ```no_run
/// use deepresearch_shared::auth::service::AuthService;
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let auth = AuthService::new(pool, "a-secret-that-is-at-least-32-bytes-long", 24);
///
/// let user = auth.register("ada@example.com", "hunter2hunter2", "Ada").await?;
/// let (_, issued) = auth.login("ada@example.com", "hunter2hunter2").await?;
///
/// let claims = auth.validate_token(&issued.token)?;
/// assert_eq!(claims.sub, user.id);
/// # Ok(())
/// # }
/// ```

use super::jwt::{self, Claims, JwtError};
use super::password::{self, PasswordError};
use crate::models::user::{CreateUser, User};
use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Error type for authentication operations
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    #[error("Invalid authorization header format")]
    InvalidFormat,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token names a user that no longer exists
    #[error("User not found")]
    UserNotFound,

    /// Unknown email or wrong password, indistinguishable to the caller
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User with this email already exists")]
    EmailTaken,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("Failed to issue token: {0}")]
    TokenCreation(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials
            | AuthError::InvalidFormat
            | AuthError::InvalidToken(_)
            | AuthError::UserNotFound
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::EmailTaken => StatusCode::CONFLICT,
            AuthError::Password(_)
            | AuthError::TokenCreation(_)
            | AuthError::Database(_)
            | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A signed token and the moment it stops being valid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Registration, login and token handling
#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    secret: Arc<str>,
    expiry: Duration,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("secret", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

impl AuthService {
    pub fn new(pool: PgPool, secret: impl Into<String>, expiry_hours: i64) -> Self {
        Self {
            pool,
            secret: Arc::from(secret.into()),
            expiry: Duration::hours(expiry_hours),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Token lifetime
    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Creates a new account
    ///
    /// # Errors
    ///
    /// `EmailTaken` if a live account already uses `email`, including when a
    /// concurrent registration wins the race to insert.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<User, AuthError> {
        if User::email_exists(&self.pool, email).await? {
            debug!(email, "Registration rejected, email already in use");
            return Err(AuthError::EmailTaken);
        }

        let password = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task failed: {}", e)))??;

        let user = User::create(
            &self.pool,
            CreateUser {
                email: email.to_string(),
                password_hash,
                name: name.to_string(),
            },
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::EmailTaken
            } else {
                AuthError::Database(e)
            }
        })?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Checks credentials and issues a token
    ///
    /// Unknown email and wrong password both yield `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, IssuedToken), AuthError> {
        let user = User::find_by_email(&self.pool, email).await?;

        // Unknown emails still pay for one Argon2 verification
        let password = password.to_owned();
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let matches = tokio::task::spawn_blocking(move || {
            let hash: &str = match stored_hash.as_deref() { Some(h) => h, None => dummy_hash() };
            password::verify_password(&password, hash)
        })
        .await
        .map_err(|e| AuthError::Internal(format!("Password verification task failed: {}", e)))?;

        let Some(user) = user else {
            debug!("Login rejected, no account for email");
            return Err(AuthError::InvalidCredentials);
        };

        match matches {
            Ok(true) => {}
            Ok(false) => return Err(AuthError::InvalidCredentials),
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Stored password hash is unusable");
                return Err(AuthError::InvalidCredentials);
            }
        }

        let issued = self.generate_token(&user)?;
        info!(user_id = %user.id, "User logged in");
        Ok((user, issued))
    }

    /// Signs a token for `user` valid for the configured expiry
    pub fn generate_token(&self, user: &User) -> Result<IssuedToken, AuthError> {
        let claims = Claims::new(user.id, user.email.clone(), self.expiry);
        let token = jwt::create_token(&claims, &self.secret)
            .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at(),
        })
    }

    /// Verifies signature, issuer and validity window
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        jwt::validate_token(token, &self.secret).map_err(|e| match e {
            JwtError::Expired => AuthError::InvalidToken("Token has expired".to_string()),
            other => AuthError::InvalidToken(other.to_string()),
        })
    }

    /// Looks up a live user
    pub async fn get_user(&self, id: Uuid) -> Result<User, AuthError> {
        User::find_by_id(&self.pool, id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// Hash verified against when the email matches no account
fn dummy_hash() -> &'static str {
    DUMMY_HASH.get_or_init(|| password::hash_password("no-such-account").unwrap_or_default())
}
