/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: HS256 token claims, issuance and validation
/// - [`service`]: [`service::AuthService`] for registration, login and tokens
/// - [`middleware`]: bearer token extraction and request authentication
///
/// # Example
///
/// ```
/// use deepresearch_shared::auth::password::{hash_password, verify_password};
/// use deepresearch_shared::auth::jwt::{create_token, validate_token, Claims};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let secret = "a-secret-that-is-at-least-32-bytes-long";
/// let claims = Claims::new(Uuid::new_v4(), "ada@example.com", Duration::hours(24));
/// let token = create_token(&claims, secret)?;
/// assert_eq!(validate_token(&token, secret)?.email, "ada@example.com");
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;
