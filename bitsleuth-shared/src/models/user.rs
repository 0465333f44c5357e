/// User model and database operations
///
/// A user's subscription state lives in two denormalized fields:
/// `access_until` (the authoritative timestamp) and `is_premium` (a flag
/// kept consistent with it on every grant). Settlement extends
/// `access_until` and sets `is_premium` in the same statement; readers that
/// need the truthful current state should use [`User::has_active_access`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id                 UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email              CITEXT NOT NULL UNIQUE,
///     email_verified     BOOLEAN NOT NULL DEFAULT FALSE,
///     password_hash      VARCHAR(255) NOT NULL,
///     access_until       TIMESTAMPTZ,
///     is_premium         BOOLEAN NOT NULL DEFAULT FALSE,
///     is_admin           BOOLEAN NOT NULL DEFAULT FALSE,
///     scan_quota         INTEGER NOT NULL DEFAULT 10000,
///     verification_token UUID,
///     created_at         TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at         TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at      TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User account with subscription state
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address (case-insensitive via CITEXT, unique)
    pub email: String,

    /// Whether the email address has been verified
    pub email_verified: bool,

    /// Argon2id password hash, never plaintext
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Premium access expiry; `None` means no subscription was ever granted
    pub access_until: Option<DateTime<Utc>>,

    /// Denormalized premium flag, true iff `access_until` is in the future
    pub is_premium: bool,

    /// Admin dashboard access
    pub is_admin: bool,

    /// Remaining scan quota for non-premium usage
    pub scan_quota: i32,

    /// One-shot email verification token, cleared on verification
    #[serde(skip_serializing)]
    pub verification_token: Option<Uuid>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// When the user last logged in (None if never)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    /// Whether this account is an admin (bootstrap only)
    pub is_admin: bool,

    /// Email verification token to store, if a verification flow is active
    pub verification_token: Option<Uuid>,
}

impl User {
    /// True if the user currently holds unexpired premium access
    ///
    /// This is derived from `access_until`, not the stored flag, so it
    /// stays truthful even after a subscription lapses.
    pub fn has_active_access(&self) -> bool {
        self.access_until.is_some_and(|until| until > Utc::now())
    }

    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint) or
    /// the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, is_admin, verification_token)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, email_verified, password_hash, access_until,
                      is_premium, is_admin, scan_quota, verification_token,
                      created_at, updated_at, last_login_at
            "#,
        )
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.is_admin)
        .bind(data.verification_token)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, email_verified, password_hash, access_until,
                   is_premium, is_admin, scan_quota, verification_token,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email (case-insensitive via CITEXT)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, email_verified, password_hash, access_until,
                   is_premium, is_admin, scan_quota, verification_token,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by a pending email verification token
    pub async fn find_by_verification_token(
        pool: &PgPool,
        token: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, email_verified, password_hash, access_until,
                   is_premium, is_admin, scan_quota, verification_token,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE verification_token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Marks a user's email as verified and clears the token
    ///
    /// Returns false if the user does not exist.
    pub async fn mark_email_verified(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email_verified = TRUE,
                verification_token = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Records a successful login
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Counts all users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Counts users holding the premium flag
    pub async fn count_premium(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE is_premium = TRUE")
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    /// Lists the most recently created users (admin dashboard)
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, email_verified, password_hash, access_until,
                   is_premium, is_admin, scan_quota, verification_token,
                   created_at, updated_at, last_login_at
            FROM users
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_user(access_until: Option<DateTime<Utc>>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            email_verified: true,
            password_hash: "$argon2id$...".to_string(),
            access_until,
            is_premium: access_until.is_some(),
            is_admin: false,
            scan_quota: 10000,
            verification_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_no_access_until_means_no_access() {
        assert!(!sample_user(None).has_active_access());
    }

    #[test]
    fn test_future_access_is_active() {
        let user = sample_user(Some(Utc::now() + Duration::days(3)));
        assert!(user.has_active_access());
    }

    #[test]
    fn test_expired_access_is_inactive() {
        // Stored is_premium may still be true; the derived check is not
        let user = sample_user(Some(Utc::now() - Duration::hours(1)));
        assert!(!user.has_active_access());
    }
}
