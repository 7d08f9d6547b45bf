//! User repository.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use sqlx::PgPool;

use studybot_core::{Email, Phone, TelegramId, UserId};

use super::{RepositoryError, to_i64};
use crate::models::{NewUser, ProfileUpdate, User, UserActivity};

/// Length of generated referral codes.
pub const REFERRAL_CODE_LENGTH: usize = 8;

/// Attempts at finding an unused referral code before giving up.
const REFERRAL_CODE_ATTEMPTS: usize = 5;

const USER_COLUMNS: &str = "id, telegram_id, username, first_name, last_name, phone, email, \
     is_blocked, referral_code, referred_by, last_active_at, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    telegram_id: i64,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    is_blocked: bool,
    referral_code: String,
    referred_by: Option<i32>,
    last_active_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let phone = row
            .phone
            .as_deref()
            .map(Phone::parse)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid phone in database: {e}")))?;
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))?;

        Ok(Self {
            id: UserId::new(row.id),
            telegram_id: TelegramId::new(row.telegram_id),
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            phone,
            email,
            is_blocked: row.is_blocked,
            referral_code: row.referral_code,
            referred_by: row.referred_by.map(UserId::new),
            last_active_at: row.last_active_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Which users a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserFilter {
    #[default]
    All,
    Blocked,
}

/// Generate a random uppercase alphanumeric referral code.
#[must_use]
pub fn generate_referral_code() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(REFERRAL_CODE_LENGTH)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for bot user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their Telegram id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_telegram_id(
        &self,
        telegram_id: TelegramId,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE telegram_id = $1"
        ))
        .bind(telegram_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by database id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Find the owner of a referral code (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_referral_code(&self, code: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE referral_code = UPPER($1)"
        ))
        .bind(code.trim())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Register a user, returning the stored row and whether it was created now.
    ///
    /// Registering an already known Telegram id returns the existing user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails, or
    /// `RepositoryError::Conflict` if no unused referral code could be found.
    pub async fn register(&self, new_user: &NewUser) -> Result<(User, bool), RepositoryError> {
        for _ in 0..REFERRAL_CODE_ATTEMPTS {
            let result = sqlx::query_as::<_, UserRow>(&format!(
                r"
                INSERT INTO users (telegram_id, username, first_name, last_name, referral_code, referred_by)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (telegram_id) DO NOTHING
                RETURNING {USER_COLUMNS}
                "
            ))
            .bind(new_user.telegram_id)
            .bind(&new_user.username)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(generate_referral_code())
            .bind(new_user.referred_by)
            .fetch_optional(self.pool)
            .await;

            match result {
                Ok(Some(row)) => return Ok((row.try_into()?, true)),
                Ok(None) => {
                    let existing = self
                        .get_by_telegram_id(new_user.telegram_id)
                        .await?
                        .ok_or(RepositoryError::NotFound)?;
                    return Ok((existing, false));
                }
                Err(e) if e.as_database_error().is_some_and(|db| db.is_unique_violation()) => {
                    tracing::debug!("referral code collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(RepositoryError::Conflict(
            "could not generate a unique referral code".to_string(),
        ))
    }

    /// Record an interaction and refresh the names Telegram reports.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn touch(
        &self,
        id: UserId,
        username: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE users
            SET last_active_at = NOW(),
                username = COALESCE($2, username),
                first_name = COALESCE(first_name, $3),
                last_name = COALESCE(last_name, $4)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(username)
        .bind(first_name)
        .bind(last_name)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Change one profile field.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, RepositoryError> {
        let (column, value) = match update {
            ProfileUpdate::FirstName(name) => ("first_name", name.as_str()),
            ProfileUpdate::Phone(phone) => ("phone", phone.as_str()),
            ProfileUpdate::Email(email) => ("email", email.as_str()),
        };

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET {column} = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(value)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Block or unblock a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn set_blocked(&self, id: UserId, blocked: bool) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET is_blocked = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(blocked)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// List users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: UserFilter,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r"
            SELECT {USER_COLUMNS} FROM users
            WHERE (NOT $1 OR is_blocked)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(filter == UserFilter::Blocked)
        .bind(to_i64(limit))
        .bind(to_i64(offset))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Count users matching a filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, filter: UserFilter) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE (NOT $1 OR is_blocked)")
            .bind(filter == UserFilter::Blocked)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Search by `@username`, name, or numeric Telegram id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<User>, RepositoryError> {
        let query = query.trim().trim_start_matches('@');
        let telegram_id = query.parse::<i64>().ok();
        let pattern = format!("%{}%", escape_like(query));

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r"
            SELECT {USER_COLUMNS} FROM users
            WHERE telegram_id = $1
               OR username ILIKE $2
               OR first_name ILIKE $2
               OR last_name ILIKE $2
            ORDER BY last_active_at DESC
            LIMIT $3
            "
        ))
        .bind(telegram_id)
        .bind(pattern)
        .bind(to_i64(limit))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Number of purchases and custom orders a user has made.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn activity(&self, id: UserId) -> Result<UserActivity, RepositoryError> {
        let (purchases, orders): (i64, i64) = sqlx::query_as(
            r"
            SELECT
                (SELECT COUNT(*) FROM purchases WHERE user_id = $1),
                (SELECT COUNT(*) FROM orders WHERE user_id = $1)
            ",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(UserActivity { purchases, orders })
    }

    /// Number of users who registered with this user's referral code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn referral_count(&self, id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE referred_by = $1")
            .bind(id)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referral_code_shape() {
        let code = generate_referral_code();
        assert_eq!(code.len(), REFERRAL_CODE_LENGTH);
        assert!(
            code.chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("python"), "python");
    }
}
