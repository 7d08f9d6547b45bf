//! Admin access management.
//!
//! # Usage
//!
//! ```bash
//! # Grant (or change) a role
//! studybot-cli admin grant --telegram-id 123456789 --role manager
//!
//! # Remove access
//! studybot-cli admin revoke --telegram-id 123456789
//!
//! # Show everyone with access
//! studybot-cli admin list
//! ```
//!
//! Ids in `ADMIN_IDS` have full access without a row and are not listed.

use studybot_bot::db::AdminRepository;
use studybot_core::{AdminRole, TelegramId};

use super::{CommandError, connect};

fn parse_role(role: &str) -> Result<AdminRole, CommandError> {
    role.parse().map_err(|_| {
        CommandError::Invalid(format!(
            "Invalid role: {role}. Valid roles: admin, manager, content_manager"
        ))
    })
}

/// Grant `role` to a Telegram account, replacing any previous role.
///
/// # Errors
///
/// Returns error if the role is unknown or the database update fails.
pub async fn grant(telegram_id: i64, role: &str) -> Result<(), CommandError> {
    let role = parse_role(role)?;
    let pool = connect().await?;

    let admin = AdminRepository::new(&pool)
        .grant(TelegramId::new(telegram_id), role)
        .await?;
    tracing::info!(
        "Admin access granted! ID: {}, Telegram id: {}, Role: {}",
        admin.id,
        admin.telegram_id,
        admin.role
    );
    Ok(())
}

/// Remove admin access.
///
/// # Errors
///
/// Returns error if the id has no access or the database update fails.
pub async fn revoke(telegram_id: i64) -> Result<(), CommandError> {
    let pool = connect().await?;

    if !AdminRepository::new(&pool)
        .revoke(TelegramId::new(telegram_id))
        .await?
    {
        return Err(CommandError::Invalid(format!(
            "Telegram id {telegram_id} is not an admin"
        )));
    }
    tracing::info!("Admin access revoked for {telegram_id}");
    Ok(())
}

/// Log every admin with their role.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn list() -> Result<(), CommandError> {
    let pool = connect().await?;
    let admins = AdminRepository::new(&pool).list().await?;

    if admins.is_empty() {
        tracing::info!("No admins in the database");
    }
    for admin in admins {
        tracing::info!(
            "  {} {} (since {})",
            admin.telegram_id,
            admin.role.label(),
            admin.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert!(matches!(parse_role("content_manager"), Ok(AdminRole::ContentManager)));
        assert!(matches!(parse_role("super_admin"), Err(CommandError::Invalid(_))));
    }
}
