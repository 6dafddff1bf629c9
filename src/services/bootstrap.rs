use anyhow::anyhow;

use crate::{
    auth::{UserStatus, password::hash_password},
    config::AuthConfig,
    db::dao::NewUser,
};

use super::repository::AccountRepository;

/// Makes sure at least one administrator exists before the server accepts requests.
pub async fn seed_admin(repo: &dyn AccountRepository, cfg: &AuthConfig) -> anyhow::Result<()> {
    let admins = repo.count_admins().await?;
    if admins > 0 {
        tracing::info!(admins, "administrator account present");
        return Ok(());
    }

    if let Some(existing) = repo.find_user_by_email(&cfg.admin_email).await? {
        tracing::warn!(
            user_id = %existing.id,
            "no administrator exists and the configured admin email belongs to a client; leaving it untouched"
        );
        return Ok(());
    }

    let password_hash = hash_password(&cfg.admin_password)
        .map_err(|err| anyhow!("admin seed hash error: {}", err.message()))?;
    let admin = repo
        .create_user(NewUser {
            first_name: "Library".to_string(),
            last_name: "Administrator".to_string(),
            email: cfg.admin_email.clone(),
            phone_number: String::new(),
            password_hash,
            status: UserStatus::Admin,
            created_on: chrono::Utc::now().fixed_offset(),
        })
        .await?;
    tracing::info!(user_id = %admin.id, "seeded administrator account");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::seed_admin;
    use crate::{
        auth::UserStatus, config::AuthConfig, test_helpers::InMemoryAccountRepository,
    };

    fn auth_config() -> AuthConfig {
        AuthConfig {
            session_secret: "bootstrap-test-secret".to_string(),
            session_ttl_secs: 3600,
            secure_cookies: false,
            admin_email: "admin@library.test".to_string(),
            admin_password: "change-me-now".to_string(),
        }
    }

    #[tokio::test]
    async fn seeds_admin_into_empty_store() {
        let repo = InMemoryAccountRepository::new();

        seed_admin(&repo, &auth_config()).await.expect("seed should succeed");

        let users = repo.users();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "admin@library.test");
        assert!(users[0].is_admin());
    }

    #[tokio::test]
    async fn existing_admin_is_enough() {
        let repo = InMemoryAccountRepository::new();
        repo.insert_user("boss@library.test", "long-password", UserStatus::Admin);

        seed_admin(&repo, &auth_config()).await.expect("seed should succeed");
        assert_eq!(repo.users().len(), 1);
    }

    #[tokio::test]
    async fn client_with_admin_email_is_left_alone() {
        let repo = InMemoryAccountRepository::new();
        let client = repo.insert_user("admin@library.test", "long-password", UserStatus::Client);

        seed_admin(&repo, &auth_config()).await.expect("seed should succeed");

        let users = repo.users();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, client.id);
        assert!(!users[0].is_admin());
    }
}
