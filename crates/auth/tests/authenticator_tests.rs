use sqlx::SqlitePool;
use tempfile::TempDir;
use tubehub_auth::{AuthError, Authenticator, Credentials, Registration};
use tubehub_config::{AuthConfig, DatabaseConfig};
use tubehub_database::{initialize_database, User};

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

fn auth_config() -> AuthConfig {
    AuthConfig {
        access_token_secret: "test-access-secret".into(),
        access_token_ttl_seconds: 900,
        refresh_token_secret: "test-refresh-secret".into(),
        refresh_token_ttl_seconds: 3_600,
        secure_cookies: false,
    }
}

fn registration(username: &str, email: &str) -> Registration {
    Registration {
        full_name: "Test User".into(),
        email: email.into(),
        username: username.into(),
        password: "correct horse".into(),
    }
}

struct TestContext {
    pool: SqlitePool,
    authenticator: Authenticator,
    _temp_dir: TempDir,
}

impl TestContext {
    async fn new() -> TestResult<Self> {
        let temp_dir = TempDir::new()?;
        let config = DatabaseConfig {
            url: format!("sqlite://{}", temp_dir.path().join("auth.sqlite").display()),
            max_connections: 5,
        };

        let pool = initialize_database(&config).await?;
        let authenticator = Authenticator::new(pool.clone(), &auth_config())?;

        Ok(Self {
            pool,
            authenticator,
            _temp_dir: temp_dir,
        })
    }

    fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    async fn register(&self, username: &str, email: &str) -> TestResult<User> {
        let user = self
            .authenticator
            .register(
                &registration(username, email),
                "/static/avatar.png".into(),
                None,
            )
            .await?;
        Ok(user)
    }

    async fn stored_refresh_token(&self, user_id: i64) -> TestResult<Option<String>> {
        let token: Option<String> =
            sqlx::query_scalar("SELECT refresh_token FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_one(self.pool())
                .await?;
        Ok(token)
    }
}

fn login_as(username: &str, password: &str) -> Credentials {
    Credentials {
        username: Some(username.into()),
        email: None,
        password: password.into(),
    }
}

#[tokio::test]
async fn register_normalises_and_hashes() -> TestResult {
    let ctx = TestContext::new().await?;

    let user = ctx
        .authenticator()
        .register(
            &registration("  Alice ", "Alice@Example.com"),
            "/static/a.png".into(),
            Some("/static/c.png".into()),
        )
        .await?;

    assert_eq!(user.username, "alice");
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.cover_image.as_deref(), Some("/static/c.png"));
    assert_ne!(user.password_hash, "correct horse");
    assert!(user.password_hash.starts_with("$argon2"));

    Ok(())
}

#[tokio::test]
async fn ensure_available_detects_taken_username_or_email() -> TestResult {
    let ctx = TestContext::new().await?;
    ctx.register("alice", "alice@example.com").await?;

    let same_name = ctx
        .authenticator()
        .ensure_available(&registration("ALICE", "new@example.com"))
        .await;
    assert!(matches!(same_name, Err(AuthError::UserExists)));

    let same_email = ctx
        .authenticator()
        .ensure_available(&registration("bob", "alice@example.com"))
        .await;
    assert!(matches!(same_email, Err(AuthError::UserExists)));

    let free = ctx
        .authenticator()
        .ensure_available(&registration("Bob", "bob@example.com"))
        .await?;
    assert_eq!(free.username, "bob");

    Ok(())
}

#[tokio::test]
async fn register_reports_duplicate_insert_as_user_exists() -> TestResult {
    let ctx = TestContext::new().await?;
    ctx.register("alice", "alice@example.com").await?;

    let result = ctx
        .authenticator()
        .register(
            &registration("alice", "other@example.com"),
            "/static/avatar.png".into(),
            None,
        )
        .await;

    assert!(matches!(result, Err(AuthError::UserExists)));
    Ok(())
}

#[tokio::test]
async fn register_requires_every_field() -> TestResult {
    let ctx = TestContext::new().await?;
    let mut incomplete = registration("alice", "alice@example.com");
    incomplete.password = "   ".into();

    let result = ctx.authenticator().ensure_available(&incomplete).await;
    assert!(matches!(result, Err(AuthError::MissingFields)));
    Ok(())
}

#[tokio::test]
async fn login_stores_refresh_token() -> TestResult {
    let ctx = TestContext::new().await?;
    let user = ctx.register("alice", "alice@example.com").await?;

    let (logged_in, pair) = ctx
        .authenticator()
        .login(&login_as("alice", "correct horse"))
        .await?;

    assert_eq!(logged_in.id, user.id);
    assert_eq!(
        ctx.stored_refresh_token(user.id).await?.as_deref(),
        Some(pair.refresh_token.as_str())
    );

    let authenticated = ctx
        .authenticator()
        .authenticate_access_token(&pair.access_token)
        .await?;
    assert_eq!(authenticated.public_id, user.public_id);

    Ok(())
}

#[tokio::test]
async fn login_by_email_is_case_insensitive() -> TestResult {
    let ctx = TestContext::new().await?;
    ctx.register("alice", "alice@example.com").await?;

    let credentials = Credentials {
        username: None,
        email: Some("ALICE@example.com".into()),
        password: "correct horse".into(),
    };

    let (user, _) = ctx.authenticator().login(&credentials).await?;
    assert_eq!(user.username, "alice");
    Ok(())
}

#[tokio::test]
async fn login_error_cases() -> TestResult {
    let ctx = TestContext::new().await?;
    ctx.register("alice", "alice@example.com").await?;

    let missing = ctx
        .authenticator()
        .login(&Credentials {
            username: Some(" ".into()),
            email: None,
            password: "correct horse".into(),
        })
        .await;
    assert!(matches!(missing, Err(AuthError::MissingIdentifier)));

    let unknown = ctx
        .authenticator()
        .login(&login_as("mallory", "correct horse"))
        .await;
    assert!(matches!(unknown, Err(AuthError::UserNotFound)));

    let wrong = ctx
        .authenticator()
        .login(&login_as("alice", "wrong horse"))
        .await;
    assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));

    Ok(())
}

#[tokio::test]
async fn logout_revokes_refresh_token() -> TestResult {
    let ctx = TestContext::new().await?;
    let user = ctx.register("alice", "alice@example.com").await?;
    let (_, pair) = ctx
        .authenticator()
        .login(&login_as("alice", "correct horse"))
        .await?;

    ctx.authenticator().logout(user.id).await?;

    assert!(ctx.stored_refresh_token(user.id).await?.is_none());
    let result = ctx.authenticator().refresh(&pair.refresh_token).await;
    assert!(matches!(result, Err(AuthError::RefreshTokenReused)));

    Ok(())
}

#[tokio::test]
async fn refresh_rotates_and_rejects_reuse() -> TestResult {
    let ctx = TestContext::new().await?;
    let user = ctx.register("alice", "alice@example.com").await?;
    let (_, first) = ctx
        .authenticator()
        .login(&login_as("alice", "correct horse"))
        .await?;

    let (_, second) = ctx.authenticator().refresh(&first.refresh_token).await?;
    assert_ne!(first.refresh_token, second.refresh_token);
    assert_eq!(
        ctx.stored_refresh_token(user.id).await?.as_deref(),
        Some(second.refresh_token.as_str())
    );

    let reused = ctx.authenticator().refresh(&first.refresh_token).await;
    assert!(matches!(reused, Err(AuthError::RefreshTokenReused)));

    ctx.authenticator().refresh(&second.refresh_token).await?;
    Ok(())
}

#[tokio::test]
async fn refresh_rejects_garbage_and_access_tokens() -> TestResult {
    let ctx = TestContext::new().await?;
    ctx.register("alice", "alice@example.com").await?;
    let (_, pair) = ctx
        .authenticator()
        .login(&login_as("alice", "correct horse"))
        .await?;

    let garbage = ctx.authenticator().refresh("not-a-token").await;
    assert!(matches!(garbage, Err(AuthError::InvalidRefreshToken)));

    let wrong_kind = ctx.authenticator().refresh(&pair.access_token).await;
    assert!(matches!(wrong_kind, Err(AuthError::InvalidRefreshToken)));

    Ok(())
}

#[tokio::test]
async fn access_token_for_deleted_user_is_invalid() -> TestResult {
    let ctx = TestContext::new().await?;
    let user = ctx.register("alice", "alice@example.com").await?;
    let (_, pair) = ctx
        .authenticator()
        .login(&login_as("alice", "correct horse"))
        .await?;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user.id)
        .execute(ctx.pool())
        .await?;

    let result = ctx
        .authenticator()
        .authenticate_access_token(&pair.access_token)
        .await;
    assert!(matches!(result, Err(AuthError::InvalidAccessToken)));

    Ok(())
}

#[tokio::test]
async fn change_password_checks_old_password() -> TestResult {
    let ctx = TestContext::new().await?;
    let user = ctx.register("alice", "alice@example.com").await?;

    let wrong = ctx
        .authenticator()
        .change_password(user.id, "nope", "new secret")
        .await;
    assert!(matches!(wrong, Err(AuthError::InvalidOldPassword)));

    ctx.authenticator()
        .change_password(user.id, "correct horse", "new secret")
        .await?;

    let old = ctx
        .authenticator()
        .login(&login_as("alice", "correct horse"))
        .await;
    assert!(matches!(old, Err(AuthError::InvalidCredentials)));
    ctx.authenticator()
        .login(&login_as("alice", "new secret"))
        .await?;

    Ok(())
}

#[tokio::test]
async fn update_account_rejects_taken_email() -> TestResult {
    let ctx = TestContext::new().await?;
    let alice = ctx.register("alice", "alice@example.com").await?;
    ctx.register("bob", "bob@example.com").await?;

    let taken = ctx
        .authenticator()
        .update_account(alice.id, "Alice", "BOB@example.com")
        .await;
    assert!(matches!(taken, Err(AuthError::EmailTaken)));

    let blank = ctx
        .authenticator()
        .update_account(alice.id, " ", "alice@example.com")
        .await;
    assert!(matches!(blank, Err(AuthError::MissingFields)));

    let updated = ctx
        .authenticator()
        .update_account(alice.id, " Alice Liddell ", "Liddell@Example.com")
        .await?;
    assert_eq!(updated.full_name, "Alice Liddell");
    assert_eq!(updated.email, "liddell@example.com");

    Ok(())
}

#[tokio::test]
async fn replacing_media_returns_previous_values() -> TestResult {
    let ctx = TestContext::new().await?;
    let user = ctx.register("alice", "alice@example.com").await?;

    let (updated, previous) = ctx
        .authenticator()
        .replace_avatar(user.id, "/static/new-avatar.png")
        .await?;
    assert_eq!(previous, "/static/avatar.png");
    assert_eq!(updated.avatar, "/static/new-avatar.png");

    let (updated, previous) = ctx
        .authenticator()
        .replace_cover_image(user.id, "/static/cover.png")
        .await?;
    assert!(previous.is_none());
    assert_eq!(updated.cover_image.as_deref(), Some("/static/cover.png"));

    let missing = ctx
        .authenticator()
        .replace_avatar(user.id + 100, "/static/x.png")
        .await;
    assert!(matches!(missing, Err(AuthError::UserNotFound)));

    Ok(())
}

#[tokio::test]
async fn misconfigured_secrets_are_rejected() -> TestResult {
    let ctx = TestContext::new().await?;
    let mut config = auth_config();
    config.access_token_secret.clear();

    let result = Authenticator::new(ctx.pool().clone(), &config);
    assert!(matches!(result, Err(AuthError::Misconfigured(_))));
    Ok(())
}
