use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use tubehub_config::AuthConfig;
use tubehub_database::{AccountUpdate, DatabaseError, NewUser, User, UserRepository};

pub mod password;
pub mod tokens;

pub use tokens::{AccessClaims, RefreshClaims, TokenIssuer, TokenPair};

#[derive(Clone)]
pub struct Authenticator {
    users: UserRepository,
    tokens: TokenIssuer,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("all fields are required")]
    MissingFields,
    #[error("username or email is required")]
    MissingIdentifier,
    #[error("user with email or username already exists")]
    UserExists,
    #[error("user does not exist")]
    UserNotFound,
    #[error("invalid user credentials")]
    InvalidCredentials,
    #[error("invalid old password")]
    InvalidOldPassword,
    #[error("email is already in use")]
    EmailTaken,
    #[error("invalid access token")]
    InvalidAccessToken,
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("refresh token is expired or used")]
    RefreshTokenReused,
    #[error("authentication is misconfigured: {0}")]
    Misconfigured(String),
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
}

/// Text fields submitted with a sign-up form.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

impl Registration {
    /// Trim the profile fields and lowercase the identifiers. Any field left blank is an error.
    pub fn normalised(&self) -> Result<Self, AuthError> {
        let normalised = Self {
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            username: self.username.trim().to_lowercase(),
            password: self.password.clone(),
        };

        if [
            &normalised.full_name,
            &normalised.email,
            &normalised.username,
            &normalised.password,
        ]
        .iter()
        .any(|value| value.trim().is_empty())
        {
            return Err(AuthError::MissingFields);
        }

        Ok(normalised)
    }
}

/// Login input. Either identifier may be used.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

fn normalise_identifier(value: Option<&str>) -> Option<String> {
    value
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty())
}

impl Authenticator {
    pub fn new(pool: SqlitePool, config: &AuthConfig) -> Result<Self, AuthError> {
        Ok(Self {
            users: UserRepository::new(pool),
            tokens: TokenIssuer::new(config)?,
        })
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Validate a sign-up and make sure neither identifier is in use yet.
    pub async fn ensure_available(
        &self,
        registration: &Registration,
    ) -> Result<Registration, AuthError> {
        let registration = registration.normalised()?;

        let existing = self
            .users
            .find_by_username_or_email(Some(&registration.username), Some(&registration.email))
            .await?;
        if existing.is_some() {
            return Err(AuthError::UserExists);
        }

        Ok(registration)
    }

    pub async fn register(
        &self,
        registration: &Registration,
        avatar: String,
        cover_image: Option<String>,
    ) -> Result<User, AuthError> {
        let registration = registration.normalised()?;
        let password_hash = password::hash_password(&registration.password)?;

        let user = self
            .users
            .create(&NewUser {
                username: registration.username,
                email: registration.email,
                full_name: registration.full_name,
                avatar,
                cover_image,
                password_hash,
            })
            .await
            .map_err(|error| match error {
                DatabaseError::Duplicate(_) => AuthError::UserExists,
                other => AuthError::Database(other),
            })?;

        info!(user = %user.public_id, username = %user.username, "registered user");
        Ok(user)
    }

    /// Check the password and store a freshly issued refresh token.
    pub async fn login(&self, credentials: &Credentials) -> Result<(User, TokenPair), AuthError> {
        let username = normalise_identifier(credentials.username.as_deref());
        let email = normalise_identifier(credentials.email.as_deref());
        if username.is_none() && email.is_none() {
            return Err(AuthError::MissingIdentifier);
        }

        let user = self
            .users
            .find_by_username_or_email(username.as_deref(), email.as_deref())
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !password::verify_password(&credentials.password, &user.password_hash)? {
            debug!(user = %user.public_id, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.tokens.issue_pair(&user)?;
        self.users
            .set_refresh_token(user.id, Some(&pair.refresh_token))
            .await?;

        info!(user = %user.public_id, "user logged in");
        Ok((user, pair))
    }

    pub async fn logout(&self, user_id: i64) -> Result<(), AuthError> {
        self.users.set_refresh_token(user_id, None).await?;
        info!(user_id, "user logged out");
        Ok(())
    }

    /// Exchange a refresh token for a new pair. The presented token stops working.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(User, TokenPair), AuthError> {
        let claims = self.tokens.verify_refresh(refresh_token)?;

        let user = self
            .users
            .find_by_public_id(&claims.sub)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        if user.refresh_token.as_deref() != Some(refresh_token) {
            return Err(AuthError::RefreshTokenReused);
        }

        let pair = self.tokens.issue_pair(&user)?;
        let rotated = self
            .users
            .rotate_refresh_token(user.id, refresh_token, &pair.refresh_token)
            .await?;
        if !rotated {
            return Err(AuthError::RefreshTokenReused);
        }

        debug!(user = %user.public_id, "rotated refresh token");
        Ok((user, pair))
    }

    pub async fn authenticate_access_token(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.verify_access(token)?;

        self.users
            .find_by_public_id(&claims.sub)
            .await?
            .ok_or(AuthError::InvalidAccessToken)
    }

    pub async fn change_password(
        &self,
        user_id: i64,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if old_password.is_empty() || new_password.trim().is_empty() {
            return Err(AuthError::MissingFields);
        }

        let user = self.user_profile(user_id).await?;
        if !password::verify_password(old_password, &user.password_hash)? {
            return Err(AuthError::InvalidOldPassword);
        }

        let password_hash = password::hash_password(new_password)?;
        self.users
            .update_password_hash(user.id, &password_hash)
            .await?;

        info!(user = %user.public_id, "password changed");
        Ok(())
    }

    pub async fn update_account(
        &self,
        user_id: i64,
        full_name: &str,
        email: &str,
    ) -> Result<User, AuthError> {
        let update = AccountUpdate {
            full_name: full_name.trim().to_string(),
            email: email.trim().to_lowercase(),
        };
        if update.full_name.is_empty() || update.email.is_empty() {
            return Err(AuthError::MissingFields);
        }

        if self.users.email_taken_by_other(&update.email, user_id).await? {
            return Err(AuthError::EmailTaken);
        }

        self.users
            .update_account(user_id, &update)
            .await
            .map_err(|error| match error {
                DatabaseError::Duplicate(_) => AuthError::EmailTaken,
                DatabaseError::NotFound(_) => AuthError::UserNotFound,
                other => AuthError::Database(other),
            })
    }

    /// Point the avatar at `avatar` and hand back the URL it replaced.
    pub async fn replace_avatar(
        &self,
        user_id: i64,
        avatar: &str,
    ) -> Result<(User, String), AuthError> {
        let previous = self.user_profile(user_id).await?.avatar;
        let user = self.users.update_avatar(user_id, avatar).await?;
        Ok((user, previous))
    }

    pub async fn replace_cover_image(
        &self,
        user_id: i64,
        cover_image: &str,
    ) -> Result<(User, Option<String>), AuthError> {
        let previous = self.user_profile(user_id).await?.cover_image;
        let user = self.users.update_cover_image(user_id, cover_image).await?;
        Ok((user, previous))
    }

    pub async fn user_profile(&self, user_id: i64) -> Result<User, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
