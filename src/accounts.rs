use crate::{
    error::{AppError, AppResult},
    models::{NewUser, User, validate_profile_fields, validate_registration},
    repository::RepositoryState,
};

/// Accounts
///
/// Registration, credential checks and self-service profile updates. Nothing
/// here touches the session; callers install or refresh the returned user.
#[derive(Clone)]
pub struct Accounts {
    repo: RepositoryState,
}

impl Accounts {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// register
    ///
    /// Creates a user unless the username is taken (exact, case-sensitive).
    /// Does not log the new user in.
    pub async fn register(
        &self,
        username: String,
        password: String,
        email: String,
    ) -> AppResult<User> {
        validate_registration(&username, &password, &email)?;
        tracing::info!(username = %username, email = %email, "registering user");

        let mut tx = self.repo.begin().await?;
        if tx.find_user_by_username(&username).await?.is_some() {
            tracing::warn!(username = %username, "username already taken");
            return Err(AppError::Conflict);
        }

        let user = tx
            .insert_user(NewUser {
                username,
                password,
                email,
            })
            .await?;
        tx.commit().await?;

        Ok(user)
    }

    /// authenticate
    ///
    /// Returns the one user matching both username and password. No match and
    /// an ambiguous match both fail as `InvalidCredentials`.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<User> {
        tracing::info!(username = %username, "login attempt");

        let mut matches = self
            .repo
            .find_users_by_credentials(username, password)
            .await?;

        match (matches.pop(), matches.is_empty()) {
            (Some(user), true) => Ok(user),
            _ => Err(AppError::InvalidCredentials),
        }
    }

    /// update_profile
    ///
    /// Changes password and email on the acting user's own record. No ownership
    /// check is needed because the target is always the caller.
    pub async fn update_profile(
        &self,
        acting: Option<&User>,
        new_password: String,
        new_email: String,
    ) -> AppResult<User> {
        let acting = acting.ok_or(AppError::AuthenticationRequired)?;
        validate_profile_fields(&new_password, &new_email)?;
        tracing::info!(user_id = acting.id, "updating profile");

        let mut tx = self.repo.begin().await?;
        let mut user = tx
            .find_user_for_update(acting.id)
            .await?
            .ok_or(AppError::NotFound)?;

        user.password = new_password;
        user.email = new_email;
        let saved = tx.save_user(&user).await?;
        tx.commit().await?;

        Ok(saved)
    }

    /// find_by_username
    ///
    /// Plain lookup; `None` is an ordinary outcome.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.repo.find_user_by_username(username).await
    }
}
