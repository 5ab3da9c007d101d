//! Admin authentication: token issuance and the persisted auth session.

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::model::{Token, UserLogin, UserRegister, UserResponse};
use crate::store::{AuthSession, SessionStoreExt};

#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        AuthService { api }
    }

    /// `POST /auth/register`.
    pub async fn register(&self, data: &UserRegister) -> Result<UserResponse, ClientError> {
        validate_register(data)?;
        self.api.post_json(&["auth", "register"], data).await
    }

    /// `POST /auth/login`. Does not touch the session.
    pub async fn login(&self, credentials: &UserLogin) -> Result<Token, ClientError> {
        if credentials.username.trim().is_empty() || credentials.password.is_empty() {
            return Err(ClientError::Validation("username and password are required".into()));
        }
        self.api.post_json(&["auth", "login"], credentials).await
    }

    /// `GET /auth/me` with the stored bearer token.
    pub async fn me(&self) -> Result<UserResponse, ClientError> {
        self.api.get_json(&["auth", "me"], &[], None).await
    }

    /// Log in, store the token, then load the user. If the user cannot be loaded the
    /// session is cleared again, so a failed sign-in never leaves credentials behind.
    pub async fn sign_in(&self, credentials: &UserLogin) -> Result<UserResponse, ClientError> {
        let token = self.login(credentials).await?;
        let store = self.api.store();
        store.set_auth(&AuthSession {
            token: Some(token.access_token.clone()),
            user: None,
        })?;
        match self.me().await {
            Ok(user) => {
                store.set_auth(&AuthSession {
                    token: Some(token.access_token),
                    user: Some(user.clone()),
                })?;
                tracing::info!(username = %user.username, "signed in");
                Ok(user)
            }
            Err(e) => {
                if let Err(clear_err) = store.clear_auth() {
                    tracing::warn!(error = %clear_err, "failed to clear auth session after sign-in failure");
                }
                Err(e)
            }
        }
    }

    /// Register, then sign in with the same credentials.
    pub async fn sign_up(&self, data: &UserRegister) -> Result<UserResponse, ClientError> {
        self.register(data).await?;
        self.sign_in(&UserLogin {
            username: data.username.clone(),
            password: data.password.clone(),
        })
        .await
    }

    pub fn sign_out(&self) -> Result<(), ClientError> {
        self.api.store().clear_auth()?;
        tracing::info!("signed out");
        Ok(())
    }

    pub fn session(&self) -> Result<AuthSession, ClientError> {
        Ok(self.api.store().auth()?)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().map(|s| s.is_authenticated()).unwrap_or(false)
    }

    pub fn current_user(&self) -> Option<UserResponse> {
        self.session().ok().and_then(|s| s.user)
    }
}

fn validate_register(data: &UserRegister) -> Result<(), ClientError> {
    if data.username.trim().is_empty() {
        return Err(ClientError::Validation("username is required".into()));
    }
    let email = data.email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => return Err(ClientError::Validation(format!("invalid email: {}", data.email))),
    }
    if data.password.is_empty() {
        return Err(ClientError::Validation("password is required".into()));
    }
    Ok(())
}
