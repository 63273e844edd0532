use crate::error::ServiceError;
use async_trait::async_trait;
use serde::Deserialize;

// Signed-in user profile
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct User {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl User {
    /// First name, else full name, else "User". Blank values are skipped.
    pub fn display_name(&self) -> &str {
        [&self.first_name, &self.name]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or("User")
    }
}

/// Snapshot of the authentication state handed to the header.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    pub is_authenticated: bool,
    pub user: Option<User>,
}

impl Session {
    pub fn signed_in(user: User) -> Self {
        Session {
            is_authenticated: true,
            user: Some(user),
        }
    }

    pub fn signed_out() -> Self {
        Session::default()
    }

    pub fn from_user(user: Option<User>) -> Self {
        user.map(Session::signed_in).unwrap_or_default()
    }

    pub fn greeting(&self) -> Option<String> {
        match (&self.user, self.is_authenticated) {
            (Some(user), true) => Some(format!("Welcome, {}", user.display_name())),
            _ => None,
        }
    }
}

/// Tears the current session down. Invoked only after the user confirmed.
#[async_trait]
pub trait Logout: Send {
    async fn logout(&mut self) -> Result<(), ServiceError>;
}

/// Ends the local session. Public keys carry no server-side session to revoke.
#[derive(Debug, Default)]
pub struct EndSession {
    ended: bool,
}

#[async_trait]
impl Logout for EndSession {
    async fn logout(&mut self) -> Result<(), ServiceError> {
        if self.ended {
            return Err(ServiceError::Session("session already ended".to_string()));
        }
        self.ended = true;
        log::info!("session ended");
        Ok(())
    }
}
