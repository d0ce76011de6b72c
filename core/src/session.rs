use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, info};

use crate::client::StoreClient;

pub const DISCORD: &str = "discord";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IdentityData {
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    pub provider: String,
    #[serde(default)]
    pub identity_data: IdentityData,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub identities: Vec<Identity>,
}

/// A signed-in OAuth session
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Avatar {
    Picture(String),
    Initial(char),
}

impl User {
    pub fn discord_identity(&self) -> Option<&Identity> { self.identities.iter().find(|identity| identity.provider == DISCORD) }

    /// Discord picture, else the first character of the Discord name, the email, or the id
    pub fn avatar(&self) -> Avatar {
        let discord = self.discord_identity().map(|identity| &identity.identity_data);
        if let Some(picture) = discord.and_then(|data| data.picture.clone()) {
            return Avatar::Picture(picture);
        }

        let initial = |value: Option<&str>| value.and_then(|value| value.chars().next());
        let initial = initial(discord.and_then(|data| data.full_name.as_deref()))
            .or_else(|| initial(self.email.as_deref()))
            .or_else(|| initial(Some(self.id.as_str())))
            .unwrap_or('?');
        Avatar::Initial(initial)
    }
}

/// Where the OAuth provider sends the user back to
pub fn login_redirect(domain: &str, base_url: &str) -> String { format!("{domain}{base_url}") }

/// Tracks whether the current session may administer storefronts
#[derive(Clone)]
pub struct AdminCheck {
    client: StoreClient,
    is_admin: Arc<AtomicBool>,
}

impl AdminCheck {
    pub fn new(client: StoreClient) -> Self { Self { client, is_admin: Arc::new(AtomicBool::new(false)) } }

    pub fn is_admin(&self) -> bool { self.is_admin.load(Ordering::SeqCst) }

    /// Re-run the check for `session`.
    ///
    /// An administrator is anyone who can see at least one permission row. A failed query
    /// keeps the previous answer.
    pub async fn check(&self, session: Option<&Session>) -> bool {
        let Some(session) = session else {
            self.is_admin.store(false, Ordering::SeqCst);
            return false;
        };

        match self.client.permissions().await {
            Ok(rows) => {
                let is_admin = !rows.is_empty();
                info!("AdminCheck.check({}): is_admin={is_admin}", session.user.id);
                self.is_admin.store(is_admin, Ordering::SeqCst);
                is_admin
            }
            Err(err) => {
                error!("AdminCheck.check({}): {err:?}", session.user.id);
                self.is_admin()
            }
        }
    }
}
