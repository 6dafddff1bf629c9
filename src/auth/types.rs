use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Admin,
    Client,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Admin => "admin",
            UserStatus::Client => "client",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UserStatus::Admin => "Administrator",
            UserStatus::Client => "Client",
        }
    }

    /// Unknown stored values never grant admin rights.
    pub fn from_stored(value: &str) -> Self {
        Self::try_from(value).unwrap_or(UserStatus::Client)
    }
}

impl TryFrom<&str> for UserStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(UserStatus::Admin),
            "client" => Ok(UserStatus::Client),
            _ => Err(()),
        }
    }
}
