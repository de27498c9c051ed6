use serde::{Deserialize, Serialize};

use crate::models::role::Role;

/// Session metadata the identity provider attaches to every token. Acts as a
/// write-through cache of the user's role.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct PrincipalMetadata {
    pub role: Option<Role>,
}

/// The authenticated actor of the current request, as asserted by the
/// identity provider.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Principal {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub metadata: PrincipalMetadata,
}

impl Principal {
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            self.email.clone()
        } else {
            name
        }
    }
}
