use async_trait::async_trait;
use serde::Serialize;
use surrealdb::RecordId;
use tracing::debug;

use crate::{
    consts::db_const::{SIDEBAR_OPTION_TABLE, SUBACCOUNT_TABLE, USER_TABLE},
    errors::{Error, Result},
    models::{
        agency::{AgencyNavigation, SidebarOption, SubAccount},
        role::Role,
        user::{CreateUser, User, UserDetails},
    },
    store::{SurrealStore, UserStore},
    utils::time::time_now,
};

#[derive(Serialize, Debug, Clone)]
struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    updated_at: String,
}

#[async_trait]
impl UserStore for SurrealStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self
            .sdb
            .query("SELECT * FROM type::table($table) WHERE email = $email LIMIT 1;")
            .bind(("table", USER_TABLE))
            .bind(("email", email.to_string()))
            .await?
            .take::<Vec<User>>(0)?;
        Ok(users.into_iter().next())
    }

    async fn upsert(&self, id: &str, user: CreateUser, role: Option<Role>) -> Result<User> {
        if let Some(existing) = self.find_by_email(&user.email).await? {
            let patch = UserPatch {
                role,
                updated_at: time_now(),
            };
            return self
                .sdb
                .update::<Option<User>>(existing.id)
                .merge(patch)
                .await?
                .ok_or(Error::NotFound);
        }

        let email = user.email.clone();
        match self.create(id, user).await {
            Ok(user) => Ok(user),
            Err(err) => {
                // a concurrent sign-in created the record between the lookup and the insert
                debug!("create for {} failed, looking up again: {}", email, err);
                self.find_by_email(&email).await?.ok_or(err)
            }
        }
    }

    async fn create(&self, id: &str, user: CreateUser) -> Result<User> {
        self.sdb
            .create::<Option<User>>(RecordId::from_table_key(USER_TABLE, id))
            .content(user)
            .await?
            .ok_or(Error::NotFound)
    }
}

impl SurrealStore {
    /// The user registered under `email` with their agency, its sidebar and
    /// its sub-accounts.
    pub async fn user_details(&self, email: &str) -> Result<Option<UserDetails>> {
        let Some(user) = self.find_by_email(email).await? else {
            return Ok(None);
        };
        let Some(agency_id) = user.agency_id.clone() else {
            return Ok(Some(UserDetails::new(user, None)));
        };
        let Some(agency) = self.find_agency(&agency_id).await? else {
            return Ok(Some(UserDetails::new(user, None)));
        };

        let mut response = self
            .sdb
            .query(
                "SELECT * FROM type::table($subaccounts) WHERE agency_id = $agency ORDER BY created_at;
                 SELECT * FROM type::table($sidebar) WHERE agency_id = $agency;",
            )
            .bind(("subaccounts", SUBACCOUNT_TABLE))
            .bind(("sidebar", SIDEBAR_OPTION_TABLE))
            .bind(("agency", agency_id))
            .await?;
        let subaccounts = response.take::<Vec<SubAccount>>(0)?;
        let options = response.take::<Vec<SidebarOption>>(1)?;

        let navigation = AgencyNavigation::assemble(agency, subaccounts, options);
        Ok(Some(UserDetails::new(user, Some(navigation))))
    }
}
