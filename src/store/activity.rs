use async_trait::async_trait;
use surrealdb::RecordId;
use tracing::{info, warn};

use crate::{
    consts::db_const::{NOTIFICATION_TABLE, USER_TABLE},
    errors::{Error, Result},
    models::{
        agency::SubAccount,
        notification::{CreateNotification, Notification},
        principal::Principal,
        user::User,
    },
    store::{ActivitySink, SurrealStore, UserStore},
    utils::time::time_now,
};

impl SurrealStore {
    /// Acting user: the principal's own record, otherwise any member of the
    /// agency that owns `subaccount`.
    async fn activity_actor(
        &self,
        actor: Option<&Principal>,
        subaccount: Option<&SubAccount>,
    ) -> Result<Option<User>> {
        if let Some(principal) = actor {
            return self.find_by_email(&principal.email).await;
        }
        let Some(subaccount) = subaccount else {
            return Ok(None);
        };
        let users = self
            .sdb
            .query("SELECT * FROM type::table($table) WHERE agency_id = $agency_id LIMIT 1;")
            .bind(("table", USER_TABLE))
            .bind(("agency_id", subaccount.agency_id.clone()))
            .await?
            .take::<Vec<User>>(0)?;
        Ok(users.into_iter().next())
    }

    pub async fn notifications_for_agency(&self, agency_id: &RecordId) -> Result<Vec<Notification>> {
        let notifications = self
            .sdb
            .query("SELECT * FROM type::table($table) WHERE agency_id = $agency_id ORDER BY created_at DESC;")
            .bind(("table", NOTIFICATION_TABLE))
            .bind(("agency_id", agency_id.clone()))
            .await?
            .take::<Vec<Notification>>(0)?;
        Ok(notifications)
    }
}

#[async_trait]
impl ActivitySink for SurrealStore {
    async fn record(
        &self,
        actor: Option<&Principal>,
        agency_id: Option<&RecordId>,
        subaccount_id: Option<&RecordId>,
        description: &str,
    ) -> Result<()> {
        if agency_id.is_none() && subaccount_id.is_none() {
            return Err(Error::MissingActivityScope);
        }

        let subaccount = match subaccount_id {
            Some(id) => Some(
                self.sdb
                    .select::<Option<SubAccount>>(id.clone())
                    .await?
                    .ok_or(Error::NotFound)?,
            ),
            None => None,
        };

        let Some(user) = self.activity_actor(actor, subaccount.as_ref()).await? else {
            warn!("no user to attribute activity `{}` to", description);
            return Ok(());
        };

        let agency_id = match (agency_id, subaccount.as_ref()) {
            (Some(agency_id), _) => agency_id.clone(),
            (None, Some(subaccount)) => subaccount.agency_id.clone(),
            (None, None) => return Err(Error::MissingActivityScope),
        };

        let notification = CreateNotification {
            notification: format!("{} {}", user.name, description),
            user_id: user.id,
            agency_id,
            subaccount_id: subaccount_id.cloned(),
            created_at: time_now(),
        };
        self.sdb
            .create::<Option<Notification>>(NOTIFICATION_TABLE)
            .content(notification)
            .await?
            .ok_or(Error::NotFound)?;

        info!("activity recorded: {}", description);
        Ok(())
    }
}
