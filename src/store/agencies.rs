use surrealdb::RecordId;
use tracing::info;

use crate::{
    consts::db_const::{
        AGENCY_TABLE, INVITATION_TABLE, NOTIFICATION_TABLE, SIDEBAR_OPTION_TABLE,
        SUBACCOUNT_TABLE, USER_TABLE,
    },
    errors::{Error, Result},
    models::{
        agency::{Agency, AgencyDetails, CreateAgency, default_sidebar_options},
        role::Role,
    },
    store::{SurrealStore, UserStore},
    utils::{get_record_id::record_id_to_string, time::time_now},
};

impl SurrealStore {
    pub async fn find_agency(&self, agency_id: &RecordId) -> Result<Option<Agency>> {
        Ok(self
            .sdb
            .select::<Option<Agency>>(agency_id.clone())
            .await?)
    }

    /// Updates an existing agency, or creates it and wires its membership:
    /// the unattached user registered with the company email joins the
    /// agency as its owner and the default sidebar is created, all in one
    /// transaction.
    pub async fn upsert_agency(&self, agency_key: &str, details: AgencyDetails) -> Result<Agency> {
        let agency_id = &RecordId::from_table_key(AGENCY_TABLE, agency_key);
        if details.company_email.is_empty() {
            return Err(Error::EmailNotExist(details.company_email));
        }

        if self.find_agency(agency_id).await?.is_some() {
            self.sdb
                .query(
                    "BEGIN TRANSACTION;
                     UPDATE $agency MERGE $details;
                     UPDATE $agency SET updated_at = $now;
                     COMMIT TRANSACTION;",
                )
                .bind(("agency", agency_id.clone()))
                .bind(("details", details))
                .bind(("now", time_now()))
                .await?
                .check()?;
            return self.find_agency(agency_id).await?.ok_or(Error::NotFound);
        }

        if self.find_by_email(&details.company_email).await?.is_none() {
            return Err(Error::EmailNotExist(details.company_email));
        }

        let now = time_now();
        let sidebar = default_sidebar_options(agency_id, agency_key, &now);
        let company_email = details.company_email.clone();
        let transaction = format!(
            "BEGIN TRANSACTION;
             CREATE ONLY $agency CONTENT $content;
             LET $owners = (UPDATE {USER_TABLE} SET agency_id = $agency, role = $owner_role, updated_at = $now WHERE email = $company_email AND !agency_id RETURN AFTER);
             IF array::len($owners) = 0 {{ THROW 'no unattached user registered with the company email' }};
             INSERT INTO {SIDEBAR_OPTION_TABLE} $sidebar;
             COMMIT TRANSACTION;"
        );
        self.sdb
            .query(transaction)
            .bind(("agency", agency_id.clone()))
            .bind(("content", CreateAgency::new(details, now.clone())))
            .bind(("now", now))
            .bind(("company_email", company_email))
            .bind(("owner_role", Role::AgencyOwner))
            .bind(("sidebar", sidebar))
            .await?
            .check()?;

        info!("agency {} created", agency_key);
        self.find_agency(agency_id).await?.ok_or(Error::NotFound)
    }

    /// Deletes the agency with everything it owns, users included.
    pub async fn delete_agency(&self, agency_id: &RecordId) -> Result<()> {
        if self.find_agency(agency_id).await?.is_none() {
            return Err(Error::NotFound);
        }

        let transaction = format!(
            "BEGIN TRANSACTION;
             DELETE {NOTIFICATION_TABLE} WHERE agency_id = $agency;
             DELETE {INVITATION_TABLE} WHERE agency_id = $agency;
             DELETE {SIDEBAR_OPTION_TABLE} WHERE agency_id = $agency;
             DELETE {SUBACCOUNT_TABLE} WHERE agency_id = $agency;
             DELETE {USER_TABLE} WHERE agency_id = $agency;
             DELETE $agency;
             COMMIT TRANSACTION;"
        );
        self.sdb
            .query(transaction)
            .bind(("agency", agency_id.clone()))
            .await?
            .check()?;

        info!("agency {} deleted", record_id_to_string(agency_id));
        Ok(())
    }
}
