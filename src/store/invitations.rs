use async_trait::async_trait;
use surrealdb::RecordId;
use tracing::debug;

use crate::{
    consts::db_const::{INVITATION_TABLE, USER_TABLE},
    errors::{Error, Result},
    models::{
        agency::Agency,
        invitation::{Invitation, InvitationStatus},
        user::{CreateUser, User},
    },
    store::{InvitationStore, SurrealStore, UserStore},
    utils::get_record_id::record_id_to_string,
};

#[async_trait]
impl InvitationStore for SurrealStore {
    async fn find_pending(&self, email: &str) -> Result<Option<Invitation>> {
        let invitations = self
            .sdb
            .query("SELECT * FROM type::table($table) WHERE email = $email AND status = $status LIMIT 1;")
            .bind(("table", INVITATION_TABLE))
            .bind(("email", email.to_string()))
            .bind(("status", InvitationStatus::Pending))
            .await?
            .take::<Vec<Invitation>>(0)?;
        Ok(invitations.into_iter().next())
    }

    async fn consume(&self, email: &str) -> Result<bool> {
        let consumed = self
            .sdb
            .query(format!(
                "DELETE {INVITATION_TABLE} WHERE email = $email AND status = $status RETURN BEFORE;"
            ))
            .bind(("email", email.to_string()))
            .bind(("status", InvitationStatus::Pending))
            .await?
            .take::<Vec<Invitation>>(0)?;
        Ok(!consumed.is_empty())
    }

    async fn accept(&self, invitation: &Invitation, id: &str, user: CreateUser) -> Result<User> {
        let agency = self
            .sdb
            .select::<Option<Agency>>(invitation.agency_id.clone())
            .await?;
        if agency.is_none() {
            return Err(Error::ReferentialError {
                email: invitation.email.clone(),
                agency_id: record_id_to_string(&invitation.agency_id),
            });
        }

        // The delete only matches while the invitation is still pending, a
        // request that lost the race throws and the whole transaction is
        // discarded. A user record without an agency is attached in place.
        let transaction = format!(
            "BEGIN TRANSACTION;
             LET $consumed = (DELETE {INVITATION_TABLE} WHERE email = $email AND status = $status RETURN BEFORE);
             IF array::len($consumed) = 0 {{ THROW 'invitation already consumed' }};
             LET $existing = (SELECT id, agency_id FROM {USER_TABLE} WHERE email = $email);
             IF array::len($existing) = 0 {{
                 CREATE ONLY $user_id CONTENT $content;
             }} ELSE IF !$existing[0].agency_id {{
                 LET $target = $existing[0].id;
                 UPDATE $target SET agency_id = $agency, role = $role, updated_at = $now;
             }} ELSE {{
                 THROW 'user already belongs to an agency';
             }};
             COMMIT TRANSACTION;"
        );
        let result = self
            .sdb
            .query(transaction)
            .bind(("email", invitation.email.clone()))
            .bind(("status", InvitationStatus::Pending))
            .bind(("user_id", RecordId::from_table_key(USER_TABLE, id)))
            .bind(("agency", invitation.agency_id.clone()))
            .bind(("role", invitation.role))
            .bind(("now", user.updated_at.clone()))
            .bind(("content", user))
            .await
            .and_then(|response| response.check());

        match result {
            Ok(_) => self
                .find_by_email(&invitation.email)
                .await?
                .ok_or(Error::NotFound),
            Err(err) => {
                debug!("accepting invitation for {} failed: {}", invitation.email, err);
                match self.find_by_email(&invitation.email).await? {
                    Some(_) => Err(Error::DuplicateProvisioning(invitation.email.clone())),
                    None => Err(err.into()),
                }
            }
        }
    }
}
