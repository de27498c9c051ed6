use surrealdb::RecordId;
use tracing::{debug, info, warn};

use crate::{
    errors::{Error, Result},
    membership::MembershipService,
    models::{
        principal::Principal,
        role::Role,
        user::{CreateUser, User},
    },
    store::{ActivitySink, InvitationStore, UserStore},
};

/// Outcome of looking for a pending invitation on sign-in.
#[derive(Debug, Clone, PartialEq)]
pub enum Acceptance {
    NoInvitation,
    /// Owner records are created with their agency, never from an
    /// invitation; the invitation stays pending.
    OwnerInvitationSkipped,
    Provisioned(User),
    /// A concurrent request (or an earlier sign-in) created the user first.
    AlreadyProvisioned(User),
}

impl<S> MembershipService<S>
where
    S: UserStore + InvitationStore + ActivitySink,
{
    pub async fn accept_pending_invitation(&self, principal: &Principal) -> Result<Acceptance> {
        let email = self.require_email(principal)?;
        let Some(invitation) = self.store.find_pending(email).await? else {
            return Ok(Acceptance::NoInvitation);
        };

        // Owner invitations stay pending untouched.
        if invitation.role == Role::AgencyOwner {
            warn!(
                "skipping owner invitation for {}, owners are not provisioned from invitations",
                invitation.email
            );
            return Ok(Acceptance::OwnerInvitationSkipped);
        }

        // a user already bound to an agency never goes through the
        // transaction, so a kept invitation costs only this lookup
        if let Some(existing) = self.store.find_by_email(email).await? {
            if existing.agency_id.is_some() {
                return self.settle_existing(existing, &invitation.agency_id).await;
            }
        }

        let new_user = CreateUser::from_invitation(&invitation, principal);
        match self.store.accept(&invitation, &principal.id, new_user).await {
            Ok(user) => {
                info!("{} joined {:?} as {}", user.email, user.agency_id, user.role);
                if let Err(err) = self
                    .store
                    .record(Some(principal), Some(&invitation.agency_id), None, "Joined")
                    .await
                {
                    warn!("could not record join of {}: {}", user.email, err);
                }
                Ok(Acceptance::Provisioned(user))
            }
            Err(Error::DuplicateProvisioning(email)) => {
                let existing = self.store.find_by_email(&email).await?.ok_or(Error::NotFound)?;
                self.settle_existing(existing, &invitation.agency_id).await
            }
            Err(err) => Err(err),
        }
    }

    /// Invitation for an email that already has a user bound to an agency.
    /// The invitation is consumed when it points at that same agency and kept
    /// otherwise.
    async fn settle_existing(&self, existing: User, agency_id: &RecordId) -> Result<Acceptance> {
        if existing.agency_id.as_ref() == Some(agency_id) {
            let consumed = self.store.consume(&existing.email).await?;
            info!(
                "{} already provisioned, stale invitation consumed: {}",
                existing.email, consumed
            );
        } else {
            debug!("{} already provisioned elsewhere, invitation kept", existing.email);
        }
        Ok(Acceptance::AlreadyProvisioned(existing))
    }
}
