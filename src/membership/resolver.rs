use crate::{
    errors::{Error, Result},
    membership::MembershipService,
    models::{principal::Principal, user::User},
    store::{ActivitySink, InvitationStore, UserStore},
};

impl<S> MembershipService<S>
where
    S: UserStore + InvitationStore + ActivitySink,
{
    pub(crate) fn require_email<'a>(&self, principal: &'a Principal) -> Result<&'a str> {
        let email = principal.email.trim();
        if email.is_empty() {
            return Err(Error::PrincipalWithoutEmail(principal.id.clone()));
        }
        Ok(email)
    }

    /// Existing user record for the principal's email. Read only.
    pub async fn find_existing(&self, principal: &Principal) -> Result<Option<User>> {
        let email = self.require_email(principal)?;
        self.store.find_by_email(email).await
    }
}
