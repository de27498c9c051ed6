//! Membership resolution for an authenticated principal.
//!
//! Invoked by every route guard: looks for a pending invitation and
//! provisions the invited user, otherwise falls back to the existing user
//! record, and finally writes the resolved role through to the identity
//! provider's session metadata.
//!
//! After the first successful provisioning, repeated calls only cost the
//! invitation and user lookups; the metadata write is skipped while the
//! session already carries the stored role.

use surrealdb::RecordId;
use tracing::{info, warn};

use crate::{
    errors::Result,
    models::{
        principal::Principal,
        role::Role,
        user::{CreateUser, User},
    },
    store::{ActivitySink, InvitationStore, UserStore},
};

pub mod consumer;
pub mod resolver;
pub mod sync;

pub use consumer::Acceptance;
pub use sync::RoleSynchronizer;

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A pending invitation was accepted during this call.
    Provisioned(User),
    /// The principal already had a user record.
    Existing(User),
    /// Neither an invitation nor a user record.
    NoMembership,
}

impl Resolution {
    pub fn user(&self) -> Option<&User> {
        match self {
            Resolution::Provisioned(user) | Resolution::Existing(user) => Some(user),
            Resolution::NoMembership => None,
        }
    }

    pub fn agency_id(&self) -> Option<&RecordId> {
        self.user().and_then(|user| user.agency_id.as_ref())
    }

    pub fn role(&self) -> Option<Role> {
        self.user().map(|user| user.role)
    }

    pub fn status(&self) -> &'static str {
        match self {
            Resolution::Provisioned(_) => "provisioned",
            Resolution::Existing(_) => "existing",
            Resolution::NoMembership => "none",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MembershipService<S> {
    store: S,
    synchronizer: RoleSynchronizer,
}

impl<S> MembershipService<S>
where
    S: UserStore + InvitationStore + ActivitySink,
{
    pub fn new(store: S, synchronizer: RoleSynchronizer) -> Self {
        Self {
            store,
            synchronizer,
        }
    }

    /// Resolves which agency `principal` belongs to, accepting a pending
    /// invitation first if there is one.
    pub async fn resolve(&self, principal: &Principal) -> Result<Resolution> {
        let resolution = match self.accept_pending_invitation(principal).await? {
            Acceptance::Provisioned(user) => Resolution::Provisioned(user),
            Acceptance::AlreadyProvisioned(user) => Resolution::Existing(user),
            Acceptance::NoInvitation | Acceptance::OwnerInvitationSkipped => {
                match self.find_existing(principal).await? {
                    Some(user) => Resolution::Existing(user),
                    None => Resolution::NoMembership,
                }
            }
        };

        self.sync_role(principal, resolution.role()).await;
        Ok(resolution)
    }

    /// Creates or updates the principal's own user record, then writes the
    /// stored role through to the session metadata.
    pub async fn init_user(&self, principal: &Principal, role: Option<Role>) -> Result<User> {
        self.require_email(principal)?;
        // stored under the trimmed email that the resolver looks up
        let new_user = CreateUser::from_principal(principal, role.unwrap_or_default());
        let user = self
            .store
            .upsert(
                &principal.id,
                new_user,
                role,
            )
            .await?;
        info!("user {} initialised as {}", user.email, user.role);

        self.sync_role(principal, Some(user.role)).await;
        Ok(user)
    }

    /// A failed write leaves the session stale; the next request sees the
    /// mismatch and writes again.
    pub async fn sync_role(&self, principal: &Principal, role: Option<Role>) {
        if let Err(err) = self.synchronizer.sync(principal, role).await {
            warn!("session metadata of {} left stale: {}", principal.id, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use async_trait::async_trait;

    use super::*;
    use crate::errors::Error;
    use crate::models::invitation::Invitation;
    use crate::store::SurrealStore;
    use crate::testing::{
        RecordingProvider, agency_id, memory_store, principal, seed_agency, seed_invitation,
    };

    fn service(
        store: SurrealStore,
        provider: &Arc<RecordingProvider>,
    ) -> MembershipService<SurrealStore> {
        let synchronizer = RoleSynchronizer::new(provider.clone(), 1, Duration::from_millis(1));
        MembershipService::new(store, synchronizer)
    }

    async fn users_with_email(store: &SurrealStore, email: &str) -> usize {
        store
            .sdb
            .query("SELECT * FROM users WHERE email = $email;")
            .bind(("email", email.to_string()))
            .await
            .expect("query")
            .take::<Vec<User>>(0)
            .expect("users")
            .len()
    }

    #[tokio::test]
    async fn test_pending_invitation_is_provisioned_and_consumed() {
        let store = memory_store().await;
        seed_agency(&store, "ag1").await;
        seed_invitation(&store, "a@x.com", "ag1", Role::SubaccountUser).await;
        let provider = Arc::new(RecordingProvider::default());
        let service = service(store.clone(), &provider);
        let ada = principal("user_a", "a@x.com");

        let resolution = service.resolve(&ada).await.expect("resolve");

        assert_eq!(resolution.status(), "provisioned");
        assert_eq!(resolution.agency_id(), Some(&agency_id("ag1")));
        let user = store
            .find_by_email("a@x.com")
            .await
            .expect("lookup")
            .expect("user");
        assert_eq!(user.role, Role::SubaccountUser);
        assert_eq!(user.agency_id, Some(agency_id("ag1")));
        assert_eq!(user.name, "Ada Lovelace");
        assert!(store.find_pending("a@x.com").await.expect("lookup").is_none());
        assert_eq!(provider.role_of("user_a"), Some(Role::SubaccountUser));

        let notifications = store
            .notifications_for_agency(&agency_id("ag1"))
            .await
            .expect("notifications");
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].notification, "Ada Lovelace Joined");
    }

    #[tokio::test]
    async fn test_existing_user_resolution_is_idempotent() {
        let store = memory_store().await;
        seed_agency(&store, "ag1").await;
        seed_invitation(&store, "a@x.com", "ag1", Role::AgencyAdmin).await;
        let provider = Arc::new(RecordingProvider::default());
        let service = service(store.clone(), &provider);
        let mut ada = principal("user_a", "a@x.com");

        service.resolve(&ada).await.expect("provision");
        ada.metadata.role = provider.role_of("user_a");

        for _ in 0..3 {
            let resolution = service.resolve(&ada).await.expect("resolve");
            assert_eq!(resolution.status(), "existing");
            assert_eq!(resolution.agency_id(), Some(&agency_id("ag1")));
            assert_eq!(resolution.role(), Some(Role::AgencyAdmin));
        }
        assert_eq!(users_with_email(&store, "a@x.com").await, 1);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_principal_has_no_membership() {
        let store = memory_store().await;
        let provider = Arc::new(RecordingProvider::default());
        let service = service(store.clone(), &provider);
        let bob = principal("user_b", "b@x.com");

        let resolution = service.resolve(&bob).await.expect("resolve");

        assert_eq!(resolution, Resolution::NoMembership);
        assert_eq!(resolution.agency_id(), None);
        assert_eq!(users_with_email(&store, "b@x.com").await, 0);
        assert_eq!(provider.role_of("user_b"), Some(Role::SubaccountUser));
    }

    #[tokio::test]
    async fn test_concurrent_first_logins_create_one_user() {
        let store = memory_store().await;
        seed_agency(&store, "ag1").await;
        seed_invitation(&store, "c@x.com", "ag1", Role::SubaccountUser).await;
        let provider = Arc::new(RecordingProvider::default());
        let service = service(store.clone(), &provider);
        let carol = principal("user_c", "c@x.com");

        let (first, second) = tokio::join!(service.resolve(&carol), service.resolve(&carol));

        let first = first.expect("first resolve");
        let second = second.expect("second resolve");
        assert_eq!(first.agency_id(), Some(&agency_id("ag1")));
        assert_eq!(second.agency_id(), Some(&agency_id("ag1")));
        assert_eq!(users_with_email(&store, "c@x.com").await, 1);
        assert!(store.find_pending("c@x.com").await.expect("lookup").is_none());
    }

    #[tokio::test]
    async fn test_concurrent_logins_with_owner_invitation() {
        let store = memory_store().await;
        seed_agency(&store, "ag2").await;
        let carol = principal("user_c", "c@x.com");
        let mut owner = CreateUser::from_principal(&carol, Role::AgencyOwner);
        owner.agency_id = Some(agency_id("ag2"));
        store.create("user_c", owner).await.expect("owner record");
        seed_invitation(&store, "c@x.com", "ag2", Role::AgencyOwner).await;
        let provider = Arc::new(RecordingProvider::default());
        let service = service(store.clone(), &provider);

        let (first, second) = tokio::join!(service.resolve(&carol), service.resolve(&carol));

        for resolution in [first.expect("first"), second.expect("second")] {
            assert_eq!(resolution.agency_id(), Some(&agency_id("ag2")));
            assert_eq!(resolution.role(), Some(Role::AgencyOwner));
        }
        assert_eq!(users_with_email(&store, "c@x.com").await, 1);
        assert!(store.find_pending("c@x.com").await.expect("lookup").is_some());
    }

    #[tokio::test]
    async fn test_owner_invitation_alone_grants_nothing() {
        let store = memory_store().await;
        seed_agency(&store, "ag2").await;
        seed_invitation(&store, "c@x.com", "ag2", Role::AgencyOwner).await;
        let provider = Arc::new(RecordingProvider::default());
        let service = service(store.clone(), &provider);
        let carol = principal("user_c", "c@x.com");

        for _ in 0..2 {
            let resolution = service.resolve(&carol).await.expect("resolve");
            assert_eq!(resolution, Resolution::NoMembership);
        }
        assert_eq!(users_with_email(&store, "c@x.com").await, 0);
        assert!(store.find_pending("c@x.com").await.expect("lookup").is_some());
        assert_eq!(provider.role_of("user_c"), Some(Role::SubaccountUser));
    }

    #[tokio::test]
    async fn test_user_without_agency_accepts_invitation() {
        let store = memory_store().await;
        seed_agency(&store, "ag1").await;
        let provider = Arc::new(RecordingProvider::default());
        let service = service(store.clone(), &provider);
        let ada = principal("user_a", "a@x.com");
        let initialised = service.init_user(&ada, None).await.expect("init");
        seed_invitation(&store, "a@x.com", "ag1", Role::AgencyAdmin).await;

        let resolution = service.resolve(&ada).await.expect("resolve");

        assert_eq!(resolution.status(), "provisioned");
        assert_eq!(resolution.agency_id(), Some(&agency_id("ag1")));
        assert_eq!(resolution.role(), Some(Role::AgencyAdmin));
        assert_eq!(resolution.user().map(|u| &u.id), Some(&initialised.id));
        assert!(store.find_pending("a@x.com").await.expect("lookup").is_none());
        assert_eq!(users_with_email(&store, "a@x.com").await, 1);
        assert_eq!(provider.role_of("user_a"), Some(Role::AgencyAdmin));

        let again = service.resolve(&ada).await.expect("resolve again");
        assert_eq!(again.status(), "existing");
        assert_eq!(again.agency_id(), Some(&agency_id("ag1")));
    }

    #[tokio::test]
    async fn test_init_user_stores_trimmed_email() {
        let store = memory_store().await;
        let provider = Arc::new(RecordingProvider::default());
        let service = service(store.clone(), &provider);
        let eve = principal("user_e", "  e@x.com ");

        let user = service.init_user(&eve, None).await.expect("init");

        assert_eq!(user.email, "e@x.com");
        assert_eq!(
            service.find_existing(&eve).await.expect("lookup").map(|u| u.id),
            Some(user.id)
        );
    }

    #[tokio::test]
    async fn test_missing_agency_fails_and_keeps_invitation() {
        let store = memory_store().await;
        seed_invitation(&store, "d@x.com", "deleted", Role::SubaccountUser).await;
        let provider = Arc::new(RecordingProvider::default());
        let service = service(store.clone(), &provider);
        let dan = principal("user_d", "d@x.com");

        for _ in 0..2 {
            let result = service.resolve(&dan).await;
            assert!(matches!(result, Err(Error::ReferentialError { .. })));
        }
        assert!(store.find_pending("d@x.com").await.expect("lookup").is_some());
        assert_eq!(users_with_email(&store, "d@x.com").await, 0);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_metadata_failure_keeps_user_and_heals_later() {
        let store = memory_store().await;
        seed_agency(&store, "ag1").await;
        seed_invitation(&store, "a@x.com", "ag1", Role::AgencyAdmin).await;
        let provider = Arc::new(RecordingProvider::failing(1));
        let service = service(store.clone(), &provider);
        let ada = principal("user_a", "a@x.com");

        let resolution = service.resolve(&ada).await.expect("resolve");
        assert_eq!(resolution.status(), "provisioned");
        assert_eq!(provider.role_of("user_a"), None);
        assert!(store.find_by_email("a@x.com").await.expect("lookup").is_some());

        // session still carries no role, so the next guard writes it
        let resolution = service.resolve(&ada).await.expect("resolve again");
        assert_eq!(resolution.status(), "existing");
        assert_eq!(provider.role_of("user_a"), Some(Role::AgencyAdmin));
    }

    #[tokio::test]
    async fn test_init_user_upserts_and_syncs() {
        let store = memory_store().await;
        let provider = Arc::new(RecordingProvider::default());
        let service = service(store.clone(), &provider);
        let owner = principal("user_o", "owner@x.com");

        let user = service
            .init_user(&owner, Some(Role::AgencyOwner))
            .await
            .expect("init");
        assert_eq!(user.role, Role::AgencyOwner);
        assert_eq!(user.agency_id, None);
        assert_eq!(provider.role_of("user_o"), Some(Role::AgencyOwner));

        let again = service.init_user(&owner, None).await.expect("init again");
        assert_eq!(again.id, user.id);
        assert_eq!(again.role, Role::AgencyOwner);
        assert_eq!(users_with_email(&store, "owner@x.com").await, 1);
    }

    /// Store that counts invitation transactions and can take its activity
    /// sink down.
    #[derive(Clone)]
    struct ObservedStore {
        inner: SurrealStore,
        accepts: Arc<AtomicUsize>,
        activity_down: bool,
    }

    impl ObservedStore {
        fn new(inner: SurrealStore, activity_down: bool) -> Self {
            Self {
                inner,
                accepts: Arc::new(AtomicUsize::new(0)),
                activity_down,
            }
        }

        fn accepts(&self) -> usize {
            self.accepts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UserStore for ObservedStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
            self.inner.find_by_email(email).await
        }
        async fn upsert(&self, id: &str, user: CreateUser, role: Option<Role>) -> Result<User> {
            self.inner.upsert(id, user, role).await
        }
        async fn create(&self, id: &str, user: CreateUser) -> Result<User> {
            self.inner.create(id, user).await
        }
    }

    #[async_trait]
    impl InvitationStore for ObservedStore {
        async fn find_pending(&self, email: &str) -> Result<Option<Invitation>> {
            self.inner.find_pending(email).await
        }
        async fn consume(&self, email: &str) -> Result<bool> {
            self.inner.consume(email).await
        }
        async fn accept(&self, invitation: &Invitation, id: &str, user: CreateUser) -> Result<User> {
            self.accepts.fetch_add(1, Ordering::SeqCst);
            self.inner.accept(invitation, id, user).await
        }
    }

    #[async_trait]
    impl ActivitySink for ObservedStore {
        async fn record(
            &self,
            actor: Option<&Principal>,
            agency_id: Option<&RecordId>,
            subaccount_id: Option<&RecordId>,
            description: &str,
        ) -> Result<()> {
            if self.activity_down {
                return Err(Error::NotFound);
            }
            self.inner
                .record(actor, agency_id, subaccount_id, description)
                .await
        }
    }

    fn observed_service(store: ObservedStore) -> MembershipService<ObservedStore> {
        let provider = Arc::new(RecordingProvider::default());
        let synchronizer = RoleSynchronizer::new(provider, 1, Duration::from_millis(1));
        MembershipService::new(store, synchronizer)
    }

    #[tokio::test]
    async fn test_activity_failure_does_not_undo_provisioning() {
        let store = memory_store().await;
        seed_agency(&store, "ag1").await;
        seed_invitation(&store, "a@x.com", "ag1", Role::SubaccountGuest).await;
        let service = observed_service(ObservedStore::new(store.clone(), true));

        let resolution = service
            .resolve(&principal("user_a", "a@x.com"))
            .await
            .expect("resolve");

        assert_eq!(resolution.status(), "provisioned");
        assert_eq!(resolution.role(), Some(Role::SubaccountGuest));
        assert!(store.find_pending("a@x.com").await.expect("lookup").is_none());
    }

    #[tokio::test]
    async fn test_invitation_from_other_agency_is_kept_without_retrying() {
        let store = memory_store().await;
        seed_agency(&store, "ag1").await;
        seed_agency(&store, "ag2").await;
        let ada = principal("user_a", "a@x.com");
        let mut member = CreateUser::from_principal(&ada, Role::SubaccountUser);
        member.agency_id = Some(agency_id("ag1"));
        store.create("user_a", member).await.expect("member");
        seed_invitation(&store, "a@x.com", "ag2", Role::AgencyAdmin).await;
        let observed = ObservedStore::new(store.clone(), false);
        let service = observed_service(observed.clone());

        for _ in 0..3 {
            let resolution = service.resolve(&ada).await.expect("resolve");
            assert_eq!(resolution.status(), "existing");
            assert_eq!(resolution.agency_id(), Some(&agency_id("ag1")));
            assert_eq!(resolution.role(), Some(Role::SubaccountUser));
        }
        assert_eq!(observed.accepts(), 0);
        assert!(store.find_pending("a@x.com").await.expect("lookup").is_some());
    }

    #[tokio::test]
    async fn test_stale_invitation_for_same_agency_is_consumed() {
        let store = memory_store().await;
        seed_agency(&store, "ag1").await;
        let ada = principal("user_a", "a@x.com");
        let mut member = CreateUser::from_principal(&ada, Role::SubaccountUser);
        member.agency_id = Some(agency_id("ag1"));
        store.create("user_a", member).await.expect("member");
        seed_invitation(&store, "a@x.com", "ag1", Role::SubaccountUser).await;
        let observed = ObservedStore::new(store.clone(), false);
        let service = observed_service(observed.clone());

        let resolution = service.resolve(&ada).await.expect("resolve");

        assert_eq!(resolution.status(), "existing");
        assert_eq!(observed.accepts(), 0);
        assert!(store.find_pending("a@x.com").await.expect("lookup").is_none());
    }
}
