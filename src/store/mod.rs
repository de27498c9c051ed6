//! Persistence seams of the membership workflow and their SurrealDB
//! implementation.
//!
//! Correctness under concurrent sign-ins relies on the database: the unique
//! index on `users.email` and a single transaction that deletes the pending
//! invitation and creates the user.

use async_trait::async_trait;
use surrealdb::{RecordId, Surreal, engine::any::Any};

use crate::errors::Result;
use crate::models::{
    invitation::Invitation,
    principal::Principal,
    role::Role,
    user::{CreateUser, User},
};

pub mod activity;
pub mod agencies;
pub mod invitations;
pub mod schema;
pub mod users;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Creates the user or, when one with the same email exists, updates its
    /// role (if given) and `updated_at`.
    async fn upsert(&self, id: &str, user: CreateUser, role: Option<Role>) -> Result<User>;

    /// Fails when the id or the email is already taken.
    async fn create(&self, id: &str, user: CreateUser) -> Result<User>;
}

#[async_trait]
pub trait InvitationStore: Send + Sync {
    async fn find_pending(&self, email: &str) -> Result<Option<Invitation>>;

    /// Deletes the pending invitation for `email`; `false` when another
    /// request consumed it first.
    async fn consume(&self, email: &str) -> Result<bool>;

    /// Provisions `user` under `id` and consumes the invitation in one
    /// transaction. An existing record for the email that has no agency yet
    /// is attached to the invitation's agency with its role instead.
    ///
    /// Errors with `ReferentialError` when the invitation's agency is gone
    /// (nothing is written) and `DuplicateProvisioning` when a user with
    /// that email exists once the transaction has failed, e.g. a record
    /// already bound to an agency.
    async fn accept(&self, invitation: &Invitation, id: &str, user: CreateUser) -> Result<User>;
}

#[async_trait]
pub trait ActivitySink: Send + Sync {
    async fn record(
        &self,
        actor: Option<&Principal>,
        agency_id: Option<&RecordId>,
        subaccount_id: Option<&RecordId>,
        description: &str,
    ) -> Result<()>;
}

/// SurrealDB backed stores. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SurrealStore {
    pub sdb: Surreal<Any>,
}

impl SurrealStore {
    pub fn new(sdb: Surreal<Any>) -> Self {
        Self { sdb }
    }
}
