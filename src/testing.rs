//! Fixtures shared by the unit tests.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use surrealdb::{RecordId, engine::any::connect};

use crate::{
    consts::db_const::{AGENCY_TABLE, INVITATION_TABLE, SUBACCOUNT_TABLE},
    errors::{Error, Result},
    identity::IdentityProvider,
    models::{
        agency::{AgencyDetails, CreateAgency},
        invitation::InvitationStatus,
        principal::{Principal, PrincipalMetadata},
        role::Role,
    },
    store::{SurrealStore, schema::define_schema},
    utils::time::time_now,
};

pub async fn memory_store() -> SurrealStore {
    let sdb = connect("mem://").await.expect("embedded database");
    sdb.use_ns("test").use_db("test").await.expect("namespace");
    define_schema(&sdb).await.expect("schema");
    SurrealStore::new(sdb)
}

pub fn principal(id: &str, email: &str) -> Principal {
    Principal {
        id: id.to_string(),
        email: email.to_string(),
        first_name: Some("Ada".to_string()),
        last_name: Some("Lovelace".to_string()),
        image_url: Some("https://img.test/ada.png".to_string()),
        metadata: PrincipalMetadata::default(),
    }
}

pub fn agency_id(key: &str) -> RecordId {
    RecordId::from_table_key(AGENCY_TABLE, key)
}

pub fn agency_details(name: &str, company_email: &str) -> AgencyDetails {
    AgencyDetails {
        name: name.to_string(),
        company_email: company_email.to_string(),
        company_phone: "+1 555 0100".to_string(),
        white_label: true,
        address: "1 Main St".to_string(),
        city: "Springfield".to_string(),
        zip_code: "12345".to_string(),
        state: "IL".to_string(),
        country: "US".to_string(),
        agency_logo: "https://img.test/logo.png".to_string(),
        goal: 5,
    }
}

/// Agency row without owner wiring.
pub async fn seed_agency(store: &SurrealStore, key: &str) {
    store
        .sdb
        .query("CREATE ONLY $agency CONTENT $content;")
        .bind(("agency", agency_id(key)))
        .bind((
            "content",
            CreateAgency::new(agency_details("Acme", "owner@x.com"), time_now()),
        ))
        .await
        .expect("create agency")
        .check()
        .expect("agency created");
}

#[derive(serde::Serialize)]
struct SeedInvitation {
    email: String,
    agency_id: RecordId,
    role: Role,
    status: InvitationStatus,
    created_at: String,
}

pub async fn seed_invitation(store: &SurrealStore, email: &str, agency: &str, role: Role) {
    store
        .sdb
        .query("CREATE type::table($table) CONTENT $content;")
        .bind(("table", INVITATION_TABLE))
        .bind((
            "content",
            SeedInvitation {
                email: email.to_string(),
                agency_id: agency_id(agency),
                role,
                status: InvitationStatus::Pending,
                created_at: time_now(),
            },
        ))
        .await
        .expect("create invitation")
        .check()
        .expect("invitation created");
}

#[derive(serde::Serialize)]
struct SeedSubAccount {
    name: String,
    agency_id: RecordId,
    created_at: String,
}

pub async fn seed_subaccount(store: &SurrealStore, key: &str, agency: &str) -> RecordId {
    let id = RecordId::from_table_key(SUBACCOUNT_TABLE, key);
    store
        .sdb
        .query("CREATE ONLY $subaccount CONTENT $content;")
        .bind(("subaccount", id.clone()))
        .bind((
            "content",
            SeedSubAccount {
                name: "Storefront".to_string(),
                agency_id: agency_id(agency),
                created_at: time_now(),
            },
        ))
        .await
        .expect("create subaccount")
        .check()
        .expect("subaccount created");
    id
}

/// Identity provider double that remembers the last role per principal.
#[derive(Debug, Default)]
pub struct RecordingProvider {
    roles: Mutex<HashMap<String, Role>>,
    calls: AtomicUsize,
    failures_left: AtomicUsize,
}

impl RecordingProvider {
    /// Fails the first `failures` writes.
    pub fn failing(failures: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(failures),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn roles(&self) -> HashMap<String, Role> {
        self.roles.lock().expect("roles lock").clone()
    }

    pub fn role_of(&self, principal_id: &str) -> Option<Role> {
        self.roles().get(principal_id).copied()
    }
}

#[async_trait]
impl IdentityProvider for RecordingProvider {
    async fn write_role(&self, principal_id: &str, role: Role) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::ExternalMetadataWrite {
                principal_id: principal_id.to_string(),
                reason: "provider unavailable".to_string(),
            });
        }
        self.roles
            .lock()
            .expect("roles lock")
            .insert(principal_id.to_string(), role);
        Ok(())
    }
}
