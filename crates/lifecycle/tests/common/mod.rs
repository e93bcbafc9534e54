//! Shared fixtures for lifecycle integration tests: mock collaborators and
//! row constructors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use leasevault_core::packs::PackType;
use leasevault_core::stay::StayType;
use leasevault_core::types::DbId;
use leasevault_db::models::case::CreateCase;
use leasevault_db::models::user::CreateUser;
use leasevault_db::repositories::{CaseRepo, UserRepo};
use leasevault_lifecycle::{PaymentEvent, RetentionScanner};
use leasevault_notify::{EmailError, Mailer, RenderedEmail};
use leasevault_storage::{DeleteReport, ObjectStorage, StorageError};

// ---------------------------------------------------------------------------
// Mock mailer
// ---------------------------------------------------------------------------

/// Records every send; can be switched into failure mode.
#[derive(Default)]
pub struct MockMailer {
    pub sent: Mutex<Vec<(String, RenderedEmail)>>,
    fail: AtomicBool,
}

impl MockMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn sent_templates(&self) -> Vec<&'static str> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, email)| email.template_id)
            .collect()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, to: &str, email: &RenderedEmail) -> Result<(), EmailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EmailError::Build("simulated SMTP outage".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), email.clone()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mock storage
// ---------------------------------------------------------------------------

/// Records deleted paths; can be switched into failure mode.
#[derive(Default)]
pub struct MockStorage {
    pub deleted: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl MockStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn deleted_paths(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for MockStorage {
    async fn delete_objects(&self, paths: &[String]) -> Result<DeleteReport, StorageError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Provider("simulated provider outage".to_string()));
        }
        self.deleted.lock().unwrap().extend_from_slice(paths);
        Ok(DeleteReport {
            deleted: paths.len(),
            failed: Vec::new(),
        })
    }

    async fn signed_url(&self, path: &str, _expires_in: Duration) -> Result<String, StorageError> {
        Ok(format!("https://signed.example/{path}"))
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub struct Harness {
    pub mailer: Arc<MockMailer>,
    pub storage: Arc<MockStorage>,
    pub scanner: RetentionScanner,
}

/// A scanner over mock collaborators, plus handles to inspect them.
pub fn harness(pool: &PgPool) -> Harness {
    let mailer = MockMailer::new();
    let storage = MockStorage::new();
    let scanner = RetentionScanner::new(pool.clone(), mailer.clone(), storage.clone());
    Harness {
        mailer,
        storage,
        scanner,
    }
}

pub async fn new_owner(pool: &PgPool, email: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            display_name: None,
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn new_case(pool: &PgPool, owner_id: DbId, stay: StayType) -> DbId {
    CaseRepo::create(
        pool,
        &CreateCase {
            owner_id,
            title: "Flat on Oak Street".to_string(),
            stay_type: stay,
        },
    )
    .await
    .unwrap()
    .id
}

pub fn evidence_event(case_id: DbId, pack: PackType, payment_ref: &str) -> PaymentEvent {
    PaymentEvent::EvidencePack {
        case_id,
        pack,
        payment_ref: payment_ref.to_string(),
        amount_cents: 2900,
        currency: "EUR".to_string(),
        stay_type_hint: None,
    }
}

pub fn extension_event(case_id: DbId, years: i32, payment_ref: &str) -> PaymentEvent {
    PaymentEvent::StorageExtension {
        case_id,
        years,
        payment_ref: payment_ref.to_string(),
        amount_cents: 4900,
        currency: "EUR".to_string(),
    }
}
