use crate::config::{init_logging, PortalConfig};
use crate::domains::application::repository::{ApplicationRepository, InMemoryApplicationRepository};
use crate::domains::application::service::{ApplicationService, ApplicationServiceImpl};
use crate::domains::export::writer::{DocumentExporter, TextDocumentExporter};
use crate::domains::form::catalog::{FormCatalog, StaticFormCatalog};
use crate::domains::form::controller::FormController;
use crate::ffi::error::{ErrorCode, FFIError, FFIResult};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// Global state definitions
lazy_static! {
    static ref INIT_MUTEX: Mutex<()> = Mutex::new(());
    static ref INITIALIZED: AtomicBool = AtomicBool::new(false);

    static ref CONFIG: Mutex<Option<PortalConfig>> = Mutex::new(None);

    // Collaborators
    static ref FORM_CATALOG: Mutex<Option<Arc<dyn FormCatalog>>> = Mutex::new(None);
    static ref APPLICATION_REPO: Mutex<Option<Arc<dyn ApplicationRepository>>> = Mutex::new(None);

    // Services
    static ref APPLICATION_SERVICE: Mutex<Option<Arc<dyn ApplicationService>>> = Mutex::new(None);

    // Open form sessions, one controller each
    static ref FORM_SESSIONS: Mutex<HashMap<Uuid, Arc<FormController>>> = Mutex::new(HashMap::new());
}

/// Wire up every collaborator from `config`. Calling it again after a successful
/// initialization is a no-op.
pub fn initialize(config: PortalConfig) -> FFIResult<()> {
    let _guard = INIT_MUTEX
        .lock()
        .map_err(|_| FFIError::internal("INIT_MUTEX lock poisoned".to_string()))?;

    if INITIALIZED.load(Ordering::Acquire) {
        log::debug!("Already initialized, keeping existing configuration");
        return Ok(());
    }

    let result = initialize_internal(config);
    if result.is_ok() {
        INITIALIZED.store(true, Ordering::Release);
    }
    result
}

fn initialize_internal(config: PortalConfig) -> FFIResult<()> {
    init_logging(&config);
    log::info!(
        "Initializing form engine (export dir: {}, simulated latency: {}ms)",
        config.export_dir.display(),
        config.simulated_latency_ms
    );

    let latency = config.simulated_latency();
    let catalog: Arc<dyn FormCatalog> = Arc::new(StaticFormCatalog::with_latency(latency));
    let repo: Arc<dyn ApplicationRepository> =
        Arc::new(InMemoryApplicationRepository::new(catalog.clone()).with_latency(latency));
    let exporter: Arc<dyn DocumentExporter> =
        Arc::new(TextDocumentExporter::new(config.export_dir.clone()));
    let service: Arc<dyn ApplicationService> =
        Arc::new(ApplicationServiceImpl::new(repo.clone(), exporter));

    set_slot(&*FORM_CATALOG, catalog, "FORM_CATALOG")?;
    set_slot(&*APPLICATION_REPO, repo, "APPLICATION_REPO")?;
    set_slot(&*APPLICATION_SERVICE, service, "APPLICATION_SERVICE")?;
    set_slot(&*CONFIG, config, "CONFIG")?;

    Ok(())
}

fn set_slot<T>(slot: &Mutex<Option<T>>, value: T, name: &str) -> FFIResult<()> {
    *slot
        .lock()
        .map_err(|_| FFIError::internal(format!("{} lock poisoned", name)))? = Some(value);
    Ok(())
}

fn get_slot<T: Clone>(slot: &Mutex<Option<T>>, name: &str) -> FFIResult<T> {
    slot.lock()
        .map_err(|_| FFIError::internal(format!("{} lock poisoned", name)))?
        .clone()
        .ok_or_else(|| FFIError::not_initialized(name))
}

pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

pub fn get_config() -> FFIResult<PortalConfig> {
    get_slot(&*CONFIG, "Configuration")
}

pub fn get_form_catalog() -> FFIResult<Arc<dyn FormCatalog>> {
    get_slot(&*FORM_CATALOG, "FormCatalog")
}

pub fn get_application_repo() -> FFIResult<Arc<dyn ApplicationRepository>> {
    get_slot(&*APPLICATION_REPO, "ApplicationRepository")
}

pub fn get_application_service() -> FFIResult<Arc<dyn ApplicationService>> {
    get_slot(&*APPLICATION_SERVICE, "ApplicationService")
}

/// Open a new form session against the shared catalog and store.
pub fn create_form_session() -> FFIResult<Uuid> {
    let controller = FormController::new(get_form_catalog()?, get_application_repo()?);
    let id = Uuid::new_v4();
    FORM_SESSIONS
        .lock()
        .map_err(|_| FFIError::internal("FORM_SESSIONS lock poisoned".to_string()))?
        .insert(id, Arc::new(controller));
    log::debug!("Opened form session {}", id);
    Ok(id)
}

pub fn get_form_session(id: Uuid) -> FFIResult<Arc<FormController>> {
    FORM_SESSIONS
        .lock()
        .map_err(|_| FFIError::internal("FORM_SESSIONS lock poisoned".to_string()))?
        .get(&id)
        .cloned()
        .ok_or_else(|| {
            FFIError::with_details(
                ErrorCode::FormSessionNotFound,
                &format!("No form session with ID {}", id),
                &serde_json::json!({ "session_id": id.to_string() }).to_string(),
            )
        })
}

/// Drop a session. Returns whether it existed.
pub fn close_form_session(id: Uuid) -> FFIResult<bool> {
    let removed = FORM_SESSIONS
        .lock()
        .map_err(|_| FFIError::internal("FORM_SESSIONS lock poisoned".to_string()))?
        .remove(&id)
        .is_some();
    if removed {
        log::debug!("Closed form session {}", id);
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sessions_after_initialize() {
        initialize(PortalConfig::default()).unwrap();
        assert!(is_initialized());
        assert!(get_application_service().is_ok());

        let id = create_form_session().unwrap();
        assert!(get_form_session(id).is_ok());
        assert!(close_form_session(id).unwrap());
        assert!(!close_form_session(id).unwrap());

        let err = get_form_session(id).err().unwrap();
        assert_eq!(err.code, ErrorCode::FormSessionNotFound);
    }
}
