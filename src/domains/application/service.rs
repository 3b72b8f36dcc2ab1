use crate::domains::application::repository::ApplicationRepository;
use crate::domains::application::types::{Application, NewApplication};
use crate::domains::export::format::{detail_rows, header_rows};
use crate::domains::export::types::{DetailRow, ExportedDocument};
use crate::domains::export::writer::DocumentExporter;
use crate::errors::{DomainError, ServiceError, ServiceResult};
use crate::types::{notices, Notice};
use crate::validation::Validate;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Everything the applications list and details view need
#[async_trait]
pub trait ApplicationService: Send + Sync {
    async fn list_applications(&self) -> ServiceResult<Vec<Application>>;

    async fn get_application(&self, id: &str) -> ServiceResult<Application>;

    async fn submit_application(&self, new_application: NewApplication) -> ServiceResult<Application>;

    /// Write the application document. Emits a notice either way.
    async fn export_application(&self, id: &str) -> ServiceResult<ExportedDocument>;

    /// Header and answer rows for the details view.
    fn application_details(&self, application: &Application) -> Vec<DetailRow>;

    /// Drain notices raised since the last call.
    fn take_notices(&self) -> Vec<Notice>;
}

pub struct ApplicationServiceImpl {
    repo: Arc<dyn ApplicationRepository>,
    exporter: Arc<dyn DocumentExporter>,
    notices: Mutex<Vec<Notice>>,
}

impl ApplicationServiceImpl {
    pub fn new(repo: Arc<dyn ApplicationRepository>, exporter: Arc<dyn DocumentExporter>) -> Self {
        Self {
            repo,
            exporter,
            notices: Mutex::new(Vec::new()),
        }
    }

    fn notify(&self, notice: Notice) {
        match self.notices.lock() {
            Ok(mut pending) => pending.push(notice),
            Err(_) => log::error!("Notice queue lock poisoned, dropping '{}'", notice),
        }
    }

    async fn export_inner(&self, id: &str) -> ServiceResult<ExportedDocument> {
        let application = self.get_application(id).await?;
        let document = self
            .exporter
            .export(&application)
            .await
            .map_err(DomainError::from)?;
        Ok(document)
    }
}

#[async_trait]
impl ApplicationService for ApplicationServiceImpl {
    async fn list_applications(&self) -> ServiceResult<Vec<Application>> {
        let applications = self.repo.find_all().await.map_err(DomainError::from)?;
        Ok(applications)
    }

    async fn get_application(&self, id: &str) -> ServiceResult<Application> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(DomainError::from)?
            .ok_or_else(|| {
                ServiceError::Domain(DomainError::EntityNotFound(
                    "Application".to_string(),
                    id.to_string(),
                ))
            })
    }

    async fn submit_application(&self, new_application: NewApplication) -> ServiceResult<Application> {
        new_application.validate()?;
        let application = self
            .repo
            .submit(&new_application)
            .await
            .map_err(DomainError::from)?;
        Ok(application)
    }

    async fn export_application(&self, id: &str) -> ServiceResult<ExportedDocument> {
        match self.export_inner(id).await {
            Ok(document) => {
                self.notify(notices::document_downloaded());
                Ok(document)
            }
            Err(e) => {
                log::error!("Export of application {} failed: {}", id, e);
                self.notify(notices::download_failed());
                Err(e)
            }
        }
    }

    fn application_details(&self, application: &Application) -> Vec<DetailRow> {
        let mut rows = header_rows(application);
        rows.extend(detail_rows(application));
        rows
    }

    fn take_notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|mut pending| std::mem::take(&mut *pending))
            .unwrap_or_default()
    }
}
