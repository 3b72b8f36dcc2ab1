use crate::domains::application::repository::ApplicationRepository;
use crate::domains::application::types::{Application, NewApplication};
use crate::domains::form::catalog::FormCatalog;
use crate::domains::form::render::{render, render_view, ControlInput, FieldView};
use crate::domains::form::rules::{FieldFailure, ValidationReport, ValidationRuleset};
use crate::domains::form::types::{FieldSchema, FieldValue, FormSchema, FormValues, InsuranceCategory};
use crate::domains::form::visibility::{active_fields, is_visible};
use crate::errors::{DomainError, ServiceError, ServiceResult, StoreError, StoreResult};
use crate::types::{notices, Notice};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

/// Lifecycle of a form session.
///
/// Submit outcomes are reported through [`SubmitOutcome`]; the session itself goes
/// straight back to `Ready` once the store answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum FormState {
    NoCategorySelected,
    #[serde(rename_all = "camelCase")]
    CategoryLoading { category_id: String },
    Ready,
    Submitting,
}

/// Handle for one schema fetch. Completing with a superseded ticket is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
    category_id: String,
}

impl LoadTicket {
    pub fn category_id(&self) -> &str {
        &self.category_id
    }

    pub fn sequence(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Stored; values were reset to the form defaults.
    Submitted(Application),
    /// Validation failed; nothing was sent to the store.
    Invalid(ValidationReport),
    /// The store refused or was unreachable; values are kept for a retry.
    Failed(StoreError),
    /// Another submit was already in flight.
    Ignored,
}

/// A visible field with its inline error, if any
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldEntry {
    #[serde(flatten)]
    pub view: FieldView,
    pub error: Option<String>,
}

/// Snapshot of everything the form screen draws
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub state: FormState,
    pub category_id: Option<String>,
    pub title: String,
    pub fields: Vec<FieldEntry>,
    /// False while loading or submitting.
    pub can_submit: bool,
}

struct Session {
    state: FormState,
    category_id: Option<String>,
    schema: FormSchema,
    ruleset: ValidationRuleset,
    values: FormValues,
    errors: Vec<FieldFailure>,
    latest_load: u64,
    notices: Vec<Notice>,
}

impl Session {
    fn new() -> Self {
        Self {
            state: FormState::NoCategorySelected,
            category_id: None,
            schema: FormSchema::default(),
            ruleset: ValidationRuleset::default(),
            values: FormValues::new(),
            errors: Vec::new(),
            latest_load: 0,
            notices: Vec::new(),
        }
    }

    fn ensure_editable(&self) -> ServiceResult<()> {
        match &self.state {
            FormState::Ready => Ok(()),
            FormState::NoCategorySelected => Err(ServiceError::NoCategorySelected),
            FormState::CategoryLoading { .. } => {
                Err(ServiceError::NotReady("the form is still loading".to_string()))
            }
            FormState::Submitting => {
                Err(ServiceError::NotReady("a submission is in progress".to_string()))
            }
        }
    }

    fn position(&self, field_id: &str) -> usize {
        self.schema
            .fields
            .iter()
            .position(|field| field.id == field_id)
            .unwrap_or(usize::MAX)
    }
}

/// Drives one insurance application form: category selection, edits, inline
/// validation and submission.
///
/// All methods take `&self`; the session lives behind a mutex that is never held
/// across a collaborator call.
pub struct FormController {
    catalog: Arc<dyn FormCatalog>,
    store: Arc<dyn ApplicationRepository>,
    session: Mutex<Session>,
}

impl FormController {
    pub fn new(catalog: Arc<dyn FormCatalog>, store: Arc<dyn ApplicationRepository>) -> Self {
        Self {
            catalog,
            store,
            session: Mutex::new(Session::new()),
        }
    }

    fn session(&self) -> ServiceResult<MutexGuard<'_, Session>> {
        self.session
            .lock()
            .map_err(|_| ServiceError::ServiceUnavailable("form session lock poisoned".to_string()))
    }

    pub async fn categories(&self) -> ServiceResult<Vec<InsuranceCategory>> {
        let categories = self
            .catalog
            .fetch_categories()
            .await
            .map_err(DomainError::from)?;
        Ok(categories)
    }

    pub fn state(&self) -> ServiceResult<FormState> {
        Ok(self.session()?.state.clone())
    }

    pub fn is_submitting(&self) -> bool {
        self.session()
            .map(|session| session.state == FormState::Submitting)
            .unwrap_or(false)
    }

    pub fn category_id(&self) -> ServiceResult<Option<String>> {
        Ok(self.session()?.category_id.clone())
    }

    pub fn schema(&self) -> ServiceResult<FormSchema> {
        Ok(self.session()?.schema.clone())
    }

    pub fn values(&self) -> ServiceResult<FormValues> {
        Ok(self.session()?.values.clone())
    }

    /// Inline errors currently shown, in field order.
    pub fn errors(&self) -> ServiceResult<Vec<FieldFailure>> {
        Ok(self.session()?.errors.clone())
    }

    /// Start loading the form for a category. Any earlier load still in flight is
    /// superseded.
    pub fn begin_category_load(&self, category_id: &str) -> ServiceResult<LoadTicket> {
        let mut session = self.session()?;
        if session.state == FormState::Submitting {
            return Err(ServiceError::NotReady("a submission is in progress".to_string()));
        }

        session.latest_load += 1;
        session.state = FormState::CategoryLoading {
            category_id: category_id.to_string(),
        };
        log::debug!("Loading form for '{}' (request {})", category_id, session.latest_load);

        Ok(LoadTicket {
            seq: session.latest_load,
            category_id: category_id.to_string(),
        })
    }

    /// Apply the result of a schema fetch. Returns `Ok(false)` when the ticket was
    /// superseded and the result was dropped.
    pub fn complete_category_load(
        &self,
        ticket: LoadTicket,
        result: StoreResult<FormSchema>,
    ) -> ServiceResult<bool> {
        let mut session = self.session()?;
        if ticket.seq != session.latest_load {
            log::debug!(
                "Discarding form for '{}': request {} superseded by {}",
                ticket.category_id,
                ticket.seq,
                session.latest_load
            );
            return Ok(false);
        }

        match result {
            Ok(schema) => {
                log::info!(
                    "Form '{}' ready with {} fields",
                    ticket.category_id,
                    schema.fields.len()
                );
                session.values = schema.default_values();
                session.ruleset = ValidationRuleset::build(&schema.fields);
                session.schema = schema;
                session.category_id = Some(ticket.category_id);
                session.errors.clear();
                session.state = FormState::Ready;
                Ok(true)
            }
            Err(e) => {
                log::error!("Failed to load form for '{}': {}", ticket.category_id, e);
                session.state = if session.category_id.is_some() {
                    FormState::Ready
                } else {
                    FormState::NoCategorySelected
                };
                session.notices.push(notices::form_load_failed());
                Err(DomainError::from(e).into())
            }
        }
    }

    /// Fetch the form for a category and reset all answers to its defaults.
    pub async fn select_category(&self, category_id: &str) -> ServiceResult<bool> {
        let ticket = self.begin_category_load(category_id)?;
        let result = self.catalog.fetch_form_schema(category_id).await;
        self.complete_category_load(ticket, result)
    }

    /// Store a new answer and re-check that field. Returns the field's inline error.
    ///
    /// Date text is parsed into a date when possible; a value whose shape cannot belong
    /// to the field (a boolean for a text field) is rejected.
    pub fn set_value(&self, field_id: &str, value: FieldValue) -> ServiceResult<Option<FieldFailure>> {
        let mut session = self.session()?;
        session.ensure_editable()?;
        let value = match session.schema.field(field_id) {
            None => return Err(ServiceError::UnknownField(field_id.to_string())),
            Some(field) => field.kind.coerce(value).ok_or_else(|| ServiceError::ValueMismatch {
                field: field_id.to_string(),
                expected: field.kind.type_name().to_string(),
            })?,
        };

        session.values.set(field_id, value);

        let failure = session.ruleset.validate_field(field_id, &session.values);
        let Session {
            schema,
            values,
            errors,
            ..
        } = &mut *session;
        // fields hidden by this edit lose their messages
        errors.retain(|existing| {
            existing.field != field_id
                && schema
                    .field(&existing.field)
                    .map(|field| is_visible(field, values))
                    .unwrap_or(false)
        });
        if let Some(failure) = &failure {
            errors.push(failure.clone());
        }
        let mut errors = std::mem::take(&mut session.errors);
        errors.sort_by_key(|failure| session.position(&failure.field));
        session.errors = errors;

        Ok(failure)
    }

    /// Feed a control interaction through the field's renderer.
    pub fn interact(&self, field_id: &str, input: ControlInput) -> ServiceResult<bool> {
        let (field, current) = {
            let session = self.session()?;
            let field = session
                .schema
                .field(field_id)
                .cloned()
                .ok_or_else(|| ServiceError::UnknownField(field_id.to_string()))?;
            (field, session.values.get(field_id).cloned())
        };

        let mut outcome: ServiceResult<Option<FieldFailure>> = Ok(None);
        let applied = render(&field, current.as_ref(), |value| {
            outcome = self.set_value(field_id, value);
        })
        .interact(input);
        outcome?;

        Ok(applied)
    }

    pub fn active_fields(&self) -> ServiceResult<Vec<FieldSchema>> {
        let session = self.session()?;
        Ok(active_fields(&session.schema, &session.values)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn view(&self) -> ServiceResult<FormView> {
        let session = self.session()?;
        let fields = active_fields(&session.schema, &session.values)
            .into_iter()
            .map(|field| FieldEntry {
                view: render_view(field, session.values.get(&field.id)),
                error: session
                    .errors
                    .iter()
                    .find(|failure| failure.field == field.id)
                    .map(|failure| failure.message.clone()),
            })
            .collect();

        Ok(FormView {
            state: session.state.clone(),
            category_id: session.category_id.clone(),
            title: session.schema.title.clone(),
            fields,
            can_submit: session.state == FormState::Ready,
        })
    }

    /// Run the full ruleset without submitting.
    pub fn validate(&self) -> ServiceResult<ValidationReport> {
        let session = self.session()?;
        Ok(session.ruleset.validate(&session.values))
    }

    /// Validate and hand the answers to the store.
    ///
    /// A submit issued while another is in flight returns [`SubmitOutcome::Ignored`]
    /// without touching the store.
    pub async fn submit(&self) -> ServiceResult<SubmitOutcome> {
        let payload = {
            let mut session = self.session()?;
            if session.state == FormState::Submitting {
                log::warn!("Submit ignored: a submission is already in progress");
                return Ok(SubmitOutcome::Ignored);
            }
            session.ensure_editable()?;

            let report = session.ruleset.validate(&session.values);
            if !report.is_valid() {
                log::debug!("Submit blocked by {} invalid fields", report.failures.len());
                session.errors = report.failures.clone();
                return Ok(SubmitOutcome::Invalid(report));
            }

            let category_id = session
                .category_id
                .clone()
                .ok_or(ServiceError::NoCategorySelected)?;
            session.state = FormState::Submitting;
            session.errors.clear();
            NewApplication::new(&category_id, session.values.normalized())
        };

        let result = self.store.submit(&payload).await;

        let mut session = self.session()?;
        session.state = FormState::Ready;
        match result {
            Ok(application) => {
                log::info!("Application {} submitted", application.id);
                session.values = session.schema.default_values();
                session.notices.push(notices::application_submitted());
                Ok(SubmitOutcome::Submitted(application))
            }
            Err(e) => {
                log::error!("Application submission failed: {}", e);
                session.notices.push(notices::submission_failed());
                Ok(SubmitOutcome::Failed(e))
            }
        }
    }

    /// Drain notices raised since the last call.
    pub fn take_notices(&self) -> Vec<Notice> {
        self.session()
            .map(|mut session| std::mem::take(&mut session.notices))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::application::repository::InMemoryApplicationRepository;
    use crate::domains::form::catalog::{builtin_categories, builtin_schema, StaticFormCatalog};
    use crate::domains::form::render::Control;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Store double that records payloads, optionally waits on a gate and can fail.
    struct RecordingStore {
        calls: AtomicUsize,
        payloads: Mutex<Vec<NewApplication>>,
        gate: Option<Arc<Notify>>,
        fail: bool,
    }

    impl RecordingStore {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                payloads: Mutex::new(Vec::new()),
                gate: None,
                fail: false,
            }
        }

        fn failing() -> Self {
            Self { fail: true, ..Self::ok() }
        }

        fn gated(gate: Arc<Notify>) -> Self {
            Self { gate: Some(gate), ..Self::ok() }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ApplicationRepository for RecordingStore {
        async fn submit(&self, new_application: &NewApplication) -> StoreResult<Application> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.payloads.lock().unwrap().push(new_application.clone());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(StoreError::Unavailable("offline".to_string()));
            }
            Ok(Application {
                id: "abc12345".to_string(),
                insurance_type: new_application.insurance_type.clone(),
                submitted_at: new_application.submitted_at,
                status: Default::default(),
                form_data: new_application.form_data.clone(),
            })
        }

        async fn find_all(&self) -> StoreResult<Vec<Application>> {
            Ok(Vec::new())
        }

        async fn find_by_id(&self, _id: &str) -> StoreResult<Option<Application>> {
            Ok(None)
        }
    }

    /// Catalog whose health form only arrives once the gate opens.
    struct SlowHealthCatalog {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl FormCatalog for SlowHealthCatalog {
        async fn fetch_categories(&self) -> StoreResult<Vec<InsuranceCategory>> {
            Ok(builtin_categories())
        }

        async fn fetch_form_schema(&self, category_id: &str) -> StoreResult<FormSchema> {
            if category_id == "health" {
                self.gate.notified().await;
            }
            Ok(builtin_schema(category_id).unwrap_or_default())
        }
    }

    fn controller_with(store: Arc<dyn ApplicationRepository>) -> FormController {
        FormController::new(Arc::new(StaticFormCatalog::new()), store)
    }

    async fn filled_health_form(store: Arc<dyn ApplicationRepository>) -> FormController {
        let controller = controller_with(store);
        assert!(controller.select_category("health").await.unwrap());

        let born = Utc.with_ymd_and_hms(1990, 1, 1, 0, 0, 0).unwrap();
        controller.set_value("fullName", "Jane Doe".into()).unwrap();
        controller.set_value("email", "jane@example.com".into()).unwrap();
        controller.set_value("dateOfBirth", born.into()).unwrap();
        controller.set_value("hasMedicalConditions", "no".into()).unwrap();
        controller.set_value("coverageType", "basic".into()).unwrap();
        controller.set_value("termsAgreed", true.into()).unwrap();
        controller
    }

    #[tokio::test]
    async fn test_starts_without_category() {
        let controller = controller_with(Arc::new(RecordingStore::ok()));
        assert_eq!(controller.state().unwrap(), FormState::NoCategorySelected);
        assert!(matches!(
            controller.set_value("fullName", "x".into()),
            Err(ServiceError::NoCategorySelected)
        ));
        assert!(matches!(controller.submit().await, Err(ServiceError::NoCategorySelected)));

        let view = controller.view().unwrap();
        assert!(view.fields.is_empty());
        assert!(!view.can_submit);
    }

    #[tokio::test]
    async fn test_select_category_resets_values() {
        let controller = controller_with(Arc::new(RecordingStore::ok()));
        controller.select_category("car").await.unwrap();
        controller.set_value("vehicleMake", "Honda".into()).unwrap();

        controller.select_category("home").await.unwrap();
        let values = controller.values().unwrap();
        assert!(!values.contains("vehicleMake"));
        assert_eq!(values.get("fullName"), Some(&FieldValue::text("")));
        assert_eq!(values.get("termsAgreed"), Some(&FieldValue::Bool(false)));
        assert_eq!(values.get("yearBuilt"), Some(&FieldValue::Absent));
        assert_eq!(controller.schema().unwrap().title, "Home Insurance Application");
    }

    #[tokio::test]
    async fn test_unknown_category_gives_empty_form() {
        let store = Arc::new(RecordingStore::ok());
        let controller = controller_with(store.clone());
        controller.select_category("pet").await.unwrap();

        assert_eq!(controller.state().unwrap(), FormState::Ready);
        assert!(controller.active_fields().unwrap().is_empty());
        assert!(controller.validate().unwrap().is_valid());

        // an empty form submits an empty payload
        assert!(matches!(controller.submit().await.unwrap(), SubmitOutcome::Submitted(_)));
        let payloads = store.payloads.lock().unwrap();
        assert!(payloads[0].form_data.is_empty());
        assert_eq!(payloads[0].insurance_type, "pet");
    }

    #[tokio::test]
    async fn test_stale_ticket_is_discarded() {
        let controller = controller_with(Arc::new(RecordingStore::ok()));

        let first = controller.begin_category_load("health").unwrap();
        let second = controller.begin_category_load("car").unwrap();
        assert!(second.sequence() > first.sequence());

        let car = builtin_schema("car").unwrap();
        assert!(controller.complete_category_load(second, Ok(car)).unwrap());
        let health = builtin_schema("health").unwrap();
        assert!(!controller.complete_category_load(first, Ok(health)).unwrap());

        assert_eq!(controller.category_id().unwrap().as_deref(), Some("car"));
        assert_eq!(controller.schema().unwrap().title, "Car Insurance Application");
    }

    #[tokio::test]
    async fn test_slow_fetch_loses_to_later_selection() {
        let gate = Arc::new(Notify::new());
        let catalog = Arc::new(SlowHealthCatalog { gate: gate.clone() });
        let controller = FormController::new(catalog, Arc::new(RecordingStore::ok()));

        let (slow, fast) = tokio::join!(controller.select_category("health"), async {
            let applied = controller.select_category("car").await;
            gate.notify_one();
            applied
        });

        assert!(!slow.unwrap());
        assert!(fast.unwrap());
        assert_eq!(controller.category_id().unwrap().as_deref(), Some("car"));
        assert_eq!(controller.state().unwrap(), FormState::Ready);
    }

    #[tokio::test]
    async fn test_failed_load_reverts_state() {
        let controller = controller_with(Arc::new(RecordingStore::ok()));

        let ticket = controller.begin_category_load("health").unwrap();
        let err = controller
            .complete_category_load(ticket, Err(StoreError::Unavailable("timeout".to_string())))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Store(_))));
        assert_eq!(controller.state().unwrap(), FormState::NoCategorySelected);
        assert_eq!(controller.take_notices(), vec![notices::form_load_failed()]);

        controller.select_category("life").await.unwrap();
        let ticket = controller.begin_category_load("travel").unwrap();
        let _ = controller.complete_category_load(ticket, Err(StoreError::Other("boom".to_string())));
        assert_eq!(controller.state().unwrap(), FormState::Ready);
        assert_eq!(controller.category_id().unwrap().as_deref(), Some("life"));
    }

    #[tokio::test]
    async fn test_edits_update_visibility_and_inline_errors() {
        let controller = controller_with(Arc::new(RecordingStore::ok()));
        controller.select_category("health").await.unwrap();

        let failure = controller.set_value("email", "nope".into()).unwrap();
        assert_eq!(failure.unwrap().message, "Please enter a valid email");

        controller.set_value("hasMedicalConditions", "yes".into()).unwrap();
        let failure = controller
            .set_value("medicalConditionsDetails", "".into())
            .unwrap()
            .unwrap();
        assert_eq!(failure.message, "Please describe your medical conditions is required");
        assert_eq!(controller.errors().unwrap().len(), 2);

        // hiding the details drops its message
        controller.set_value("hasMedicalConditions", "no".into()).unwrap();
        let errors = controller.errors().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "email");

        assert!(controller.set_value("email", "a@b.co".into()).unwrap().is_none());
        assert!(controller.errors().unwrap().is_empty());

        assert!(matches!(
            controller.set_value("shoeSize", "9".into()),
            Err(ServiceError::UnknownField(_))
        ));
    }

    #[tokio::test]
    async fn test_interact_routes_through_renderer() {
        let controller = controller_with(Arc::new(RecordingStore::ok()));
        controller.select_category("travel").await.unwrap();

        assert!(controller
            .interact("tripDuration", ControlInput::Typed("14".to_string()))
            .unwrap());
        assert_eq!(
            controller.values().unwrap().get("tripDuration"),
            Some(&FieldValue::Number(14.0))
        );

        controller
            .interact("tripDuration", ControlInput::Typed(String::new()))
            .unwrap();
        assert_eq!(
            controller.values().unwrap().get("tripDuration"),
            Some(&FieldValue::Absent)
        );

        // a toggle ignores typed text
        assert!(!controller
            .interact("termsAgreed", ControlInput::Typed("yes".to_string()))
            .unwrap());
        assert!(controller
            .interact("termsAgreed", ControlInput::Toggled(true))
            .unwrap());

        let view = controller.view().unwrap();
        let terms = view
            .fields
            .iter()
            .find(|entry| entry.view.field_id == "termsAgreed")
            .unwrap();
        assert!(matches!(terms.view.control, Control::Toggle { checked: true, .. }));
    }

    #[tokio::test]
    async fn test_invalid_submit_never_reaches_store() {
        let store = Arc::new(RecordingStore::ok());
        let controller = controller_with(store.clone());
        controller.select_category("car").await.unwrap();

        let report = match controller.submit().await.unwrap() {
            SubmitOutcome::Invalid(report) => report,
            other => panic!("expected validation failure, got {:?}", other),
        };
        assert_eq!(report.message_for("fullName"), Some("Full Name is required"));
        assert_eq!(
            report.message_for("termsAgreed"),
            Some("You must accept the Terms and Conditions")
        );
        assert!(report.failure_for("accidentDetails").is_none());

        assert_eq!(store.calls(), 0);
        assert_eq!(controller.state().unwrap(), FormState::Ready);
        assert_eq!(controller.errors().unwrap().len(), report.failures.len());
        assert!(controller.take_notices().is_empty());
    }

    #[tokio::test]
    async fn test_health_submission_end_to_end() {
        let store = Arc::new(RecordingStore::ok());
        let controller = filled_health_form(store.clone()).await;

        // details stay hidden and do not block the submit
        let active: Vec<String> = controller
            .active_fields()
            .unwrap()
            .into_iter()
            .map(|field| field.id)
            .collect();
        assert!(!active.contains(&"medicalConditionsDetails".to_string()));

        let application = match controller.submit().await.unwrap() {
            SubmitOutcome::Submitted(application) => application,
            other => panic!("expected submission, got {:?}", other),
        };
        assert_eq!(application.id, "abc12345");
        assert_eq!(store.calls(), 1);

        let payload = store.payloads.lock().unwrap()[0].clone();
        assert_eq!(payload.insurance_type, "health");
        assert_eq!(
            payload.form_data.get("dateOfBirth"),
            Some(&FieldValue::text("1990-01-01T00:00:00.000Z"))
        );
        assert_eq!(payload.form_data.get("termsAgreed"), Some(&FieldValue::Bool(true)));

        // values reset to defaults
        let values = controller.values().unwrap();
        assert_eq!(values.get("fullName"), Some(&FieldValue::text("")));
        assert_eq!(values.get("dateOfBirth"), Some(&FieldValue::Absent));
        assert_eq!(controller.take_notices(), vec![notices::application_submitted()]);
    }

    #[tokio::test]
    async fn test_date_text_is_submitted_as_timestamp() {
        let store = Arc::new(RecordingStore::ok());
        let controller = filled_health_form(store.clone()).await;

        // the host sends dates as JSON strings
        let typed: FieldValue = serde_json::from_str("\"1985-01-15\"").unwrap();
        assert!(controller.set_value("dateOfBirth", typed).unwrap().is_none());
        assert!(matches!(
            controller.values().unwrap().get("dateOfBirth"),
            Some(FieldValue::Date(_))
        ));

        assert!(matches!(controller.submit().await.unwrap(), SubmitOutcome::Submitted(_)));
        let payload = store.payloads.lock().unwrap()[0].clone();
        assert_eq!(
            payload.form_data.get("dateOfBirth"),
            Some(&FieldValue::text("1985-01-15T00:00:00.000Z"))
        );
    }

    #[tokio::test]
    async fn test_mismatched_value_shapes_are_rejected() {
        let controller = controller_with(Arc::new(RecordingStore::ok()));
        controller.select_category("health").await.unwrap();

        assert!(matches!(
            controller.set_value("fullName", true.into()),
            Err(ServiceError::ValueMismatch { ref expected, .. }) if expected == "text"
        ));
        assert!(matches!(
            controller.set_value("termsAgreed", "yes".into()),
            Err(ServiceError::ValueMismatch { .. })
        ));
        assert_eq!(controller.values().unwrap().get("fullName"), Some(&FieldValue::text("")));

        // unparsable date text is kept so the inline error can name it
        let failure = controller.set_value("dateOfBirth", "someday".into()).unwrap();
        assert_eq!(failure.unwrap().message, "Please select a valid date");
        assert!(controller.set_value("dateOfBirth", FieldValue::Absent).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_store_failure_keeps_values() {
        let store = Arc::new(RecordingStore::failing());
        let controller = filled_health_form(store.clone()).await;
        let before = controller.values().unwrap();

        let outcome = controller.submit().await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Failed(StoreError::Unavailable(_))));
        assert_eq!(controller.values().unwrap(), before);
        assert_eq!(controller.state().unwrap(), FormState::Ready);

        let raised = controller.take_notices();
        assert_eq!(raised, vec![notices::submission_failed()]);
        assert!(raised[0].is_destructive());
    }

    #[tokio::test]
    async fn test_second_submit_while_in_flight_is_ignored() {
        let gate = Arc::new(Notify::new());
        let store = Arc::new(RecordingStore::gated(gate.clone()));
        let controller = filled_health_form(store.clone()).await;

        let (first, second, _) = tokio::join!(controller.submit(), controller.submit(), async {
            assert!(controller.is_submitting());
            assert!(!controller.view().unwrap().can_submit);
            assert!(controller.begin_category_load("car").is_err());
            gate.notify_one();
        });

        assert!(matches!(first.unwrap(), SubmitOutcome::Submitted(_)));
        assert!(matches!(second.unwrap(), SubmitOutcome::Ignored));
        assert_eq!(store.calls(), 1);
        assert_eq!(controller.state().unwrap(), FormState::Ready);
    }

    #[tokio::test]
    async fn test_submits_to_in_memory_store() {
        let catalog: Arc<dyn FormCatalog> = Arc::new(StaticFormCatalog::new());
        let store = Arc::new(InMemoryApplicationRepository::empty(catalog.clone()));
        let controller = FormController::new(catalog, store.clone());

        controller.select_category("health").await.unwrap();
        controller.set_value("fullName", "Ana".into()).unwrap();
        controller.set_value("email", "ana@example.com".into()).unwrap();
        controller
            .interact("dateOfBirth", ControlInput::Typed("1980-02-29".to_string()))
            .unwrap();
        controller.interact("hasMedicalConditions", ControlInput::Chose("yes".to_string())).unwrap();
        controller
            .interact("medicalConditionsDetails", ControlInput::Typed("Asthma".to_string()))
            .unwrap();
        controller.interact("coverageType", ControlInput::Chose("premium".to_string())).unwrap();
        controller.interact("termsAgreed", ControlInput::Toggled(true)).unwrap();

        let SubmitOutcome::Submitted(application) = controller.submit().await.unwrap() else {
            panic!("expected submission");
        };
        assert_eq!(application.insurance_type, "Health Insurance");
        assert_eq!(store.find_all().await.unwrap().len(), 1);
        assert_eq!(
            application.form_data.get("dateOfBirth"),
            Some(&FieldValue::text("1980-02-29T00:00:00.000Z"))
        );
    }
}
