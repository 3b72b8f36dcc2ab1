// FFI bindings for insurance categories and form sessions.
//
// A form session is one `FormController` held by the composition root and
// addressed by a UUID. Every call that changes a session answers with the
// refreshed `FormView` plus any notices raised by the call, so the host can
// redraw without a second round trip.

use crate::domains::application::types::Application;
use crate::domains::form::controller::{FormView, SubmitOutcome};
use crate::domains::form::rules::FieldFailure;
use crate::domains::form::types::FieldValue;
use crate::ffi::error::{ErrorCode, FFIError};
use crate::ffi::{block_on_async, handle_status_result, parse_payload, with_notices, write_json};
use crate::globals;
use crate::types::Notice;
use serde::{Deserialize, Serialize};
use std::os::raw::{c_char, c_int};
use uuid::Uuid;

#[derive(Deserialize)]
struct SessionPayload {
    session_id: String,
}

fn parse_session_id(raw: &str) -> Result<Uuid, FFIError> {
    Uuid::parse_str(raw).map_err(|_| FFIError::new(ErrorCode::InvalidUuid, "invalid session_id"))
}

#[derive(Serialize)]
struct SessionResponse {
    view: FormView,
    notices: Vec<Notice>,
}

fn session_response(session_id: Uuid) -> Result<SessionResponse, FFIError> {
    let controller = globals::get_form_session(session_id)?;
    Ok(SessionResponse {
        view: controller.view()?,
        notices: controller.take_notices(),
    })
}

/// List insurance categories.
/// Response: `[{"id": "health", "name": "Health Insurance"}, ...]`
///
/// # Safety
/// `result` must be valid for a pointer write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn insurance_type_list(result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let catalog = globals::get_form_catalog()?;
        let categories = block_on_async(catalog.fetch_categories())?.map_err(FFIError::from)?;
        write_json(result, &categories)
    })
}

/// Fetch the form for a category.
/// Expected JSON payload: `{"category_id": "car"}`
///
/// # Safety
/// Pointers must be valid; `payload_json` NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn form_schema_get(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        #[derive(Deserialize)]
        struct Payload {
            category_id: String,
        }

        let p: Payload = parse_payload(payload_json)?;
        let catalog = globals::get_form_catalog()?;
        let schema = block_on_async(catalog.fetch_form_schema(&p.category_id))?.map_err(FFIError::from)?;
        write_json(result, &schema)
    })
}

/// Open a new form session.
/// Response: `{"session_id": "<uuid>"}`
///
/// # Safety
/// `result` must be valid for a pointer write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn form_session_create(result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        #[derive(Serialize)]
        struct Response {
            session_id: String,
        }

        let id = globals::create_form_session()?;
        write_json(result, &Response { session_id: id.to_string() })
    })
}

/// Select the insurance type of a session; answers reset to the new form's defaults.
/// Expected JSON payload: `{"session_id": "<uuid>", "category_id": "health"}`
///
/// # Safety
/// Pointers must be valid; `payload_json` NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn form_session_select_category(
    payload_json: *const c_char,
    result: *mut *mut c_char,
) -> c_int {
    handle_status_result(|| unsafe {
        #[derive(Deserialize)]
        struct Payload {
            session_id: String,
            category_id: String,
        }

        let p: Payload = parse_payload(payload_json)?;
        let session_id = parse_session_id(&p.session_id)?;
        let controller = globals::get_form_session(session_id)?;
        block_on_async(controller.select_category(&p.category_id))?
            .map_err(|e| with_notices(FFIError::from(e), controller.take_notices()))?;
        write_json(result, &session_response(session_id)?)
    })
}

/// Set one answer.
/// Expected JSON payload:
/// `{"session_id": "<uuid>", "field_id": "email", "value": "a@b.co"}`
/// `value` may be a string, number, bool or null.
///
/// # Safety
/// Pointers must be valid; `payload_json` NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn form_session_set_value(
    payload_json: *const c_char,
    result: *mut *mut c_char,
) -> c_int {
    handle_status_result(|| unsafe {
        #[derive(Deserialize)]
        struct Payload {
            session_id: String,
            field_id: String,
            #[serde(default)]
            value: FieldValue,
        }

        let p: Payload = parse_payload(payload_json)?;
        let session_id = parse_session_id(&p.session_id)?;
        let controller = globals::get_form_session(session_id)?;
        controller.set_value(&p.field_id, p.value)?;
        write_json(result, &session_response(session_id)?)
    })
}

/// Current view of a session.
/// Expected JSON payload: `{"session_id": "<uuid>"}`
///
/// # Safety
/// Pointers must be valid; `payload_json` NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn form_session_view(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: SessionPayload = parse_payload(payload_json)?;
        let session_id = parse_session_id(&p.session_id)?;
        write_json(result, &session_response(session_id)?)
    })
}

/// Validate and submit a session's answers.
/// Expected JSON payload: `{"session_id": "<uuid>"}`
/// Response: `{"outcome": "submitted" | "invalid" | "failed" | "ignored", ...}`
///
/// # Safety
/// Pointers must be valid; `payload_json` NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn form_session_submit(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        #[derive(Serialize)]
        #[serde(tag = "outcome", rename_all = "snake_case")]
        enum Outcome {
            Submitted { application: Application },
            Invalid { failures: Vec<FieldFailure> },
            Failed { error: String },
            Ignored,
        }

        #[derive(Serialize)]
        struct Response {
            #[serde(flatten)]
            outcome: Outcome,
            #[serde(flatten)]
            session: SessionResponse,
        }

        let p: SessionPayload = parse_payload(payload_json)?;
        let session_id = parse_session_id(&p.session_id)?;
        let controller = globals::get_form_session(session_id)?;

        let outcome = match block_on_async(controller.submit())?.map_err(FFIError::from)? {
            SubmitOutcome::Submitted(application) => Outcome::Submitted { application },
            SubmitOutcome::Invalid(report) => Outcome::Invalid { failures: report.failures },
            SubmitOutcome::Failed(e) => Outcome::Failed { error: e.to_string() },
            SubmitOutcome::Ignored => Outcome::Ignored,
        };

        let response = Response {
            outcome,
            session: session_response(session_id)?,
        };
        write_json(result, &response)
    })
}

/// Close a session.
/// Expected JSON payload: `{"session_id": "<uuid>"}`
///
/// # Safety
/// `payload_json` must be a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn form_session_close(payload_json: *const c_char) -> c_int {
    handle_status_result(|| unsafe {
        let p: SessionPayload = parse_payload(payload_json)?;
        let session_id = parse_session_id(&p.session_id)?;
        globals::close_form_session(session_id)?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::test_support::{call, init, take};
    use serde_json::json;
    use std::ffi::CString;
    use std::ptr;

    fn open_session() -> String {
        init();
        let mut out: *mut c_char = ptr::null_mut();
        assert_eq!(unsafe { form_session_create(&mut out) }, ErrorCode::Success as c_int);
        let created = unsafe { take(out) }.unwrap();
        created["session_id"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_category_list() {
        init();
        let mut out: *mut c_char = ptr::null_mut();
        assert_eq!(unsafe { insurance_type_list(&mut out) }, 0);
        let list = unsafe { take(out) }.unwrap();
        assert_eq!(list.as_array().unwrap().len(), 5);
        assert_eq!(list[0], json!({"id": "health", "name": "Health Insurance"}));
    }

    #[test]
    fn test_schema_wire_shape() {
        init();
        let (code, schema) = call(form_schema_get, json!({"category_id": "home"}));
        assert_eq!(code, 0);
        let schema = schema.unwrap();
        assert_eq!(schema["title"], "Home Insurance Application");

        let details = &schema["fields"][7];
        assert_eq!(details["id"], "securitySystemDetails");
        assert_eq!(details["type"], "textarea");
        assert_eq!(details["condition"], json!({"dependsOn": "hasSecuritySystem", "value": "yes"}));
    }

    #[test]
    fn test_session_flow() {
        let session_id = open_session();

        let (code, answer) = call(
            form_session_select_category,
            json!({"session_id": session_id, "category_id": "travel"}),
        );
        assert_eq!(code, 0);
        assert_eq!(answer.unwrap()["view"]["state"]["state"], "ready");

        let (code, answer) = call(
            form_session_set_value,
            json!({"session_id": session_id, "field_id": "tripDuration", "value": 400}),
        );
        assert_eq!(code, 0);
        let fields = answer.unwrap()["view"]["fields"].clone();
        let trip = fields
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["fieldId"] == "tripDuration")
            .unwrap()
            .clone();
        assert_eq!(trip["error"], "Maximum value is 365");

        let (code, answer) = call(form_session_submit, json!({"session_id": session_id}));
        assert_eq!(code, 0);
        let answer = answer.unwrap();
        assert_eq!(answer["outcome"], "invalid");
        assert!(answer["failures"].as_array().unwrap().len() > 1);

        let (code, _) = call(
            form_session_set_value,
            json!({"session_id": session_id, "field_id": "nope", "value": "x"}),
        );
        assert_eq!(code, ErrorCode::UnknownField as c_int);

        let payload = CString::new(json!({"session_id": session_id}).to_string()).unwrap();
        assert_eq!(unsafe { form_session_close(payload.as_ptr()) }, 0);
        let (code, _) = call(form_session_view, json!({"session_id": session_id}));
        assert_eq!(code, ErrorCode::FormSessionNotFound as c_int);
    }

    #[test]
    fn test_bad_session_ids() {
        init();
        let (code, _) = call(form_session_view, json!({"session_id": "not-a-uuid"}));
        assert_eq!(code, ErrorCode::InvalidUuid as c_int);

        let (code, _) = call(form_session_view, json!({"wrong": true}));
        assert_eq!(code, ErrorCode::InvalidArgument as c_int);
    }
}
