// FFI bindings for submitted applications: list, details and document export.

use crate::domains::application::types::Application;
use crate::domains::export::types::{DetailRow, ExportedDocument};
use crate::ffi::error::FFIError;
use crate::ffi::{block_on_async, handle_status_result, parse_payload, with_notices, write_json};
use crate::globals;
use crate::types::Notice;
use serde::{Deserialize, Serialize};
use std::os::raw::{c_char, c_int};

#[derive(Deserialize)]
struct IdPayload {
    id: String,
}

/// List all applications, newest first.
///
/// # Safety
/// `result` must be valid for a pointer write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn application_list(result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let svc = globals::get_application_service()?;
        let applications = block_on_async(svc.list_applications())?.map_err(FFIError::from_service_error)?;
        write_json(result, &applications)
    })
}

/// Fetch one application with its formatted detail rows.
/// Expected JSON payload: `{"id": "app123"}`
///
/// # Safety
/// Pointers must be valid; `payload_json` NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn application_get(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        #[derive(Serialize)]
        struct Response {
            application: Application,
            details: Vec<DetailRow>,
        }

        let p: IdPayload = parse_payload(payload_json)?;
        let svc = globals::get_application_service()?;
        let application = block_on_async(svc.get_application(&p.id))?.map_err(FFIError::from_service_error)?;
        let details = svc.application_details(&application);
        write_json(result, &Response { application, details })
    })
}

/// Write the application document.
/// Expected JSON payload: `{"id": "app123"}`
///
/// On failure the status code describes the error, no result is written and the
/// "Download Failed" notice travels in the error details under `notices`.
///
/// # Safety
/// Pointers must be valid; `payload_json` NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn application_export(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        #[derive(Serialize)]
        struct Response {
            document: ExportedDocument,
            notices: Vec<Notice>,
        }

        let p: IdPayload = parse_payload(payload_json)?;
        let svc = globals::get_application_service()?;
        let document = block_on_async(svc.export_application(&p.id))?
            .map_err(|e| with_notices(FFIError::from_service_error(e), svc.take_notices()))?;
        write_json(result, &Response { document, notices: svc.take_notices() })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::error::ErrorCode;
    use crate::ffi::test_support::{call, init, take};
    use serde_json::json;
    use std::ptr;

    #[test]
    fn test_list_contains_samples() {
        init();
        let mut out: *mut c_char = ptr::null_mut();
        assert_eq!(unsafe { application_list(&mut out) }, 0);
        let list = unsafe { take(out) }.unwrap();
        let ids: Vec<&str> = list
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|app| app["id"].as_str())
            .collect();
        assert!(ids.contains(&"app123"));
        assert!(ids.contains(&"app202"));
    }

    #[test]
    fn test_get_with_details() {
        init();
        let (code, answer) = call(application_get, json!({"id": "app101"}));
        assert_eq!(code, 0);
        let answer = answer.unwrap();
        assert_eq!(answer["application"]["insuranceType"], "Life Insurance");
        assert_eq!(answer["details"][0], json!({"label": "Application ID", "value": "app101"}));

        let (code, answer) = call(application_get, json!({"id": "missing"}));
        assert_eq!(code, ErrorCode::EntityNotFound as c_int);
        assert!(answer.is_none());
    }

    #[test]
    fn test_export_writes_file() {
        init();
        let (code, answer) = call(application_export, json!({"id": "app456"}));
        assert_eq!(code, 0);
        let answer = answer.unwrap();
        assert_eq!(answer["document"]["fileName"], "application-app456.txt");
        assert!(answer["notices"]
            .as_array()
            .unwrap()
            .iter()
            .any(|n| n["title"] == "PDF Downloaded"));

        let path = answer["document"]["path"].as_str().unwrap();
        assert!(std::path::Path::new(path).exists());
    }

    #[test]
    fn test_failed_export_reports_notice_in_error() {
        init();
        let (code, answer) = call(application_export, json!({"id": "missing"}));
        assert_eq!(code, ErrorCode::EntityNotFound as c_int);
        assert!(answer.is_none());

        let mut out: *mut c_char = ptr::null_mut();
        assert_eq!(unsafe { crate::ffi::insurance_last_error(&mut out) }, 0);
        let last = unsafe { take(out) }.unwrap();
        assert_eq!(last["code"], "EntityNotFound");

        let details: serde_json::Value =
            serde_json::from_str(last["details"].as_str().unwrap()).unwrap();
        assert_eq!(details["notices"][0]["title"], "Download Failed");
        assert_eq!(details["notices"][0]["variant"], "destructive");
        assert_eq!(details["cause"]["id"], "missing");

        // the notice was handed over once, not queued for the next export
        let (code, answer) = call(application_export, json!({"id": "app456"}));
        assert_eq!(code, 0);
        let titles: Vec<String> = answer.unwrap()["notices"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["title"].as_str().unwrap().to_string())
            .collect();
        assert!(!titles.contains(&"Download Failed".to_string()));
    }
}
