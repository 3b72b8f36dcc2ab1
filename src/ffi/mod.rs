//! C ABI for the host app. Every call takes a JSON payload, writes a JSON result
//! through an out-pointer and returns an [`ErrorCode`] as `c_int`.
//!
//! Strings returned through `result` are owned by the caller and must be released
//! with [`insurance_free`] exactly once.

use crate::config::PortalConfig;
use crate::ffi::error::{ErrorCode, FFIError};
use crate::globals;
use crate::types::Notice;
use lazy_static::lazy_static;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::{CStr, CString};
use std::future::Future;
use std::os::raw::{c_char, c_int};
use tokio::runtime::{Builder, Runtime};

pub mod application;
pub mod error;
pub mod form;

pub use error::FFIResult;

lazy_static! {
    static ref RUNTIME: Result<Runtime, String> = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| e.to_string());
}

/// Error handling helper for FFI boundaries (returns error code)
pub fn handle_status_result<F>(func: F) -> c_int
where
    F: FnOnce() -> FFIResult<()>,
{
    match func() {
        Ok(_) => ErrorCode::Success as c_int,
        Err(e) => {
            log::error!(
                "[FFI] Code: {:?}, Message: {}, Details: {}",
                e.code,
                e.message,
                e.details.as_deref().unwrap_or("None")
            );
            error::set_last_error(&e);
            e.code as c_int
        }
    }
}

/// Run an async service call to completion on the shared runtime.
pub(crate) fn block_on_async<F: Future>(future: F) -> FFIResult<F::Output> {
    let runtime = RUNTIME
        .as_ref()
        .map_err(|e| FFIError::internal(format!("failed to start async runtime: {}", e)))?;
    Ok(runtime.block_on(future))
}

/// Ensure pointer is not null
macro_rules! ensure_ptr {
    ($ptr:expr) => {
        if $ptr.is_null() {
            return Err($crate::ffi::error::FFIError::new(
                $crate::ffi::error::ErrorCode::NullPointer,
                "null pointer",
            ));
        }
    };
}

/// Decode a JSON payload from a C string.
///
/// # Safety
/// `payload_json` must be null or point to a NUL-terminated string.
pub(crate) unsafe fn parse_payload<T: DeserializeOwned>(payload_json: *const c_char) -> FFIResult<T> {
    ensure_ptr!(payload_json);
    let json = unsafe { CStr::from_ptr(payload_json) }
        .to_str()
        .map_err(|_| FFIError::new(ErrorCode::InvalidUtf8, "payload is not valid UTF-8"))?;
    serde_json::from_str(json).map_err(|e| FFIError::invalid_argument(&format!("json {e}")))
}

/// Serialize `value` and hand it to the caller through `result`.
///
/// # Safety
/// `result` must be null or valid for a pointer write.
pub(crate) unsafe fn write_json<T: Serialize>(result: *mut *mut c_char, value: &T) -> FFIResult<()> {
    ensure_ptr!(result);
    let json = serde_json::to_string(value).map_err(|e| FFIError::internal(format!("ser {e}")))?;
    let cstr = CString::new(json)?;
    unsafe {
        *result = cstr.into_raw();
    }
    Ok(())
}

/// Attach notices raised by a failed call to its error so the host can show them
/// right away. Earlier details move under `cause`.
pub(crate) fn with_notices(mut err: FFIError, notices: Vec<Notice>) -> FFIError {
    if notices.is_empty() {
        return err;
    }
    let cause = err
        .details
        .as_deref()
        .and_then(|details| serde_json::from_str::<serde_json::Value>(details).ok());
    err.details = Some(serde_json::json!({ "notices": notices, "cause": cause }).to_string());
    err
}

/// Initialize the library. `config_json` may be null, in which case settings come
/// from the environment (and a `.env` file, if present).
///
/// # Safety
/// `config_json` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn insurance_initialize(config_json: *const c_char) -> c_int {
    handle_status_result(|| unsafe {
        let config = if config_json.is_null() {
            PortalConfig::from_env()?
        } else {
            parse_payload::<PortalConfig>(config_json)?
        };
        crate::initialize(config)
    })
}

/// Release a string returned by any function of this library.
///
/// # Safety
/// `ptr` must come from this library and must not be freed twice.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn insurance_free(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}

/// Error of the latest failed call on this thread as
/// `{"code": "...", "message": "...", "details": "<json>" | null}`, or `null`.
/// Reading it clears it.
///
/// # Safety
/// `result` must be valid for a pointer write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn insurance_last_error(result: *mut *mut c_char) -> c_int {
    let last = error::take_last_error();
    handle_status_result(|| unsafe { write_json(result, &last) })
}

/// Current configuration as JSON.
///
/// # Safety
/// `result` must be valid for a pointer write.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn insurance_config_get(result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let config = globals::get_config()?;
        write_json(result, &config)
    })
}
