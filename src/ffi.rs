//! FFI bindings for Better Rest
//!
//! This module provides C-compatible functions for calling the estimator from a
//! mobile host. Strings are null-terminated; returned strings are allocated by
//! the library and must be freed by the caller using `rest_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::Local;

use crate::encoder::EstimateEncoder;
use crate::error::{EstimateError, InputError, ModelError};
use crate::estimator::BedtimeEstimator;
use crate::form::BedtimeForm;
use crate::model::LinearSleepModel;
use crate::types::{CoffeeIntake, EstimateRequest, SleepAmount, WakeTime};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn build_request(
    wake_hour: u32,
    wake_minute: u32,
    sleep_hours: f64,
    coffee_cups: i32,
) -> Result<EstimateRequest, InputError> {
    Ok(EstimateRequest::new(
        WakeTime::new(wake_hour, wake_minute)?,
        SleepAmount::new(sleep_hours)?,
        CoffeeIntake::new(coffee_cups as i64)?,
    ))
}

fn build_form(
    wake_hour: u32,
    wake_minute: u32,
    sleep_hours: f64,
    coffee_cups: i32,
) -> Result<BedtimeForm, InputError> {
    let mut form = BedtimeForm::new();
    form.set_wake(wake_hour, wake_minute)?;
    form.set_sleep_amount(sleep_hours)?;
    form.set_coffee(coffee_cups as i64)?;
    Ok(form)
}

// ============================================================================
// Estimator Handle
// ============================================================================

/// Opaque handle to an estimator, or to the error its model failed to load with
pub struct RestEstimatorHandle {
    estimator: Result<BedtimeEstimator<LinearSleepModel>, ModelError>,
    encoder: EstimateEncoder,
}

impl RestEstimatorHandle {
    fn new(model: Result<LinearSleepModel, ModelError>) -> Self {
        Self {
            estimator: model.map(BedtimeEstimator::new),
            encoder: EstimateEncoder::new(),
        }
    }

    fn into_raw(self) -> *mut RestEstimatorHandle {
        if let Err(e) = &self.estimator {
            set_last_error(&e.to_string());
        }
        Box::into_raw(Box::new(self))
    }
}

/// Create an estimator backed by the bundled model.
///
/// # Safety
/// - Must be freed with `rest_estimator_free`.
/// - If the model fails to load, the handle is still returned and the last
///   error is set; see `rest_estimator_new_from_json`.
#[no_mangle]
pub unsafe extern "C" fn rest_estimator_new_bundled() -> *mut RestEstimatorHandle {
    clear_last_error();
    RestEstimatorHandle::new(LinearSleepModel::bundled()).into_raw()
}

/// Create an estimator from a JSON model artifact.
///
/// # Safety
/// - `model_json` must be a valid null-terminated C string.
/// - Must be freed with `rest_estimator_free`.
/// - Returns NULL only for an invalid string pointer.
/// - If the artifact fails to load, a handle is still returned and the last
///   error is set. `rest_estimate` then fails with that error, and
///   `rest_evaluate_form` returns the fallback outcome with an alert.
#[no_mangle]
pub unsafe extern "C" fn rest_estimator_new_from_json(
    model_json: *const c_char,
) -> *mut RestEstimatorHandle {
    clear_last_error();

    let json_str = match cstr_to_string(model_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid model JSON string pointer");
            return ptr::null_mut();
        }
    };

    RestEstimatorHandle::new(LinearSleepModel::from_json(&json_str)).into_raw()
}

/// Free an estimator.
///
/// # Safety
/// - `estimator` must be a pointer returned by a `rest_estimator_new_*` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn rest_estimator_free(estimator: *mut RestEstimatorHandle) {
    if !estimator.is_null() {
        drop(Box::from_raw(estimator));
    }
}

/// Estimate a bedtime and return the JSON report.
///
/// # Safety
/// - `estimator` must be a valid pointer returned by a `rest_estimator_new_*` function.
/// - Returns a newly allocated string that must be freed with `rest_free_string`.
/// - Returns NULL on error (out-of-range input or model failure); call
///   `rest_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn rest_estimate(
    estimator: *const RestEstimatorHandle,
    wake_hour: u32,
    wake_minute: u32,
    sleep_hours: f64,
    coffee_cups: i32,
) -> *mut c_char {
    clear_last_error();

    if estimator.is_null() {
        set_last_error("Null estimator pointer");
        return ptr::null_mut();
    }

    let handle = &*estimator;

    let request = match build_request(wake_hour, wake_minute, sleep_hours, coffee_cups) {
        Ok(request) => request,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let estimator = match &handle.estimator {
        Ok(estimator) => estimator,
        Err(e) => {
            set_last_error(&EstimateError::ModelFailure(e.to_string()).to_string());
            return ptr::null_mut();
        }
    };

    let estimate = match estimator.estimate(&request) {
        Ok(estimate) => estimate,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match handle
        .encoder
        .encode_to_json(&request, &estimate, estimator.model_info())
    {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Evaluate the form and return what the screen should show as JSON.
///
/// Model failures, including a model that failed to load, do not return NULL:
/// the outcome carries the current local time as the bedtime and an alert with
/// the failure description.
///
/// # Safety
/// - `estimator` must be a valid pointer returned by a `rest_estimator_new_*` function.
/// - Returns a newly allocated string that must be freed with `rest_free_string`.
/// - Returns NULL only for out-of-range input or a null estimator.
#[no_mangle]
pub unsafe extern "C" fn rest_evaluate_form(
    estimator: *const RestEstimatorHandle,
    wake_hour: u32,
    wake_minute: u32,
    sleep_hours: f64,
    coffee_cups: i32,
) -> *mut c_char {
    clear_last_error();

    if estimator.is_null() {
        set_last_error("Null estimator pointer");
        return ptr::null_mut();
    }

    let handle = &*estimator;

    let form = match build_form(wake_hour, wake_minute, sleep_hours, coffee_cups) {
        Ok(form) => form,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let outcome = form.evaluate_loaded(handle.estimator.as_ref(), Local::now().time());

    match serde_json::to_string(&outcome) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Better Rest functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Better Rest function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn rest_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Better Rest call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn rest_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn rest_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
