//! Page-wide bootstrapper
//!
//! One [`Bootstrapper`] per page, created on first use and shared by every
//! export, so the guard inside it rejects repeated `bootstrap()` calls. It
//! exists before `bootstrap()` runs, which lets [`module_ready`] be awaited
//! and [`configure_imports`] be called ahead of time.
//!
//! ## JS Surface
//!
//! | Export | Result |
//! |--------|--------|
//! | `configure_imports(obj)` | sets the import object; throws `already_started` once bootstrap ran |
//! | `bootstrap()` | `Promise<exports>`; rejects with an `Error` carrying `kind` |
//! | `module_handle()` | exports, or `undefined` before publication |
//! | `module_ready()` | `Promise<exports>`; rejects like `bootstrap()` if it failed |
//! | `boot_state()` | `"not_started"`, `"pending"`, `"published"` or `"failed"` |
//! | `boot_status()` | JSON snapshot ([`BootStatus`]) |

use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::prelude::*;
use waves_boot::{BootError, BootState, Bootstrapper, ModuleProvider};

use crate::constants::GLOBAL_SLOT_NAME;
use crate::handle::ModuleHandle;
use crate::provider::FetchProvider;
use crate::slot::GlobalSlot;

type PageBootstrapper = Bootstrapper<FetchProvider>;

thread_local! {
    /// Page-wide bootstrapper
    static PAGE_BOOTSTRAPPER: Rc<PageBootstrapper> = Rc::new(
        Bootstrapper::new(FetchProvider::from_build_config())
            .with_host_slot(GlobalSlot::from_build_config()),
    );
}

/// Snapshot of the page bootstrapper, serialized for `boot_status()`
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct BootStatus {
    pub state: &'static str,
    pub module_path: String,
    pub global_slot: String,
    pub latency_ms: Option<f64>,
    pub exports: Vec<String>,
}

fn page_bootstrapper() -> Rc<PageBootstrapper> {
    PAGE_BOOTSTRAPPER.with(Rc::clone)
}

/// Value of the `kind` property on errors handed to JS
pub fn error_kind(err: &BootError) -> &'static str {
    match err {
        BootError::InitializationFailure(provider) => provider.kind(),
        BootError::AlreadyStarted(_) => "already_started",
    }
}

/// Tag `target` with a `kind` property
///
/// If the property cannot be set (frozen or non-object target), returns a
/// fresh `Error` whose message carries the kind as a `[kind]` prefix.
pub fn attach_kind(target: JsValue, kind: &str, message: &str) -> JsValue {
    match js_sys::Reflect::set(&target, &"kind".into(), &JsValue::from_str(kind)) {
        Ok(true) => target,
        _ => js_sys::Error::new(&format!("[{}] {}", kind, message)).into(),
    }
}

/// Convert a bootstrap error into a JS `Error` with a `kind` property
pub fn boot_error_to_js(err: &BootError) -> JsValue {
    let message = err.to_string();
    attach_kind(
        js_sys::Error::new(&message).into(),
        error_kind(err),
        &message,
    )
}

/// Set the import object passed to `WebAssembly.instantiate`
///
/// Only allowed before `bootstrap()` is called; afterwards it throws an
/// error with kind `already_started`.
#[wasm_bindgen]
pub fn configure_imports(imports: js_sys::Object) -> Result<(), JsValue> {
    let boot = page_bootstrapper();
    match boot.state() {
        BootState::NotStarted => {
            boot.provider().set_imports(imports);
            Ok(())
        }
        state => Err(boot_error_to_js(&BootError::AlreadyStarted(state))),
    }
}

/// Instantiate the compute module and publish its exports
///
/// Call once at page load. Later calls reject with kind `already_started`
/// and never refetch the module.
#[wasm_bindgen]
pub async fn bootstrap() -> Result<JsValue, JsValue> {
    let boot = page_bootstrapper();
    match boot.bootstrap().await {
        Ok(handle) => Ok(handle.into()),
        Err(err) => Err(boot_error_to_js(&err)),
    }
}

/// Published module exports, or `undefined` before publication
#[wasm_bindgen]
pub fn module_handle() -> JsValue {
    page_bootstrapper()
        .handle()
        .map(|handle| JsValue::from(handle.clone()))
        .unwrap_or(JsValue::UNDEFINED)
}

/// Resolves with the module exports once they are published
///
/// Rejects with the bootstrap error if the attempt failed.
#[wasm_bindgen]
pub async fn module_ready() -> Result<JsValue, JsValue> {
    let boot = page_bootstrapper();
    let outcome = boot.ready().await;
    match outcome {
        Ok(handle) => Ok(handle.clone().into()),
        Err(err) => Err(boot_error_to_js(err)),
    }
}

/// Current bootstrap state name
#[wasm_bindgen]
pub fn boot_state() -> String {
    String::from(page_bootstrapper().state().as_str())
}

/// JSON snapshot of the bootstrapper
#[wasm_bindgen]
pub fn boot_status() -> Result<String, JsValue> {
    serde_json::to_string(&status()).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Snapshot of the page bootstrapper
pub fn status() -> BootStatus {
    let boot = page_bootstrapper();
    BootStatus {
        state: boot.state().as_str(),
        module_path: String::from(boot.provider().module_location()),
        global_slot: String::from(boot.host_slot_name().unwrap_or(GLOBAL_SLOT_NAME)),
        latency_ms: boot
            .latency_nanos()
            .map(|nanos| nanos as f64 / 1_000_000.0),
        exports: boot
            .handle()
            .map(ModuleHandle::export_names)
            .unwrap_or_default(),
    }
}
