//! Browser tests for the Waves bootstrapper
//!
//! ```bash
//! wasm-pack test --headless --firefox crates/waves-web
//! ```

use futures::future::join;
use wasm_bindgen::prelude::*;
use wasm_bindgen_test::*;
use waves_boot::{BootError, BootState, Bootstrapper, HostSlot, ModuleProvider, ProviderError};
use waves_web::boot::{attach_kind, boot_error_to_js, error_kind};
use waves_web::{FetchProvider, GlobalSlot, ModuleHandle};

wasm_bindgen_test_configure!(run_in_browser);

/// `(module (func (export "answer") (result i32) i32.const 42))`
const ANSWER_MODULE: &[u8] = &[
    0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // magic + version
    0x01, 0x05, 0x01, 0x60, 0x00, 0x01, 0x7f, // type: () -> i32
    0x03, 0x02, 0x01, 0x00, // function: type 0
    0x07, 0x0a, 0x01, 0x06, b'a', b'n', b's', b'w', b'e', b'r', 0x00, 0x00, // export "answer"
    0x0a, 0x06, 0x01, 0x04, 0x00, 0x41, 0x2a, 0x0b, // code: i32.const 42
];

async fn answer_module() -> ModuleHandle {
    ModuleHandle::instantiate_bytes(ANSWER_MODULE, &js_sys::Object::new())
        .await
        .expect("answer module should instantiate")
}

#[wasm_bindgen_test]
async fn test_instantiate_bytes_exposes_exports() {
    let handle = answer_module().await;
    assert_eq!(handle.export_names(), vec![String::from("answer")]);

    let answer = handle.function("answer").expect("answer export");
    let result = answer.call0(&JsValue::NULL).unwrap();
    assert_eq!(result.as_f64(), Some(42.0));
    assert!(handle.function("missing").is_none());
}

#[wasm_bindgen_test]
async fn test_instantiate_bytes_rejects_garbage() {
    let result = ModuleHandle::instantiate_bytes(b"not wasm", &js_sys::Object::new()).await;
    assert!(matches!(result, Err(ProviderError::InstantiationFailed(_))));
}

#[wasm_bindgen_test]
async fn test_global_slot_roundtrip_keeps_identity() {
    let slot = GlobalSlot::new("__waves_test_slot");
    assert!(slot.read().is_none());

    let handle = answer_module().await;
    slot.write(&handle).unwrap();

    let first = slot.read().expect("slot populated");
    let second = slot.read().expect("slot populated");
    assert!(first.same_as(&handle));
    assert!(second.same_as(&first));

    let global = js_sys::Reflect::get(&js_sys::global(), &"__waves_test_slot".into()).unwrap();
    assert!(js_sys::Object::is(&global, handle.exports()));
}

#[wasm_bindgen_test]
async fn test_global_slot_on_frozen_target_fails() {
    let target = js_sys::Object::freeze(&js_sys::Object::new());
    let slot = GlobalSlot::on(target, "WASM");

    let handle = answer_module().await;
    assert!(matches!(
        slot.write(&handle),
        Err(ProviderError::PublishFailed(_))
    ));
    assert!(slot.read().is_none());
}

#[wasm_bindgen_test]
async fn test_missing_artifact_fails_without_publishing() {
    let target = js_sys::Object::new();
    let provider = FetchProvider::new("./__waves_missing__.wasm", js_sys::Object::new());
    assert_eq!(provider.module_location(), "./__waves_missing__.wasm");

    let slot = GlobalSlot::on(target.clone(), "WASM");
    let boot = Bootstrapper::new(provider).with_host_slot(slot);

    let err = boot.bootstrap().await.unwrap_err();
    assert!(matches!(
        err.provider_error(),
        Some(ProviderError::ArtifactMissing(_)) | Some(ProviderError::FetchFailed(_))
    ));
    assert_eq!(boot.state(), BootState::Failed);
    assert!(boot.handle().is_none());
    assert_eq!(boot.ready().await.unwrap_err(), &err);
    assert!(GlobalSlot::on(target, "WASM").read().is_none());

    assert_eq!(
        boot.bootstrap().await.unwrap_err(),
        BootError::AlreadyStarted(BootState::Failed)
    );
}

#[wasm_bindgen_test]
fn test_provider_clock_is_monotonic() {
    let provider = FetchProvider::from_build_config();
    let first = provider.now_nanos();
    let second = provider.now_nanos();
    assert!(second >= first);
}

fn kind_of(value: &JsValue) -> Option<String> {
    js_sys::Reflect::get(value, &"kind".into())
        .ok()
        .and_then(|kind| kind.as_string())
}

fn message_of(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|err| String::from(err.message()))
        .unwrap_or_default()
}

#[wasm_bindgen_test]
fn test_boot_error_carries_kind() {
    let err = BootError::InitializationFailure(ProviderError::ArtifactMissing(
        "./wasm/waves_bg.wasm (HTTP 404)".to_string(),
    ));
    assert_eq!(error_kind(&err), "artifact_missing");

    let js = boot_error_to_js(&err);
    assert!(js.is_instance_of::<js_sys::Error>());
    assert_eq!(kind_of(&js).as_deref(), Some("artifact_missing"));
    assert_eq!(message_of(&js), err.to_string());

    let started = boot_error_to_js(&BootError::AlreadyStarted(BootState::Pending));
    assert_eq!(kind_of(&started).as_deref(), Some("already_started"));
}

#[wasm_bindgen_test]
fn test_kind_falls_back_to_message_on_frozen_error() {
    let frozen = js_sys::Object::freeze(&js_sys::Error::new("module fetch failed").into());

    let tagged = attach_kind(frozen.into(), "fetch_failed", "module fetch failed");
    assert!(tagged.is_instance_of::<js_sys::Error>());
    assert_eq!(message_of(&tagged), "[fetch_failed] module fetch failed");
}

#[wasm_bindgen_test]
fn test_kind_falls_back_on_non_object_target() {
    let tagged = attach_kind(JsValue::from_str("oops"), "not_supported", "no window");
    assert_eq!(message_of(&tagged), "[not_supported] no window");
}

/// Drives the page singleton; the only test that touches it
#[wasm_bindgen_test]
async fn test_page_bootstrap_failure_rejects_module_ready() {
    assert_eq!(waves_web::boot_state(), "not_started");
    assert!(waves_web::configure_imports(js_sys::Object::new()).is_ok());
    assert!(waves_web::module_handle().is_undefined());

    // The test server has no artifact at the build-time module path
    let (parked, result) = join(waves_web::module_ready(), waves_web::bootstrap()).await;
    let err = result.unwrap_err();
    let kind = kind_of(&err).expect("bootstrap error has a kind");
    assert!(kind == "artifact_missing" || kind == "fetch_failed", "kind: {}", kind);
    assert_eq!(kind_of(&parked.unwrap_err()).as_deref(), Some(kind.as_str()));

    let later = waves_web::module_ready().await.unwrap_err();
    assert_eq!(kind_of(&later).as_deref(), Some(kind.as_str()));
    assert_eq!(waves_web::boot_state(), "failed");

    let refused = waves_web::configure_imports(js_sys::Object::new()).unwrap_err();
    assert_eq!(kind_of(&refused).as_deref(), Some("already_started"));

    let repeat = waves_web::bootstrap().await.unwrap_err();
    assert_eq!(kind_of(&repeat).as_deref(), Some("already_started"));

    let status = waves_web::status();
    assert_eq!(status.state, "failed");
    assert!(status.exports.is_empty());
    assert!(status.latency_ms.is_some());
}
