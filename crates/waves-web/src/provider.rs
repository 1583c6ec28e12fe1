//! Fetch-based module provider
//!
//! Loads the compute module the way a browser page does:
//!
//! 1. `window.fetch(path)` for the artifact
//! 2. `response.arrayBuffer()` for its bytes
//! 3. `WebAssembly.instantiate(bytes, imports)` for the instance
//!
//! Each step maps its failure onto a distinct `ProviderError` variant so the
//! page can tell a missing artifact from a broken one.

use std::cell::RefCell;

use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use waves_hal::{ModuleProvider, ProviderError};
use web_sys::Response;

use crate::constants::{HTTP_NOT_FOUND, MODULE_PATH};
use crate::handle::ModuleHandle;
use crate::util::{describe_js_error, log};

/// Module provider backed by `fetch()` and `WebAssembly.instantiate()`
pub struct FetchProvider {
    /// Artifact URL, relative to the page
    path: String,
    /// Import object handed to the module at instantiation
    imports: RefCell<js_sys::Object>,
}

impl FetchProvider {
    /// Provider for an explicit artifact path
    pub fn new(path: &str, imports: js_sys::Object) -> Self {
        Self {
            path: String::from(path),
            imports: RefCell::new(imports),
        }
    }

    /// Provider for the build-time [`MODULE_PATH`] with an empty import object
    pub fn from_build_config() -> Self {
        Self::new(MODULE_PATH, js_sys::Object::new())
    }

    /// Replace the import object used by the next instantiation
    pub fn set_imports(&self, imports: js_sys::Object) {
        *self.imports.borrow_mut() = imports;
    }

    /// Import object the next instantiation will use
    pub fn imports(&self) -> js_sys::Object {
        self.imports.borrow().clone()
    }

    async fn fetch_bytes(&self) -> Result<Vec<u8>, ProviderError> {
        let window = web_sys::window().ok_or(ProviderError::NotSupported)?;

        let response = JsFuture::from(window.fetch_with_str(&self.path))
            .await
            .map_err(|e| ProviderError::FetchFailed(describe_js_error(&e)))?
            .dyn_into::<Response>()
            .map_err(|_| ProviderError::FetchFailed(String::from("fetch() did not yield a Response")))?;

        if response.status() == HTTP_NOT_FOUND {
            return Err(ProviderError::ArtifactMissing(format!(
                "{} (HTTP {})",
                self.path,
                response.status()
            )));
        }
        if !response.ok() {
            return Err(ProviderError::FetchFailed(format!(
                "{} (HTTP {} {})",
                self.path,
                response.status(),
                response.status_text()
            )));
        }

        let buffer = response
            .array_buffer()
            .map_err(|e| ProviderError::FetchFailed(describe_js_error(&e)))?;
        let buffer = JsFuture::from(buffer)
            .await
            .map_err(|e| ProviderError::FetchFailed(describe_js_error(&e)))?;

        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }
}

impl ModuleProvider for FetchProvider {
    type Handle = ModuleHandle;

    async fn instantiate(&self) -> Result<ModuleHandle, ProviderError> {
        let bytes = self.fetch_bytes().await?;
        self.debug_write(&format!(
            "[waves-web] Fetched {} ({} bytes)",
            self.path,
            bytes.len()
        ));
        let imports = self.imports();
        ModuleHandle::instantiate_bytes(&bytes, &imports).await
    }

    fn module_location(&self) -> &str {
        &self.path
    }

    fn now_nanos(&self) -> u64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| (p.now() * 1_000_000.0) as u64)
            .unwrap_or(0)
    }

    fn debug_write(&self, msg: &str) {
        log(msg);
    }
}
