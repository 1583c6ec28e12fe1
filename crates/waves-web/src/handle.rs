//! Handle to an instantiated compute module

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use waves_hal::ProviderError;

use crate::util::describe_js_error;

/// Exports object of an instantiated compute module
///
/// Cloning is cheap: clones refer to the same JS object.
#[derive(Clone, Debug)]
pub struct ModuleHandle {
    exports: js_sys::Object,
}

impl ModuleHandle {
    /// Wrap an exports object
    pub fn new(exports: js_sys::Object) -> Self {
        Self { exports }
    }

    /// Compile and instantiate raw module bytes
    ///
    /// # Returns
    /// * `Ok(ModuleHandle)` - Exports of the new instance
    /// * `Err(ProviderError::InstantiationFailed)` - Compile, link or start error
    pub async fn instantiate_bytes(
        bytes: &[u8],
        imports: &js_sys::Object,
    ) -> Result<Self, ProviderError> {
        let result = JsFuture::from(js_sys::WebAssembly::instantiate_buffer(bytes, imports))
            .await
            .map_err(|e| ProviderError::InstantiationFailed(describe_js_error(&e)))?;

        let instance = js_sys::Reflect::get(&result, &"instance".into())
            .map_err(|e| ProviderError::InstantiationFailed(describe_js_error(&e)))?
            .dyn_into::<js_sys::WebAssembly::Instance>()
            .map_err(|_| {
                ProviderError::InstantiationFailed(String::from(
                    "instantiate() result has no WebAssembly.Instance",
                ))
            })?;

        Ok(Self::new(instance.exports()))
    }

    /// The module's exports object
    pub fn exports(&self) -> &js_sys::Object {
        &self.exports
    }

    /// Names of all exports, in definition order
    pub fn export_names(&self) -> Vec<String> {
        js_sys::Object::keys(&self.exports)
            .iter()
            .filter_map(|key| key.as_string())
            .collect()
    }

    /// Exported function `name`, if present
    pub fn function(&self, name: &str) -> Option<js_sys::Function> {
        js_sys::Reflect::get(&self.exports, &JsValue::from_str(name))
            .ok()
            .and_then(|value| value.dyn_into::<js_sys::Function>().ok())
    }

    /// Whether both handles refer to the same exports object
    pub fn same_as(&self, other: &ModuleHandle) -> bool {
        js_sys::Object::is(&self.exports, &other.exports)
    }
}

impl From<ModuleHandle> for JsValue {
    fn from(handle: ModuleHandle) -> Self {
        handle.exports.into()
    }
}
