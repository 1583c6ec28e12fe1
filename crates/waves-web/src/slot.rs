//! Host namespace slot
//!
//! Mirrors the published module exports onto a named property of
//! `globalThis` (or another target object), so page scripts that never
//! touch Rust can reach the module as `window.WASM`.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use waves_hal::{HostSlot, ProviderError};

use crate::constants::GLOBAL_SLOT_NAME;
use crate::handle::ModuleHandle;
use crate::util::describe_js_error;

/// Named property on a JS object holding the module exports
pub struct GlobalSlot {
    target: js_sys::Object,
    name: String,
}

impl GlobalSlot {
    /// Slot `name` on `globalThis`
    pub fn new(name: &str) -> Self {
        Self::on(js_sys::global(), name)
    }

    /// Slot [`GLOBAL_SLOT_NAME`] on `globalThis`
    pub fn from_build_config() -> Self {
        Self::new(GLOBAL_SLOT_NAME)
    }

    /// Slot `name` on an arbitrary object
    pub fn on(target: js_sys::Object, name: &str) -> Self {
        Self {
            target,
            name: String::from(name),
        }
    }
}

impl HostSlot<ModuleHandle> for GlobalSlot {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, handle: &ModuleHandle) -> Result<(), ProviderError> {
        let key = JsValue::from_str(&self.name);
        match js_sys::Reflect::set(&self.target, &key, handle.exports()) {
            Ok(true) => Ok(()),
            Ok(false) => Err(ProviderError::PublishFailed(format!(
                "property '{}' is not writable",
                self.name
            ))),
            Err(e) => Err(ProviderError::PublishFailed(describe_js_error(&e))),
        }
    }

    fn read(&self) -> Option<ModuleHandle> {
        js_sys::Reflect::get(&self.target, &JsValue::from_str(&self.name))
            .ok()
            .filter(|value| !value.is_undefined() && !value.is_null())
            .and_then(|value| value.dyn_into::<js_sys::Object>().ok())
            .map(ModuleHandle::new)
    }
}
