//! Browser Bootstrapper for Waves
//!
//! Runs on the page's main thread. Fetches the precompiled compute module,
//! instantiates it, and publishes its exports once as `globalThis.WASM`
//! (name configurable at build time) and in the page bootstrapper's cell.
//!
//! ## Module Structure
//!
//! - `constants` - Build-time configuration (module path, global slot name)
//! - `handle` - `ModuleHandle` wrapping the instantiated module's exports
//! - `provider` - `FetchProvider`, the `fetch()` + `WebAssembly.instantiate()` provider
//! - `slot` - `GlobalSlot`, the host namespace mirror
//! - `boot` - Page singleton and JS-facing exports
//! - `util` - Console logging and JS error helpers
//!
//! ## Page Usage
//!
//! ```js
//! import init, { configure_imports, bootstrap, module_ready } from './pkg/waves_web.js';
//!
//! await init();
//! configure_imports({ env: { now: () => performance.now() } });
//! bootstrap().catch((err) => console.error(err.kind, err.message));
//! const exports = await module_ready();
//! ```

use wasm_bindgen::prelude::*;

pub mod boot;
pub mod constants;
pub mod handle;
pub mod provider;
pub mod slot;
pub(crate) mod util;

pub use boot::{
    boot_state, boot_status, bootstrap, configure_imports, module_handle, module_ready, status,
    BootStatus,
};
pub use handle::ModuleHandle;
pub use provider::FetchProvider;
pub use slot::GlobalSlot;

/// Runs when the bootstrapper's own glue module is initialized
#[wasm_bindgen(start)]
pub fn start() {
    // Set up panic hook for better error messages
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    util::log(&format!(
        "[waves-web] Bootstrapper loaded (module: {}, slot: {})",
        constants::MODULE_PATH,
        constants::GLOBAL_SLOT_NAME
    ));
}
