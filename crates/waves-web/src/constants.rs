//! Build-time configuration
//!
//! Both values are resolved when the crate is compiled. Override them with
//! environment variables at build time:
//!
//! ```bash
//! WAVES_MODULE_PATH=./pkg/sim_bg.wasm WAVES_GLOBAL_SLOT=SIM wasm-pack build crates/waves-web
//! ```

/// URL of the compute module artifact, relative to the host page
pub const MODULE_PATH: &str = match option_env!("WAVES_MODULE_PATH") {
    Some(path) => path,
    None => "./wasm/waves_bg.wasm",
};

/// Property on `globalThis` that receives the module exports
pub const GLOBAL_SLOT_NAME: &str = match option_env!("WAVES_GLOBAL_SLOT") {
    Some(name) => name,
    None => "WASM",
};

/// HTTP status meaning the artifact does not exist
pub const HTTP_NOT_FOUND: u16 = 404;
