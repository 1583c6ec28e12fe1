//! Collaborator contracts for the Waves module bootstrapper
//!
//! The bootstrapper never fetches or instantiates anything itself. It drives
//! two external collaborators through the traits defined here:
//!
//! - [`ModuleProvider`]: locates, fetches and instantiates the precompiled
//!   binary module, settling once with a handle or an error
//! - [`HostSlot`]: the host environment's named, globally reachable location
//!   that arbitrary page code reads the handle from
//!
//! # Platform Implementations
//!
//! - **Browser**: `fetch()` + `WebAssembly.instantiate()`, slot on `globalThis` (`waves-web`)
//! - **Tests**: deterministic resolve/reject on demand (`waves-hal-mock`)

#![no_std]

extern crate alloc;

use alloc::string::String;
use core::fmt;
use core::future::Future;

/// Binary module provider
///
/// Implementations own the module location (a build-resolved constant), the
/// fetch mechanics and the artifact format. The bootstrapper only consumes
/// the settled result of [`ModuleProvider::instantiate`].
///
/// # Associated Types
///
/// - `Handle`: opaque capability returned by a successful instantiation
///   - In the browser: the `WebAssembly.Instance` and its exports object
///   - In tests: any cloneable marker value
pub trait ModuleProvider {
    /// Capability produced by a successful instantiation
    type Handle: Clone;

    /// Instantiate the binary module
    ///
    /// Called at most once per bootstrapper. The returned future is the
    /// single suspension point of the bootstrap flow.
    ///
    /// # Returns
    /// * `Ok(Handle)` - Module instantiated and ready for use
    /// * `Err(ProviderError::ArtifactMissing)` - No artifact at the module location
    /// * `Err(ProviderError::FetchFailed)` - Transport failure while fetching
    /// * `Err(ProviderError::InstantiationFailed)` - Artifact rejected by the runtime
    /// * `Err(ProviderError::NotSupported)` - Host cannot run binary modules
    fn instantiate(&self) -> impl Future<Output = Result<Self::Handle, ProviderError>>;

    /// Location of the module artifact, for diagnostics
    fn module_location(&self) -> &str;

    // === Time & Debug ===

    /// Monotonic time in nanoseconds
    ///
    /// In the browser: `performance.now()` converted to nanoseconds
    fn now_nanos(&self) -> u64;

    /// Write a debug message to the platform's console/log
    ///
    /// In the browser: `console.log()`
    fn debug_write(&self, msg: &str);
}

/// Process-wide named slot in the host environment
///
/// Written exactly once by the bootstrapper after the provider settles
/// successfully, read any number of times by page code.
pub trait HostSlot<H> {
    /// Name of the slot in the host namespace (e.g. `WASM` for `globalThis.WASM`)
    fn name(&self) -> &str;

    /// Store the handle in the slot
    ///
    /// # Returns
    /// * `Ok(())` - Slot now holds the handle
    /// * `Err(ProviderError::PublishFailed)` - Host refused the assignment
    fn write(&self, handle: &H) -> Result<(), ProviderError>;

    /// Current slot contents, `None` while unpopulated
    fn read(&self) -> Option<H>;
}

/// Collaborator errors
///
/// The `String` payload carries whatever detail the host reported (an HTTP
/// status, a JS exception message) and is only used for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderError {
    /// No artifact exists at the module location
    ArtifactMissing(String),
    /// Fetching the artifact failed (network error, non-success status)
    FetchFailed(String),
    /// The runtime rejected the artifact (compile or link error)
    InstantiationFailed(String),
    /// The host slot could not be written
    PublishFailed(String),
    /// The host environment cannot load binary modules
    NotSupported,
}

impl ProviderError {
    /// Short, stable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::ArtifactMissing(_) => "artifact_missing",
            ProviderError::FetchFailed(_) => "fetch_failed",
            ProviderError::InstantiationFailed(_) => "instantiation_failed",
            ProviderError::PublishFailed(_) => "publish_failed",
            ProviderError::NotSupported => "not_supported",
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::ArtifactMissing(detail) => write!(f, "module artifact missing: {}", detail),
            ProviderError::FetchFailed(detail) => write!(f, "module fetch failed: {}", detail),
            ProviderError::InstantiationFailed(detail) => {
                write!(f, "module instantiation failed: {}", detail)
            }
            ProviderError::PublishFailed(detail) => write!(f, "host slot write failed: {}", detail),
            ProviderError::NotSupported => f.write_str("binary modules not supported by host"),
        }
    }
}

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "std")]
impl std::error::Error for ProviderError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_display_includes_detail() {
        let err = ProviderError::ArtifactMissing("./wasm/waves_bg.wasm (404)".to_string());
        assert_eq!(
            err.to_string(),
            "module artifact missing: ./wasm/waves_bg.wasm (404)"
        );
    }

    #[test]
    fn test_kind_is_stable() {
        assert_eq!(ProviderError::NotSupported.kind(), "not_supported");
        assert_eq!(
            ProviderError::InstantiationFailed("bad magic".to_string()).kind(),
            "instantiation_failed"
        );
        assert_eq!(
            ProviderError::PublishFailed("frozen".to_string()).kind(),
            "publish_failed"
        );
    }
}
