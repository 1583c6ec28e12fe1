//! Module bootstrap protocol
//!
//! A [`Bootstrapper`] owns one module provider and one publication cell.
//! Its [`bootstrap`](Bootstrapper::bootstrap) operation runs at most once:
//! the first call claims the `NotStarted → Pending` transition, every later
//! call is rejected with [`BootError::AlreadyStarted`] without reaching the
//! provider.
//!
//! ## Publication Order
//!
//! On success the handle is written to the host slot first (when one is
//! configured), then to the cell, then the state becomes `Published`. A
//! reader that observes `Published` therefore always finds the cell
//! populated. A host slot refusal fails the attempt before any handle is
//! stored.
//!
//! ## Failure
//!
//! A failed attempt closes the cell with its [`BootError`]: `handle()` stays
//! `None`, and every pending or later `ready()` resolves to the error.
//!
//! ## Cancellation
//!
//! Not supported. Dropping the `bootstrap()` future mid-flight leaves the
//! state `Pending` and the cell unsettled for the rest of the process.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use waves_hal::{HostSlot, ModuleProvider, ProviderError};

use crate::cell::{PublishedCell, PublishedReader, Ready};
use crate::error::BootError;
use crate::state::BootState;

/// Sentinel stored in `latency_nanos` until the attempt settles
const LATENCY_UNSET: u64 = u64::MAX;

/// Single-invocation bootstrapper for a binary module
pub struct Bootstrapper<P: ModuleProvider> {
    provider: P,
    /// Publication target; only this bootstrapper settles it
    cell: Arc<PublishedCell<P::Handle, BootError>>,
    /// Optional mirror into the host's global namespace
    host_slot: Option<Box<dyn HostSlot<P::Handle>>>,
    /// Current [`BootState`] as `u8`
    state: AtomicU8,
    /// Time from instantiate request to settlement
    latency_nanos: AtomicU64,
}

impl<P: ModuleProvider> Bootstrapper<P> {
    /// Create a bootstrapper publishing into a fresh cell
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cell: Arc::new(PublishedCell::new()),
            host_slot: None,
            state: AtomicU8::new(BootState::NotStarted as u8),
            latency_nanos: AtomicU64::new(LATENCY_UNSET),
        }
    }

    /// Mirror the published handle into a host slot
    pub fn with_host_slot(mut self, slot: impl HostSlot<P::Handle> + 'static) -> Self {
        self.host_slot = Some(Box::new(slot));
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> BootState {
        BootState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// The module provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Name of the configured host slot, if any
    pub fn host_slot_name(&self) -> Option<&str> {
        self.host_slot.as_ref().map(|slot| slot.name())
    }

    /// Non-blocking read of the published handle
    pub fn handle(&self) -> Option<&P::Handle> {
        self.cell.get()
    }

    /// Future resolving once the attempt settles
    ///
    /// Yields the handle on success and the bootstrap error on failure.
    pub fn ready(&self) -> Ready<'_, P::Handle, BootError> {
        self.cell.ready()
    }

    /// Read-only view of the publication cell, for injection into consumers
    pub fn reader(&self) -> PublishedReader<P::Handle, BootError> {
        PublishedReader::new(Arc::clone(&self.cell))
    }

    /// Instantiation latency in nanoseconds, once the attempt has settled
    pub fn latency_nanos(&self) -> Option<u64> {
        match self.latency_nanos.load(Ordering::Acquire) {
            LATENCY_UNSET => None,
            nanos => Some(nanos),
        }
    }

    /// Instantiate the module and publish its handle
    ///
    /// # Returns
    /// * `Ok(handle)` - Module published; the cell now holds `handle`
    /// * `Err(BootError::InitializationFailure)` - Provider or host slot failed; the cell is closed
    /// * `Err(BootError::AlreadyStarted)` - Not the first call; provider untouched
    pub async fn bootstrap(&self) -> Result<P::Handle, BootError> {
        if let Err(current) = self.state.compare_exchange(
            BootState::NotStarted as u8,
            BootState::Pending as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            let state = BootState::from_u8(current);
            self.provider.debug_write(&format!(
                "[waves-boot] bootstrap() rejected - already {}",
                state
            ));
            return Err(BootError::AlreadyStarted(state));
        }

        self.provider.debug_write(&format!(
            "[waves-boot] Instantiating module from {}",
            self.provider.module_location()
        ));

        let started = self.provider.now_nanos();
        let result = self.provider.instantiate().await;
        let elapsed = self.provider.now_nanos().saturating_sub(started);
        self.latency_nanos.store(elapsed, Ordering::Release);

        match result {
            Ok(handle) => self.publish(handle, elapsed),
            Err(err) => {
                self.provider.debug_write(&format!(
                    "[waves-boot] Module initialization failed after {} ms: {}",
                    elapsed / 1_000_000,
                    err
                ));
                Err(self.fail(BootError::InitializationFailure(err)))
            }
        }
    }

    fn publish(&self, handle: P::Handle, elapsed: u64) -> Result<P::Handle, BootError> {
        if let Some(slot) = &self.host_slot {
            if let Err(err) = slot.write(&handle) {
                self.provider.debug_write(&format!(
                    "[waves-boot] Host slot '{}' refused module handle: {}",
                    slot.name(),
                    err
                ));
                return Err(self.fail(BootError::InitializationFailure(err)));
            }
        }

        // The cell is private and settled only past the guard, so this
        // cannot fail short of a broken guard
        if self.cell.set(handle.clone()).is_err() {
            self.transition(BootState::Failed);
            return Err(BootError::InitializationFailure(ProviderError::PublishFailed(
                "publication cell already settled".into(),
            )));
        }

        self.transition(BootState::Published);
        self.provider.debug_write(&format!(
            "[waves-boot] Module published in {} ms",
            elapsed / 1_000_000
        ));
        Ok(handle)
    }

    /// Close the cell with `err` and enter `Failed`
    fn fail(&self, err: BootError) -> BootError {
        // Ignored: an already settled cell keeps its outcome
        let _ = self.cell.close(err.clone());
        self.transition(BootState::Failed);
        err
    }

    fn transition(&self, next: BootState) {
        debug_assert!(next.is_terminal());
        self.state.store(next as u8, Ordering::Release);
    }
}
