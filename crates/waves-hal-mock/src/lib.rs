//! Mock collaborators for testing the Waves bootstrapper
//!
//! Provides a [`MockProvider`] whose instantiation resolves or rejects on
//! demand, and a [`MockSlot`] standing in for the host's global namespace,
//! so the bootstrap protocol can be exercised without a browser.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use futures::channel::oneshot;
use waves_hal::{HostSlot, ModuleProvider, ProviderError};

/// Location reported by every mock provider
pub const MOCK_MODULE_LOCATION: &str = "mock://waves_bg.wasm";

/// How the pending instantiation will settle
enum Outcome<H> {
    /// Settles on first poll
    Immediate(Result<H, ProviderError>),
    /// Settles when the paired [`Settle`] is used
    Deferred(oneshot::Receiver<Result<H, ProviderError>>),
}

/// Mock module provider
///
/// Records every `instantiate()` call, captures debug output and keeps a
/// simulated clock that advances by the configured latency when the
/// instantiation settles.
pub struct MockProvider<H> {
    outcome: RefCell<Option<Outcome<H>>>,
    /// Number of `instantiate()` calls observed
    calls: AtomicUsize,
    /// Simulated time in nanoseconds
    time: AtomicU64,
    /// Simulated instantiation latency in nanoseconds
    latency: AtomicU64,
    /// Captured debug messages
    debug_log: RefCell<Vec<String>>,
}

/// Settles a deferred [`MockProvider`]
pub struct Settle<H> {
    sender: oneshot::Sender<Result<H, ProviderError>>,
}

impl<H> Settle<H> {
    /// Resolve the pending instantiation with `handle`
    pub fn resolve(self, handle: H) {
        let _ = self.sender.send(Ok(handle));
    }

    /// Reject the pending instantiation with `error`
    pub fn reject(self, error: ProviderError) {
        let _ = self.sender.send(Err(error));
    }
}

impl<H> MockProvider<H> {
    fn with_outcome(outcome: Outcome<H>) -> Self {
        Self {
            outcome: RefCell::new(Some(outcome)),
            calls: AtomicUsize::new(0),
            time: AtomicU64::new(0),
            latency: AtomicU64::new(0),
            debug_log: RefCell::new(Vec::new()),
        }
    }

    /// Provider that resolves with `handle` as soon as it is polled
    pub fn resolving(handle: H) -> Self {
        Self::with_outcome(Outcome::Immediate(Ok(handle)))
    }

    /// Provider that rejects with `error` as soon as it is polled
    pub fn rejecting(error: ProviderError) -> Self {
        Self::with_outcome(Outcome::Immediate(Err(error)))
    }

    /// Provider that stays pending until the returned [`Settle`] is used
    ///
    /// Dropping the `Settle` without using it rejects with `FetchFailed`.
    pub fn deferred() -> (Self, Settle<H>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self::with_outcome(Outcome::Deferred(receiver)),
            Settle { sender },
        )
    }

    /// Simulated latency applied to the clock when instantiation settles
    pub fn with_latency(self, nanos: u64) -> Self {
        self.latency.store(nanos, Ordering::SeqCst);
        self
    }

    /// Number of times `instantiate()` has been called
    pub fn instantiate_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Advance the simulated clock
    pub fn advance_time(&self, nanos: u64) {
        self.time.fetch_add(nanos, Ordering::SeqCst);
    }

    /// Get all captured debug messages
    pub fn get_debug_log(&self) -> Vec<String> {
        self.debug_log.borrow().clone()
    }

    /// Check if a specific message was logged
    pub fn has_log_containing(&self, substr: &str) -> bool {
        self.debug_log
            .borrow()
            .iter()
            .any(|msg| msg.contains(substr))
    }
}

impl<H: Clone> ModuleProvider for MockProvider<H> {
    type Handle = H;

    async fn instantiate(&self) -> Result<H, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.outcome.borrow_mut().take();

        let result = match outcome {
            Some(Outcome::Immediate(result)) => result,
            Some(Outcome::Deferred(receiver)) => match receiver.await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::FetchFailed(String::from(
                    "mock provider dropped before settling",
                ))),
            },
            None => Err(ProviderError::FetchFailed(String::from(
                "mock provider already consumed",
            ))),
        };

        self.advance_time(self.latency.load(Ordering::SeqCst));
        result
    }

    fn module_location(&self) -> &str {
        MOCK_MODULE_LOCATION
    }

    fn now_nanos(&self) -> u64 {
        self.time.load(Ordering::SeqCst)
    }

    fn debug_write(&self, msg: &str) {
        self.debug_log.borrow_mut().push(String::from(msg));
    }
}

struct SlotState<H> {
    value: Option<H>,
    writes: usize,
    refuse: Option<String>,
}

/// Mock host slot
///
/// Clones share the same underlying slot, so a test can hand one clone to the
/// bootstrapper and inspect the other.
pub struct MockSlot<H> {
    name: String,
    state: Rc<RefCell<SlotState<H>>>,
    reads: Rc<Cell<usize>>,
}

impl<H> MockSlot<H> {
    /// Create an empty slot named `name`
    pub fn new(name: &str) -> Self {
        Self {
            name: String::from(name),
            state: Rc::new(RefCell::new(SlotState {
                value: None,
                writes: 0,
                refuse: None,
            })),
            reads: Rc::new(Cell::new(0)),
        }
    }

    /// Make every subsequent write fail with `PublishFailed(reason)`
    pub fn refuse_writes(&self, reason: &str) {
        self.state.borrow_mut().refuse = Some(String::from(reason));
    }

    /// Number of successful writes
    pub fn write_count(&self) -> usize {
        self.state.borrow().writes
    }

    /// Number of reads
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    /// Whether the slot currently holds a value
    pub fn is_populated(&self) -> bool {
        self.state.borrow().value.is_some()
    }
}

impl<H> Clone for MockSlot<H> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            state: Rc::clone(&self.state),
            reads: Rc::clone(&self.reads),
        }
    }
}

impl<H: Clone> HostSlot<H> for MockSlot<H> {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, handle: &H) -> Result<(), ProviderError> {
        let mut state = self.state.borrow_mut();
        if let Some(reason) = &state.refuse {
            return Err(ProviderError::PublishFailed(reason.clone()));
        }
        state.value = Some(handle.clone());
        state.writes += 1;
        Ok(())
    }

    fn read(&self) -> Option<H> {
        self.reads.set(self.reads.get() + 1);
        self.state.borrow().value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_resolving_provider_settles_once() {
        let provider = MockProvider::resolving(7u32).with_latency(1_000);
        assert_eq!(block_on(provider.instantiate()), Ok(7));
        assert_eq!(provider.instantiate_calls(), 1);
        assert_eq!(provider.now_nanos(), 1_000);

        // Outcome is consumed by the first call
        assert!(block_on(provider.instantiate()).is_err());
        assert_eq!(provider.instantiate_calls(), 2);
    }

    #[test]
    fn test_deferred_provider_dropped_settle() {
        let (provider, settle) = MockProvider::<u32>::deferred();
        drop(settle);
        assert!(matches!(
            block_on(provider.instantiate()),
            Err(ProviderError::FetchFailed(_))
        ));
    }

    #[test]
    fn test_slot_clones_share_state() {
        let slot = MockSlot::new("WASM");
        let observer = slot.clone();

        assert_eq!(observer.read(), None);
        slot.write(&3u8).unwrap();
        assert_eq!(observer.read(), Some(3));
        assert_eq!(observer.write_count(), 1);
        assert_eq!(observer.read_count(), 2);
    }

    #[test]
    fn test_slot_refuses_writes() {
        let slot = MockSlot::<u8>::new("WASM");
        slot.refuse_writes("namespace frozen");
        assert_eq!(
            slot.write(&1),
            Err(ProviderError::PublishFailed(String::from("namespace frozen")))
        );
        assert!(!slot.is_populated());
    }
}
