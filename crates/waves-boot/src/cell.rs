//! Write-once publication cell
//!
//! [`PublishedCell`] replaces an ambient global. It starts empty and settles
//! exactly once, either with a value (published) or with an error (closed),
//! and never changes afterwards. Only this crate can settle it; consumers
//! get a [`PublishedReader`], which can poll with `get` or park on `ready`.

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, Waker};
use std::sync::{Arc, PoisonError};

use crate::sync::{AtomicU8, Mutex, MutexGuard, Ordering, UnsafeCell};

const EMPTY: u8 = 0;
/// A writer has claimed the cell and is storing the outcome
const WRITING: u8 = 1;
const PUBLISHED: u8 = 2;
const CLOSED: u8 = 3;

/// Write-once, read-many cell with a readiness future
///
/// # Invariants
///
/// 1. The cell settles at most once; the outcome is never replaced
/// 2. Any read that happens after settlement observes the outcome
/// 3. Every reader parked in `ready()` before settlement is woken by it
pub struct PublishedCell<T, E = ()> {
    state: AtomicU8,
    /// Written once under `WRITING`, read only after `PUBLISHED`/`CLOSED`
    outcome: UnsafeCell<Option<Result<T, E>>>,
    /// Wakers of readers parked before settlement
    waiters: Mutex<Vec<Waker>>,
}

// SAFETY: the outcome is written by exactly one thread (the one that won the
// EMPTY → WRITING exchange) and shared as `&T`/`&E` only after the Release
// store of the terminal state, matching `OnceLock`'s bounds.
unsafe impl<T: Send + Sync, E: Send + Sync> Sync for PublishedCell<T, E> {}

impl<T, E> PublishedCell<T, E> {
    /// Create an empty cell
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(EMPTY),
            outcome: UnsafeCell::new(None),
            waiters: Mutex::new(Vec::new()),
        }
    }

    /// The settled outcome, or `None` while the cell is empty
    fn outcome(&self) -> Option<&Result<T, E>> {
        match self.state.load(Ordering::Acquire) {
            // SAFETY: the terminal state was stored after the outcome was
            // written, and the outcome is never written again
            PUBLISHED | CLOSED => self.outcome.with(|slot| unsafe { (*slot).as_ref() }),
            _ => None,
        }
    }

    /// The published value, or `None` while empty or closed
    pub fn get(&self) -> Option<&T> {
        self.outcome().and_then(|outcome| outcome.as_ref().ok())
    }

    /// The error the cell was closed with, if any
    pub fn error(&self) -> Option<&E> {
        self.outcome().and_then(|outcome| outcome.as_ref().err())
    }

    /// Whether a value has been published
    pub fn is_published(&self) -> bool {
        self.state.load(Ordering::Acquire) == PUBLISHED
    }

    /// Whether the cell has settled (published or closed)
    pub fn is_settled(&self) -> bool {
        self.outcome().is_some()
    }

    /// Publish `value`
    ///
    /// Returns the value back in `Err` if the cell has already settled.
    pub(crate) fn set(&self, value: T) -> Result<(), T> {
        if !self.claim() {
            return Err(value);
        }
        self.settle(Ok(value), PUBLISHED);
        Ok(())
    }

    /// Close the cell with `error`; parked readers resolve to it
    ///
    /// Returns the error back in `Err` if the cell has already settled.
    pub(crate) fn close(&self, error: E) -> Result<(), E> {
        if !self.claim() {
            return Err(error);
        }
        self.settle(Err(error), CLOSED);
        Ok(())
    }

    /// Future resolving to the settled outcome
    ///
    /// Resolves immediately if the cell has already settled.
    pub fn ready(&self) -> Ready<'_, T, E> {
        Ready { cell: self }
    }

    /// Number of readers currently parked (diagnostics)
    pub fn waiter_count(&self) -> usize {
        self.lock_waiters().len()
    }

    fn claim(&self) -> bool {
        self.state
            .compare_exchange(EMPTY, WRITING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn settle(&self, outcome: Result<T, E>, terminal: u8) {
        // SAFETY: `claim` succeeded, so this thread is the only writer and no
        // reader dereferences the slot before the store below
        self.outcome.with_mut(|slot| unsafe { *slot = Some(outcome) });
        self.state.store(terminal, Ordering::Release);

        let waiters = core::mem::take(&mut *self.lock_waiters());
        for waker in waiters {
            waker.wake();
        }
    }

    fn lock_waiters(&self) -> MutexGuard<'_, Vec<Waker>> {
        // A panic while holding the lock cannot leave the waker list torn
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for PublishedCell<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome() {
            Some(Ok(value)) => f.debug_tuple("PublishedCell::Published").field(value).finish(),
            Some(Err(error)) => f.debug_tuple("PublishedCell::Closed").field(error).finish(),
            None => f.write_str("PublishedCell::Empty"),
        }
    }
}

/// Future returned by [`PublishedCell::ready`]
#[must_use = "futures do nothing unless awaited"]
pub struct Ready<'a, T, E = ()> {
    cell: &'a PublishedCell<T, E>,
}

impl<'a, T, E> Future for Ready<'a, T, E> {
    type Output = Result<&'a T, &'a E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let cell = self.cell;
        if let Some(outcome) = cell.outcome() {
            return Poll::Ready(outcome.as_ref());
        }

        let mut waiters = cell.lock_waiters();
        // Re-check under the lock: `settle` drains the list only after storing
        if let Some(outcome) = cell.outcome() {
            return Poll::Ready(outcome.as_ref());
        }
        if !waiters.iter().any(|w| w.will_wake(cx.waker())) {
            waiters.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl<T, E> fmt::Debug for Ready<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ready")
            .field("settled", &self.cell.is_settled())
            .finish()
    }
}

/// Read-only view of a [`PublishedCell`], handed to consumers
///
/// Readers can observe and await the outcome but never settle the cell:
///
/// ```compile_fail
/// use waves_boot::Bootstrapper;
/// # fn forge<P: waves_boot::ModuleProvider<Handle = u32>>(boot: &Bootstrapper<P>) {
/// let reader = boot.reader();
/// reader.set(999);
/// # }
/// ```
pub struct PublishedReader<T, E = ()> {
    cell: Arc<PublishedCell<T, E>>,
}

impl<T, E> PublishedReader<T, E> {
    pub(crate) fn new(cell: Arc<PublishedCell<T, E>>) -> Self {
        Self { cell }
    }

    /// The published value, or `None` while empty or closed
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// The error the cell was closed with, if any
    pub fn error(&self) -> Option<&E> {
        self.cell.error()
    }

    /// Whether a value has been published
    pub fn is_published(&self) -> bool {
        self.cell.is_published()
    }

    /// Whether the cell has settled (published or closed)
    pub fn is_settled(&self) -> bool {
        self.cell.is_settled()
    }

    /// Future resolving to the settled outcome
    pub fn ready(&self) -> Ready<'_, T, E> {
        self.cell.ready()
    }

    /// Number of readers currently parked (diagnostics)
    pub fn waiter_count(&self) -> usize {
        self.cell.waiter_count()
    }

    /// Whether both readers observe the same cell
    pub fn same_cell(&self, other: &PublishedReader<T, E>) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<T, E> Clone for PublishedReader<T, E> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for PublishedReader<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublishedReader").field(&*self.cell).finish()
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::future::join;
    use futures::task::{waker, ArcWake};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingWaker {
        wakes: AtomicUsize,
    }

    impl ArcWake for CountingWaker {
        fn wake_by_ref(arc_self: &Arc<Self>) {
            arc_self.wakes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_empty_until_set() {
        let cell = PublishedCell::<u32>::new();
        assert!(cell.get().is_none());
        assert!(!cell.is_published());
        assert!(!cell.is_settled());

        assert_eq!(cell.set(9), Ok(()));
        assert_eq!(cell.get(), Some(&9));
        assert!(cell.is_published());
        assert!(cell.error().is_none());
    }

    #[test]
    fn test_second_set_is_rejected() {
        let cell = PublishedCell::<_>::new();
        cell.set("first").unwrap();
        assert_eq!(cell.set("second"), Err("second"));
        assert_eq!(cell.get(), Some(&"first"));
    }

    #[test]
    fn test_close_is_terminal() {
        let cell = PublishedCell::<u8, &str>::new();
        assert_eq!(cell.close("fetch failed"), Ok(()));
        assert_eq!(cell.set(1), Err(1));
        assert_eq!(cell.close("again"), Err("again"));

        assert!(cell.get().is_none());
        assert!(!cell.is_published());
        assert!(cell.is_settled());
        assert_eq!(cell.error(), Some(&"fetch failed"));
    }

    #[test]
    fn test_ready_resolves_immediately_when_set() {
        let cell = PublishedCell::<u8>::new();
        cell.set(5).unwrap();
        assert_eq!(block_on(cell.ready()), Ok(&5));
    }

    #[test]
    fn test_ready_parks_until_set() {
        let cell = PublishedCell::<u64>::new();
        let (value, ()) = block_on(join(cell.ready(), async {
            cell.set(11).unwrap();
        }));
        assert_eq!(value, Ok(&11));
        assert_eq!(cell.waiter_count(), 0);
    }

    #[test]
    fn test_ready_parks_until_closed() {
        let cell = PublishedCell::<u64, &str>::new();
        let (outcome, ()) = block_on(join(cell.ready(), async {
            cell.close("artifact missing").unwrap();
        }));
        assert_eq!(outcome, Err(&"artifact missing"));
        assert_eq!(cell.waiter_count(), 0);
    }

    #[test]
    fn test_polls_after_close_do_not_park() {
        let cell = PublishedCell::<u8, &str>::new();
        cell.close("instantiation failed").unwrap();

        for _ in 0..100 {
            let counter = Arc::new(CountingWaker {
                wakes: AtomicUsize::new(0),
            });
            let waker = waker(counter);
            let mut cx = Context::from_waker(&waker);
            let mut ready = cell.ready();
            assert_eq!(
                Pin::new(&mut ready).poll(&mut cx),
                Poll::Ready(Err(&"instantiation failed"))
            );
        }
        assert_eq!(cell.waiter_count(), 0);
    }

    #[test]
    fn test_repeated_polls_register_one_waker() {
        let counter = Arc::new(CountingWaker {
            wakes: AtomicUsize::new(0),
        });
        let waker = waker(counter.clone());
        let mut cx = Context::from_waker(&waker);

        let cell = PublishedCell::<char>::new();
        let mut ready = cell.ready();
        assert!(Pin::new(&mut ready).poll(&mut cx).is_pending());
        assert!(Pin::new(&mut ready).poll(&mut cx).is_pending());
        assert_eq!(cell.waiter_count(), 1);

        cell.set('x').unwrap();
        assert_eq!(counter.wakes.load(Ordering::SeqCst), 1);
        assert_eq!(Pin::new(&mut ready).poll(&mut cx), Poll::Ready(Ok(&'x')));
    }

    #[test]
    fn test_reader_observes_owner_writes() {
        let cell = Arc::new(PublishedCell::<u32>::new());
        let reader = PublishedReader::new(Arc::clone(&cell));
        let other = reader.clone();

        assert!(reader.get().is_none());
        cell.set(3).unwrap();
        assert_eq!(reader.get(), Some(&3));
        assert!(other.is_published());
        assert!(reader.same_cell(&other));
    }

    #[test]
    fn test_debug_shows_state() {
        let cell = PublishedCell::<i32, &str>::new();
        assert_eq!(format!("{:?}", cell), "PublishedCell::Empty");
        cell.set(3).unwrap();
        assert_eq!(format!("{:?}", cell), "PublishedCell::Published(3)");

        let closed = PublishedCell::<i32, &str>::new();
        closed.close("gone").unwrap();
        assert_eq!(format!("{:?}", closed), "PublishedCell::Closed(\"gone\")");
    }
}
