//! Interrupt-safe lock
//!
//! A spin lock that is only ever taken inside a critical section, so the
//! holder can never be preempted by an interrupt handler that wants the same
//! lock. Usable from both task and interrupt context. Not reentrant: a
//! closure must not lock the same `IrqMutex` again.

use spin::Mutex;

/// State shared between interrupt handlers and tasks
pub struct IrqMutex<T> {
    inner: Mutex<T>,
}

impl<T> IrqMutex<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Runs `f` with interrupts masked and the lock held.
    ///
    /// Keep `f` short; it must never block or await.
    #[inline]
    pub fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section::with(|_| {
            let mut guard = self.inner.lock();
            f(&mut guard)
        })
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}
