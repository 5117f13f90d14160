use std::cell::UnsafeCell;
use std::hint;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};

/// A spin lock.
///
/// `SpinLock<T>` provides mutual exclusion between threads. A thread that
/// cannot acquire the lock busy-waits until it becomes available instead
/// of being parked, so it must only guard short, non-blocking sections.
pub struct SpinLock<T> {
    /// Indicates whether the lock is currently held.
    locked: AtomicBool,

    /// The data protected by the lock.
    ///
    /// UnsafeCell allows mutable access through shared references,
    /// which is safe because we guarantee mutual exclusion.
    data: UnsafeCell<T>,
}

// Safety: `SpinLock<T>` can be sent across threads if `T` is Send.
unsafe impl<T: Send> Send for SpinLock<T> {}
// Safety: `SpinLock<T>` can be shared across threads if `T` is Send,
// because access is serialized by the `locked` flag.
unsafe impl<T: Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    /// Creates a new, unlocked spin lock wrapping the given value.
    pub const fn new(value: T) -> SpinLock<T> {
        Self {
            locked: AtomicBool::new(false),
            data: UnsafeCell::new(value),
        }
    }

    /// Acquires the lock, spinning until it is available.
    ///
    /// # Example
    /// ```
    /// use pollevent::sync::SpinLock;
    ///
    /// let lock = SpinLock::new(0);
    /// *lock.lock() += 1;
    /// assert_eq!(*lock.lock(), 1);
    /// ```
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        loop {
            if let Some(guard) = self.try_lock() {
                return guard;
            }

            // Spin on loads until the holder releases.
            while self.locked.load(Ordering::Relaxed) {
                hint::spin_loop();
            }
        }
    }

    /// Attempts to acquire the lock without spinning.
    pub fn try_lock(&self) -> Option<SpinLockGuard<'_, T>> {
        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(SpinLockGuard { lock: self })
        } else {
            None
        }
    }

    /// Returns whether the lock is currently held.
    ///
    /// The answer may be stale by the time it is observed.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    /// Consumes the lock, returning the protected value.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: Default> Default for SpinLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> std::fmt::Debug for SpinLock<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpinLock")
            .field("locked", &self.is_locked())
            .finish_non_exhaustive()
    }
}

/// Guard returned by `SpinLock::lock`.
///
/// Releases the lock when dropped.
pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

impl<'a, T> Drop for SpinLockGuard<'a, T> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}

impl<'a, T> Deref for SpinLockGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { &*self.lock.data.get() }
    }
}

impl<'a, T> DerefMut for SpinLockGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut *self.lock.data.get() }
    }
}
