use pollevent::sync::SpinLock;
use std::sync::Arc;
use std::thread;

#[test]
fn test_lock_unlock() {
    let lock = SpinLock::new(5);
    assert!(!lock.is_locked());

    {
        let mut guard = lock.lock();
        assert!(lock.is_locked());
        *guard += 1;
    }

    assert!(!lock.is_locked());
    assert_eq!(lock.into_inner(), 6);
}

#[test]
fn test_try_lock_while_held() {
    let lock = SpinLock::new(());

    let guard = lock.try_lock().expect("lock should be free");
    assert!(lock.try_lock().is_none(), "lock must not be acquired twice");

    drop(guard);
    assert!(lock.try_lock().is_some());
}

#[test]
fn test_mutual_exclusion_under_contention() {
    let lock = Arc::new(SpinLock::new(0usize));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let lock = lock.clone();
            thread::spawn(move || {
                for _ in 0..10_000 {
                    *lock.lock() += 1;
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert_eq!(*lock.lock(), 80_000);
}

#[test]
fn test_default_is_unlocked() {
    let lock: SpinLock<Vec<u8>> = SpinLock::default();
    assert!(!lock.is_locked());
    assert!(lock.lock().is_empty());
}
