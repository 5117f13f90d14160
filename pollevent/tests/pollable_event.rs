use pollevent::{ChannelKind, PollableEvent};
use std::os::fd::AsRawFd;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn assert_clear(event: &PollableEvent) {
    assert!(!event.is_set().expect("is_set failed"), "event should be CLEAR");
    assert_eq!(event.buffered().expect("FIONREAD failed"), 0);
}

fn assert_set(event: &PollableEvent) {
    assert!(event.is_set().expect("is_set failed"), "event should be SET");
    assert_eq!(event.buffered().expect("FIONREAD failed"), 1);
}

#[test]
fn test_new_event_is_clear() {
    let event = PollableEvent::new().expect("Failed to create event");
    assert_clear(&event);
}

#[test]
fn test_set_clear_cycle() {
    let event = PollableEvent::new().expect("Failed to create event");
    assert_clear(&event);

    event.set().expect("set failed");
    assert_set(&event);

    event.clear().expect("clear failed");
    assert_clear(&event);

    event.destroy();
}

#[test]
fn test_set_is_idempotent() {
    let event = PollableEvent::new().expect("Failed to create event");

    event.set().expect("first set failed");
    event.set().expect("second set failed");
    event.set().expect("third set failed");
    assert_set(&event);

    event.clear().expect("clear failed");
    assert_clear(&event);
}

#[test]
fn test_clear_is_idempotent() {
    let event = PollableEvent::new().expect("Failed to create event");

    event.clear().expect("clear on fresh event failed");
    event.clear().expect("second clear failed");
    assert_clear(&event);

    event.set().expect("set failed");
    event.clear().expect("clear failed");
    event.clear().expect("repeated clear failed");
    assert_clear(&event);
}

#[test]
fn test_repeated_transitions() {
    let event = PollableEvent::new().expect("Failed to create event");

    for _ in 0..100 {
        event.set().expect("set failed");
        assert_set(&event);
        event.clear().expect("clear failed");
        assert_clear(&event);
    }
}

#[test]
fn test_socket_pair_channel() {
    let event = PollableEvent::builder()
        .channel(ChannelKind::SocketPair)
        .build()
        .expect("Failed to create event");
    assert_clear(&event);

    event.set().expect("set failed");
    event.set().expect("second set failed");
    assert_set(&event);

    event.clear().expect("clear failed");
    event.clear().expect("second clear failed");
    assert_clear(&event);

    event.destroy();
}

#[test]
fn test_builder_initially_set() {
    let event = PollableEvent::builder()
        .initially_set(true)
        .build()
        .expect("Failed to create event");
    assert_set(&event);

    event.clear().expect("clear failed");
    assert_clear(&event);
}

#[test]
fn test_builder_cloexec() {
    let event = PollableEvent::builder()
        .build()
        .expect("Failed to create event");
    let flags = unsafe { libc::fcntl(event.as_raw_fd(), libc::F_GETFD) };
    assert!(flags & libc::FD_CLOEXEC != 0);

    let event = PollableEvent::builder()
        .cloexec(false)
        .build()
        .expect("Failed to create event");
    let flags = unsafe { libc::fcntl(event.as_raw_fd(), libc::F_GETFD) };
    assert_eq!(flags & libc::FD_CLOEXEC, 0);
}

#[test]
fn test_read_handle_is_non_blocking() {
    let event = PollableEvent::new().expect("Failed to create event");
    let flags = unsafe { libc::fcntl(event.as_raw_fd(), libc::F_GETFL) };
    assert!(flags & libc::O_NONBLOCK != 0);
}

#[test]
fn test_wait_times_out_when_clear() {
    let event = PollableEvent::new().expect("Failed to create event");

    let start = Instant::now();
    let ready = event
        .wait(Some(Duration::from_millis(50)))
        .expect("wait failed");

    assert!(!ready);
    assert!(
        start.elapsed() >= Duration::from_millis(40),
        "wait should last about the timeout"
    );
}

#[test]
fn test_wait_does_not_clear() {
    let event = PollableEvent::new().expect("Failed to create event");
    event.set().expect("set failed");

    assert!(event.wait(Some(Duration::ZERO)).expect("wait failed"));
    assert!(event.wait(None).expect("wait failed"));
    assert_set(&event);
}

#[test]
fn test_wait_woken_by_other_thread() {
    let event = Arc::new(PollableEvent::new().expect("Failed to create event"));

    let setter = {
        let event = event.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            event.set().expect("set failed");
        })
    };

    let ready = event
        .wait(Some(Duration::from_secs(5)))
        .expect("wait failed");
    assert!(ready, "wait should observe the set from the other thread");

    setter.join().expect("Thread panicked");
    assert_set(&event);
}

#[test]
fn test_wait_with_unbounded_timeout_on_set_event() {
    let event = PollableEvent::new().expect("Failed to create event");
    event.set().expect("set failed");

    assert!(event.wait(Some(Duration::MAX)).expect("wait failed"));
    assert_set(&event);
}
