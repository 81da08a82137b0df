//! Integration tests for the lazy subscription multiplexer.
//!
//! All tests run against the scripted mock transport; no bus needed.

use std::sync::Arc;

use devstate::{Activity, Category, DisplayState, StateChange, StateError, StateMonitor};
use devstate_transport::{protocol, MockCall, MockTransport, Value};

fn monitor() -> (Arc<MockTransport>, StateMonitor) {
    let mock = Arc::new(MockTransport::new());
    let monitor = StateMonitor::new(Arc::clone(&mock) as Arc<dyn devstate_transport::Transport>);
    (mock, monitor)
}

#[tokio::test]
async fn subscription_tracks_observer_count() {
    let (mock, monitor) = monitor();
    let signal = Category::Display.signal();

    // Two observers: exactly one subscribe, on the 0 -> 1 transition.
    let first = monitor.register(Category::Display).await.unwrap();
    let second = monitor.register(Category::Display).await.unwrap();
    assert_eq!(mock.subscribe_count(signal), 1);
    assert_eq!(monitor.observer_count(Category::Display), 2);

    // Dropping one keeps the subscription alive.
    monitor.deregister(first).await.unwrap();
    assert_eq!(mock.unsubscribe_count(signal), 0);
    assert_eq!(monitor.observer_count(Category::Display), 1);

    // The last one releases it, exactly once.
    monitor.deregister(second).await.unwrap();
    assert_eq!(mock.unsubscribe_count(signal), 1);
    assert_eq!(monitor.observer_count(Category::Display), 0);

    // Re-registering subscribes again.
    let third = monitor.register(Category::Display).await.unwrap();
    assert_eq!(mock.subscribe_count(signal), 2);
    monitor.deregister(third).await.unwrap();
    assert_eq!(mock.unsubscribe_count(signal), 2);
}

#[tokio::test]
async fn categories_are_independent() {
    let (mock, monitor) = monitor();

    let display = monitor.register(Category::Display).await.unwrap();
    let psm = monitor.register(Category::PowerSave).await.unwrap();

    assert_eq!(mock.subscribe_count(protocol::DISPLAY_SIG), 1);
    assert_eq!(mock.subscribe_count(protocol::PSM_STATE_SIG), 1);
    assert_eq!(mock.subscribe_count(protocol::RADIO_STATES_SIG), 0);

    monitor.deregister(display).await.unwrap();
    assert_eq!(mock.unsubscribe_count(protocol::DISPLAY_SIG), 1);
    assert_eq!(mock.unsubscribe_count(protocol::PSM_STATE_SIG), 0);

    monitor.deregister(psm).await.unwrap();
    assert_eq!(mock.unsubscribe_count(protocol::PSM_STATE_SIG), 1);
}

#[tokio::test]
async fn notifications_reach_all_observers_in_order() {
    let (_mock, monitor) = monitor();

    let mut first = monitor.register(Category::Display).await.unwrap();
    let mut second = monitor.register(Category::Display).await.unwrap();

    monitor.handle_notification(Category::Display, &Value::from("off"));
    assert_eq!(
        first.recv().await,
        Some(StateChange::Display(DisplayState::Off))
    );
    assert_eq!(
        second.recv().await,
        Some(StateChange::Display(DisplayState::Off))
    );

    // Unmapped raw values are delivered as Unknown, never dropped.
    monitor.handle_notification(Category::Display, &Value::from("garbage"));
    assert_eq!(
        first.recv().await,
        Some(StateChange::Display(DisplayState::Unknown))
    );
    assert_eq!(
        second.recv().await,
        Some(StateChange::Display(DisplayState::Unknown))
    );
}

#[tokio::test]
async fn notification_without_observers_is_a_no_op() {
    let (mock, monitor) = monitor();

    monitor.handle_notification(Category::Display, &Value::from("on"));

    // Nobody to deliver to, and no external calls made.
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn observers_only_see_their_category() {
    let (_mock, monitor) = monitor();

    let mut display = monitor.register(Category::Display).await.unwrap();
    let mut activity = monitor.register(Category::Activity).await.unwrap();

    monitor.handle_notification(Category::Activity, &Value::from(true));

    assert_eq!(
        activity.recv().await,
        Some(StateChange::Activity(Activity::Inactive))
    );
    assert_eq!(display.try_recv(), None);
}

#[tokio::test]
async fn dispatcher_routes_transport_signals() {
    let (mock, monitor) = monitor();
    let monitor = Arc::new(monitor);
    let dispatcher = monitor.spawn_dispatcher();

    let mut observer = monitor.register(Category::PowerSave).await.unwrap();

    // Give the dispatcher task a chance to subscribe to the stream.
    tokio::task::yield_now().await;
    assert_eq!(mock.emit(protocol::PSM_STATE_SIG, Value::from(true)), 1);

    let change = tokio::time::timeout(std::time::Duration::from_secs(1), observer.recv())
        .await
        .expect("dispatcher did not forward the signal");
    assert_eq!(
        change,
        Some(StateChange::PowerSave(devstate::PsmState::On))
    );

    // Signals for other categories are ignored without panicking.
    mock.emit("battery_status_ind", Value::from("full"));
    tokio::task::yield_now().await;
    assert_eq!(observer.try_recv(), None);

    dispatcher.abort();
}

#[tokio::test]
async fn failed_subscribe_registers_nothing() {
    let (mock, monitor) = monitor();
    mock.fail_subscribe(true);

    // Call-then-count: the failed subscribe leaves the count at zero.
    let err = monitor.register(Category::Display).await.unwrap_err();
    assert!(matches!(err, StateError::Transport(_)));
    assert_eq!(monitor.observer_count(Category::Display), 0);

    // Once the transport recovers, registration works and issues a
    // fresh subscribe.
    mock.fail_subscribe(false);
    let observer = monitor.register(Category::Display).await.unwrap();
    assert_eq!(mock.subscribe_count(Category::Display.signal()), 2);
    monitor.deregister(observer).await.unwrap();
}

#[tokio::test]
async fn failed_unsubscribe_still_removes_the_observer() {
    let (mock, monitor) = monitor();

    let observer = monitor.register(Category::Display).await.unwrap();
    mock.fail_unsubscribe(true);

    let err = monitor.deregister(observer).await.unwrap_err();
    assert!(matches!(err, StateError::Transport(_)));
    assert_eq!(monitor.observer_count(Category::Display), 0);
}

#[tokio::test]
async fn query_failure_leaves_counts_untouched() {
    let (mock, monitor) = monitor();

    let observer = monitor.register(Category::Display).await.unwrap();
    mock.fail_requests(true);

    let change = monitor.query(Category::Display).await;
    assert_eq!(change, StateChange::Display(DisplayState::Unknown));
    assert_eq!(monitor.observer_count(Category::Display), 1);
    assert_eq!(mock.unsubscribe_count(Category::Display.signal()), 0);

    mock.fail_requests(false);
    monitor.deregister(observer).await.unwrap();
}

#[tokio::test]
async fn query_is_independent_of_subscriptions() {
    let (mock, monitor) = monitor();
    mock.set_reply(protocol::DISPLAY_STATUS_GET, Value::from("dimmed"));

    let change = monitor.query(Category::Display).await;
    assert_eq!(change, StateChange::Display(DisplayState::Dimmed));

    // Only the request went out; no subscription was created.
    assert_eq!(
        mock.calls(),
        vec![MockCall::Request(protocol::DISPLAY_STATUS_GET.to_string())]
    );
}

#[tokio::test]
async fn shutdown_releases_all_subscriptions() {
    let (mock, monitor) = monitor();

    let _display_a = monitor.register(Category::Display).await.unwrap();
    let _display_b = monitor.register(Category::Display).await.unwrap();
    let _mode = monitor.register(Category::DeviceMode).await.unwrap();

    monitor.shutdown().await.unwrap();

    // One unsubscribe per active category, none for inactive ones.
    assert_eq!(mock.unsubscribe_count(protocol::DISPLAY_SIG), 1);
    assert_eq!(mock.unsubscribe_count(protocol::RADIO_STATES_SIG), 1);
    assert_eq!(mock.unsubscribe_count(protocol::PSM_STATE_SIG), 0);
    for category in Category::ALL {
        assert_eq!(monitor.observer_count(category), 0);
    }
}

#[tokio::test]
async fn shutdown_attempts_every_release_despite_failures() {
    let (mock, monitor) = monitor();

    let _display = monitor.register(Category::Display).await.unwrap();
    let _mode = monitor.register(Category::DeviceMode).await.unwrap();
    mock.fail_unsubscribe(true);

    // The first failing unsubscribe must not skip the second category.
    let err = monitor.shutdown().await.unwrap_err();
    assert!(matches!(err, StateError::Transport(_)));
    assert_eq!(mock.unsubscribe_count(protocol::DISPLAY_SIG), 1);
    assert_eq!(mock.unsubscribe_count(protocol::RADIO_STATES_SIG), 1);
    for category in Category::ALL {
        assert_eq!(monitor.observer_count(category), 0);
    }
}

#[tokio::test]
async fn deregistering_twice_is_rejected() {
    let (_mock, monitor) = monitor();

    let observer = monitor.register(Category::Display).await.unwrap();
    let stale = monitor.register(Category::Display).await.unwrap();
    monitor.deregister(stale).await.unwrap();

    // Shut down, then try to deregister a handle that is already gone.
    monitor.shutdown().await.unwrap();
    let err = monitor.deregister(observer).await.unwrap_err();
    assert!(matches!(err, StateError::InvalidArgument(_)));
    assert_eq!(monitor.observer_count(Category::Display), 0);
}

#[tokio::test]
async fn concurrent_registrations_subscribe_once() {
    let (mock, monitor) = monitor();
    let monitor = Arc::new(monitor);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let monitor = Arc::clone(&monitor);
        handles.push(tokio::spawn(async move {
            monitor.register(Category::Activity).await.unwrap()
        }));
    }

    let mut observers = Vec::new();
    for handle in handles {
        observers.push(handle.await.unwrap());
    }

    assert_eq!(mock.subscribe_count(protocol::INACTIVITY_SIG), 1);
    assert_eq!(monitor.observer_count(Category::Activity), 8);

    for observer in observers {
        monitor.deregister(observer).await.unwrap();
    }
    assert_eq!(mock.unsubscribe_count(protocol::INACTIVITY_SIG), 1);
}
