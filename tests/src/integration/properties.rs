//! # Shell Invariants
//!
//! - **Single instance**: a transient sub-app never has two live sandboxes.
//! - **Session gating**: nothing mounts without a session.
//! - **Timer hygiene**: no refresh call after logout.
//! - **Route idempotence**: the same host path is pushed once.
//! - **Credential freshness**: the snapshot injected on activation is the
//!   session at that moment.

use std::time::Duration;

use mf_04_lifecycle::{InstanceStatus, LifecycleError};
use shared_bus::{BusPayload, Channel};
use shared_types::{HostNavigator, RouteLocation};

use super::harness::harness;

#[tokio::test]
async fn transient_sub_app_never_has_two_sandboxes() {
    let h = harness().logged_in().await;

    for _ in 0..3 {
        h.shell.navigate("/product-management/list").await.unwrap();
        assert_eq!(h.sandboxes.live_count("product-management"), 1);
        h.shell.navigate("/orders").await.unwrap();
        assert_eq!(h.sandboxes.live_count("product-management"), 0);
    }
    let inst = h.shell.container().lifecycle.instance("product-management").unwrap();
    assert_eq!(inst.status, InstanceStatus::Disposed);
}

#[tokio::test]
async fn overlapping_loads_leave_one_sandbox() {
    let h = harness().logged_in().await;
    let lifecycle = h.shell.container().lifecycle.clone();
    h.sandboxes.hold_preloads();

    let first = lifecycle.navigate_to("product-management", "/product-management/a");
    let second = async {
        tokio::task::yield_now().await;
        lifecycle
            .navigate_to("product-management", "/product-management/b")
            .await
    };
    let release = async {
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        h.sandboxes.release_preloads(2);
    };
    let (first, second, ()) = tokio::join!(first, second, release);

    assert!(first.is_ok() || second.is_ok());
    if let Err(e) = &first {
        assert!(matches!(e, LifecycleError::Superseded(_)));
    }
    assert_eq!(h.sandboxes.live_count("product-management"), 1);
    assert_eq!(
        lifecycle.instance("product-management").unwrap().status,
        InstanceStatus::Active
    );
}

#[tokio::test]
async fn nothing_mounts_without_session() {
    let h = harness();
    h.shell.boot().await.unwrap();

    let outcome = h.shell.navigate("/orders/list").await.unwrap();
    assert!(outcome.activation.is_none());

    let err = h
        .shell
        .container()
        .lifecycle
        .navigate_to("orders", "/orders/list")
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NoSession(_)));
    assert_eq!(h.sandboxes.preload_calls(), 0);
    assert_eq!(h.sandboxes.start_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn no_refresh_after_logout() {
    let h = harness().logged_in().await;
    assert!(h.shell.container().credentials.refresh_armed());

    tokio::time::sleep(Duration::from_secs(30)).await;
    h.shell.logout();
    assert!(!h.shell.container().credentials.refresh_armed());

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(h.backend.refresh_calls(), 0);
}

#[tokio::test]
async fn same_host_path_is_pushed_once() {
    let h = harness().logged_in().await;
    h.shell.navigate("/order-system/list").await.unwrap();
    let routes = h.shell.container().routes.clone();
    let before = h.navigator.push_count();

    assert!(routes
        .push_if_changed(RouteLocation::new("/order-system/detail/7"))
        .unwrap());
    assert!(!routes
        .push_if_changed(RouteLocation::new("/order-system/detail/7"))
        .unwrap());

    for _ in 0..2 {
        h.bus.publish(
            Channel::sub_route_change(),
            BusPayload::SubRouteChange {
                sub_app_name: "order-system".into(),
                relative_path: "/detail/7".into(),
            },
            "order-system",
        );
    }
    assert_eq!(h.navigator.push_count(), before + 1);
    assert_eq!(h.navigator.current_path(), "/order-system/detail/7");
}

#[tokio::test(start_paused = true)]
async fn activation_injects_current_session() {
    let h = harness().logged_in().await;
    let c = h.shell.container();

    h.shell.navigate("/orders/list").await.unwrap();
    let first = c.credentials.snapshot();
    assert_eq!(h.sandboxes.last_injection("orders"), Some(first.clone()));

    h.shell.navigate("/order-system").await.unwrap();
    assert_eq!(
        c.lifecycle.instance("orders").unwrap().status,
        InstanceStatus::Inactive
    );

    // Refresh rotates the token while `orders` is hidden.
    tokio::time::sleep(Duration::from_secs(56)).await;
    let rotated = c.credentials.snapshot();
    assert!(rotated.is_logged_in());
    assert_ne!(rotated.token, first.token);

    let outcome = h.shell.navigate("/orders/list").await.unwrap();
    assert!(outcome.activation.unwrap().reused);
    assert_eq!(h.sandboxes.last_injection("orders"), Some(rotated));
}
