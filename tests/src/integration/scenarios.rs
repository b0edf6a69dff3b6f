//! # End-to-End Scenarios
//!
//! | Scenario | Flow |
//! |----------|------|
//! | A | Boot with a stored token → verified, refresh armed |
//! | B | Protected deep link while logged out → login → back to the link |
//! | C | Missing permission → `/403`, session untouched |
//! | D | Refresh failure → session cleared, host on `/login` |
//! | E | Sandbox navigation → one host push, nothing echoed back |
//! | E' | Route reports from a logged-out or hidden sandbox → host stays put |

use std::time::Duration;

use mf_02_credentials::AuthError;
use mf_03_auth_guard::GuardState;
use mf_04_lifecycle::InstanceStatus;
use mf_05_route_sync::RouteKind;
use shared_types::{HostNavigator, TokenStore};

use super::harness::{harness, harness_with_stored_token, USER};

#[tokio::test]
async fn scenario_a_boot_with_stored_token() {
    let h = harness_with_stored_token("/");
    let outcome = h.shell.boot().await.unwrap();

    assert_eq!(outcome.kind, RouteKind::Home);
    assert_eq!(outcome.redirects, 0);
    assert_eq!(h.backend.profile_calls(), 1);

    let c = h.shell.container();
    assert_eq!(c.guard.state(), GuardState::Authenticated);
    assert_eq!(c.credentials.snapshot().username(), Some(USER));
    assert!(c.credentials.refresh_armed());
    // Testing credentials: 60 s lifetime, 5 s margin.
    assert_eq!(c.credentials.refresh_delay(), Some(Duration::from_secs(55)));
}

#[tokio::test]
async fn scenario_b_login_returns_to_deep_link() {
    let h = harness();
    h.shell.boot().await.unwrap();

    let outcome = h.shell.navigate("/orders/detail/7").await.unwrap();
    assert_eq!(outcome.kind, RouteKind::Login);
    assert_eq!(outcome.location.path, "/login");
    assert_eq!(outcome.location.query_param("redirect"), Some("/orders/detail/7"));
    assert_eq!(h.navigator.current(), outcome.location);
    assert_eq!(h.sandboxes.start_calls(), 0);

    let outcome = h.shell.login(USER, "secret").await.unwrap();
    assert_eq!(outcome.location.path, "/orders/detail/7");
    let activation = outcome.activation.unwrap();
    assert_eq!(activation.sub_app, "orders");
    assert_eq!(activation.relative_path, "/detail/7");
    assert_eq!(h.navigator.current_path(), "/orders/detail/7");
}

#[tokio::test]
async fn scenario_c_missing_permission_lands_on_forbidden() {
    let h = harness().logged_in().await;
    let token_before = h.shell.container().credentials.token();

    let outcome = h.shell.navigate("/order-admin/list").await.unwrap();

    assert_eq!(outcome.kind, RouteKind::Forbidden);
    assert_eq!(outcome.location.path, "/403");
    assert!(outcome.activation.is_none());
    assert_eq!(h.navigator.current_path(), "/403");
    assert_eq!(h.shell.container().credentials.token(), token_before);
    assert!(token_before.is_some());
    assert_eq!(h.sandboxes.live_count("order-admin"), 0);
}

#[tokio::test(start_paused = true)]
async fn scenario_d_refresh_failure_logs_out() {
    let h = harness().logged_in().await;
    h.shell.navigate("/orders/list").await.unwrap();
    assert_eq!(h.sandboxes.live_count("orders"), 1);

    h.backend
        .fail_refresh_with(AuthError::Network("connection reset".into()));
    tokio::time::sleep(Duration::from_secs(56)).await;

    assert_eq!(h.backend.refresh_calls(), 1);
    let c = h.shell.container();
    assert!(!c.credentials.snapshot().is_logged_in());
    assert!(h.store.load().is_none());
    assert_eq!(h.navigator.current_path(), "/login");
    assert_eq!(
        h.navigator.current().query_param("redirect"),
        Some("/orders/list")
    );
    assert_eq!(h.sandboxes.live_count("orders"), 0);
    assert_eq!(c.guard.state(), GuardState::Unauthenticated);
}

#[tokio::test]
async fn scenario_e_sandbox_navigation_syncs_host_once() {
    let h = harness().logged_in().await;
    h.shell.navigate("/order-system/list").await.unwrap();
    let bridge = h.bridge("order-system");

    let pushes_before = h.navigator.push_count();
    let published_before = h.bus.messages_published();
    let syncs_before = h.sandboxes.route_syncs().len();

    assert!(bridge.navigate_internal("/detail/7"));

    assert_eq!(h.navigator.current_path(), "/order-system/detail/7");
    assert_eq!(h.navigator.push_count(), pushes_before + 1);
    // Only the sandbox's own sub-route-change went over the bus.
    assert_eq!(h.bus.messages_published(), published_before + 1);
    assert_eq!(h.sandboxes.route_syncs().len(), syncs_before);
    assert_eq!(bridge.current_path(), "/detail/7");

    let inst = h.shell.container().lifecycle.instance("order-system").unwrap();
    assert_eq!(inst.current_relative_path.as_deref(), Some("/detail/7"));
}

#[tokio::test]
async fn scenario_e_sandbox_cannot_move_host_after_logout() {
    let h = harness().logged_in().await;
    h.shell.navigate("/order-system/list").await.unwrap();
    let bridge = h.bridge("order-system");

    let login = h.shell.logout();
    assert_eq!(login.to_url(), "/login?redirect=/order-system/list");
    let pushes_before = h.navigator.push_count();

    bridge.navigate_internal("/detail/7");

    let c = h.shell.container();
    assert_eq!(h.navigator.current(), login);
    assert_eq!(h.navigator.push_count(), pushes_before);
    assert_eq!(c.guard.state(), GuardState::Unauthenticated);
    assert!(!c.credentials.snapshot().is_logged_in());
    assert_eq!(c.routes.rejected_count(), 1);
}

#[tokio::test]
async fn scenario_e_hidden_sandbox_cannot_move_host() {
    let h = harness().logged_in().await;
    h.shell.navigate("/order-system/list").await.unwrap();
    let hidden = h.bridge("order-system");
    h.shell.navigate("/orders/list").await.unwrap();
    let pushes_before = h.navigator.push_count();

    hidden.navigate_internal("/detail/9");

    let c = h.shell.container();
    assert_eq!(h.navigator.current_path(), "/orders/list");
    assert_eq!(h.navigator.push_count(), pushes_before);
    assert_eq!(c.lifecycle.active().as_deref(), Some("orders"));
    assert_eq!(
        c.lifecycle.instance("order-system").unwrap().status,
        InstanceStatus::Inactive
    );
    assert_eq!(c.routes.rejected_count(), 1);

    // The active sandbox is still followed.
    let active = h.bridge("orders");
    assert!(active.navigate_internal("/detail/3"));
    assert_eq!(h.navigator.current_path(), "/orders/detail/3");
}
