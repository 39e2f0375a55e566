use super::*;
use crate::error::ProviderError;
use crate::navigation::MemoryNavigator;
use crate::test_helpers::{CallLog, MockProvider, RecordingStore, user, wait_until};
use crate::types::{AuthChangeEvent, AuthStateChange, Token, User};
use serde_json::json;

// =============================================================================
// bootstrap
// =============================================================================

#[tokio::test]
async fn hydrated_user_skips_provider() {
    let log = CallLog::default();
    let provider = MockProvider::resolving(user("other"), log.clone());
    let state = SessionState::hydrated(Some(user("u1")), Some(Token::from("t")));

    assert_eq!(bootstrap(&state, &provider).await, BootstrapOutcome::AlreadyHydrated);
    assert!(log.entries().is_empty());
    assert_eq!(state.user.get(), Some(user("u1")));
}

#[tokio::test]
async fn no_token_skips_provider() {
    let log = CallLog::default();
    let provider = MockProvider::resolving(user("u1"), log.clone());
    let state = SessionState::new();

    assert_eq!(bootstrap(&state, &provider).await, BootstrapOutcome::NoToken);
    assert!(log.entries().is_empty());
    assert!(state.user.get().is_none());
}

#[tokio::test]
async fn token_resolves_to_user() {
    let log = CallLog::default();
    let provider = MockProvider::resolving(user("u1"), log.clone());
    let state = SessionState::hydrated(None, Some(Token::from("tok")));

    assert_eq!(bootstrap(&state, &provider).await, BootstrapOutcome::Resolved);
    assert_eq!(state.user.get(), Some(user("u1")));
    assert_eq!(state.token.get(), Some(Token::from("tok")));
    assert_eq!(log.entries(), vec!["resolve_token:tok".to_owned()]);
}

#[tokio::test]
async fn token_error_clears_both_cells() {
    let log = CallLog::default();
    let error = ProviderError::Response { status: 401, body: "invalid JWT".into() };
    let provider = MockProvider::failing(error, log.clone());
    let state = SessionState::hydrated(None, Some(Token::from("expired")));

    assert_eq!(bootstrap(&state, &provider).await, BootstrapOutcome::Cleared);
    assert!(state.user.get().is_none());
    assert!(state.token.get().is_none());
    assert_eq!(log.count("resolve_token"), 1);
}

#[tokio::test]
async fn token_without_user_clears_both_cells() {
    let log = CallLog::default();
    let provider = MockProvider::with_token_result(Ok(None), log.clone());
    let state = SessionState::hydrated(None, Some(Token::from("orphan")));

    assert_eq!(bootstrap(&state, &provider).await, BootstrapOutcome::Cleared);
    assert!(state.user.get().is_none());
    assert!(state.token.get().is_none());
}

// =============================================================================
// SessionSync end to end
// =============================================================================

struct Harness {
    log: CallLog,
    provider: Arc<MockProvider>,
    store: Arc<RecordingStore>,
    nav: Arc<MemoryNavigator>,
    state: SessionState,
    queue: DeferredQueue,
}

fn harness(provider: MockProvider, log: CallLog, path: &str, token: Option<&str>) -> Harness {
    Harness {
        store: Arc::new(RecordingStore::new(log.clone())),
        log,
        provider: Arc::new(provider),
        nav: Arc::new(MemoryNavigator::new(path)),
        state: SessionState::hydrated(None, token.map(Token::from)),
        queue: DeferredQueue::new(),
    }
}

fn sync(h: &Harness, config: SyncConfig) -> SessionSync {
    SessionSync::new(config, h.state.clone(), h.provider.clone(), h.nav.clone(), h.store.clone(), h.queue.clone())
}

#[tokio::test]
async fn resolved_token_without_redirect_config_never_navigates() {
    let log = CallLog::default();
    let h = harness(MockProvider::resolving(user("u1"), log.clone()), log, "/dashboard", Some("tok"));

    let handle = sync(&h, SyncConfig::default()).start(MountSignal::new()).await;

    assert_eq!(handle.bootstrap_outcome(), BootstrapOutcome::Resolved);
    assert_eq!(handle.state().user.get(), Some(User::new(json!({ "id": "u1" }))));
    assert!(handle.guard().is_none());
    assert_eq!(h.queue.flush(), 0);
    assert!(h.nav.history().is_empty());
    handle.shutdown();
}

#[tokio::test]
async fn failed_token_with_login_config_redirects_once() {
    let log = CallLog::default();
    let provider = MockProvider::failing(ProviderError::Request("boom".into()), log.clone());
    let h = harness(provider, log, "/dashboard", Some("tok"));

    let handle = sync(&h, SyncConfig::default().with_login_path("/login")).start(MountSignal::new()).await;

    assert_eq!(handle.bootstrap_outcome(), BootstrapOutcome::Cleared);
    assert!(h.state.user.get().is_none());
    assert!(h.state.token.get().is_none());
    // Deferred, not synchronous.
    assert!(h.nav.history().is_empty());

    wait_until(|| h.nav.history() == ["/login"]).await;
    assert_eq!(handle.queue().pending(), 0);
    h.state.user.set(None);
    tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
    assert_eq!(h.nav.history(), vec!["/login".to_owned()]);
    handle.shutdown();
}

#[tokio::test]
async fn relay_waits_for_mount_before_subscribing() {
    let log = CallLog::default();
    let h = harness(MockProvider::resolving(user("u1"), log.clone()), log, "/", None);
    let mounted = MountSignal::new();

    let handle = sync(&h, SyncConfig::default()).start(mounted.clone()).await;
    tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
    assert_eq!(h.log.count("subscribe"), 0);
    assert_eq!(h.provider.events.subscriber_count(), 0);

    mounted.mark_mounted();
    wait_until(|| h.provider.events.subscriber_count() == 1).await;
    assert_eq!(h.log.count("subscribe"), 1);
    assert!(handle.is_relay_running());
    handle.shutdown();
}

#[tokio::test]
async fn relayed_sign_out_clears_user_and_triggers_guard() {
    let log = CallLog::default();
    let h = harness(MockProvider::resolving(user("u1"), log.clone()), log, "/dashboard", Some("tok"));
    let mounted = MountSignal::new();
    mounted.mark_mounted();

    let handle = sync(&h, SyncConfig::default().with_login_path("/login")).start(mounted).await;
    assert_eq!(h.queue.pending(), 0);
    wait_until(|| h.provider.events.subscriber_count() == 1).await;

    // Provider now reports no user.
    h.provider.set_current(Ok(None));
    h.provider.events.emit(AuthStateChange::new(AuthChangeEvent::SignedOut, None)).await;
    wait_until(|| h.log.count("get_user") == 1 && !h.state.has_user()).await;

    assert_eq!(h.store.bodies(), vec![json!({ "event": "SIGNED_OUT", "session": null })]);
    wait_until(|| h.nav.history() == ["/login"]).await;
    handle.shutdown();
}

#[tokio::test]
async fn shutdown_unsubscribes_and_removes_guard() {
    let log = CallLog::default();
    let h = harness(MockProvider::resolving(user("u1"), log.clone()), log, "/dashboard", Some("tok"));
    let mounted = MountSignal::new();
    mounted.mark_mounted();

    let handle = sync(&h, SyncConfig::default().with_login_path("/login")).start(mounted).await;
    wait_until(|| h.provider.events.subscriber_count() == 1).await;
    assert_eq!(h.state.user.watcher_count(), 1);

    handle.shutdown();
    wait_until(|| h.provider.events.subscriber_count() == 0).await;
    assert_eq!(h.state.user.watcher_count(), 0);
}

#[tokio::test]
async fn shutdown_stops_queue_runner() {
    let log = CallLog::default();
    let h = harness(MockProvider::resolving(user("u1"), log.clone()), log, "/", None);

    let handle = sync(&h, SyncConfig::default()).start(MountSignal::new()).await;
    handle.shutdown();
    tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;

    let nav = Arc::clone(&h.nav);
    h.queue.defer("test", move || nav.navigate_to("/later"));
    tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
    assert_eq!(h.queue.pending(), 1);
    assert!(h.nav.history().is_empty());
}
