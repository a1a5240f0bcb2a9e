use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tempfile::TempDir;

use super::computer::{ComputerLogin, ComputerSetup};
use super::handshake::apply;
use crate::config::Settings;
use crate::context::Context;
use crate::error::KioskError;
use crate::escalation::tests::RecordingHost;
use crate::host::HostMessage;
use crate::protocol::{HandshakeClient, HandshakeResponse};
use crate::scheduler::{Action, Step, TickContext};
use crate::session::{SessionDocument, SessionStore};
use crate::timer;

// ─── Fixtures ─────────────────────────────────────────────────────────────

struct Fixture {
    ctx: Arc<Context>,
    host: Arc<RecordingHost>,
    _dir: TempDir,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let host = Arc::new(RecordingHost::default());
    let mut settings = Settings::default();
    settings.debug.interrupt_with_dialog = true;
    let ctx = Context::from_parts(
        settings,
        SessionStore::at_root(dir.path()),
        HandshakeClient::new("http://127.0.0.1:9/handshake").unwrap(),
        host.clone(),
    );
    Fixture {
        ctx: Arc::new(ctx),
        host,
        _dir: dir,
    }
}

fn doc(v: Value) -> SessionDocument {
    v.as_object().cloned().unwrap()
}

fn response(v: Value) -> crate::Result<HandshakeResponse> {
    HandshakeResponse::parse(&v.to_string())
}

fn run(f: &Fixture, sent: &SessionDocument, body: Value) -> (Step, TickContext) {
    let mut cx = TickContext::new(Instant::now());
    let step = apply(&f.ctx, sent, response(body), &mut cx);
    (step, cx)
}

// ─── Directives ───────────────────────────────────────────────────────────

#[test]
fn save_persists_file_and_queues_one_pause() {
    let f = fixture();
    let (step, cx) = run(
        &f,
        &SessionDocument::new(),
        json!({"output": {"action": "SAVE", "file": {"computerId": "X"}}}),
    );
    assert!(matches!(step, Step::Complete));
    assert_eq!(cx.enqueued_names(), vec!["pause"]);
    assert!(!cx.reset_requested());
    assert_eq!(f.ctx.store.read(), doc(json!({"computerId": "X"})));
}

/// RESET carries a replacement document exactly like SAVE. Whether it was
/// meant to clear extra local state first is unresolved; both behave the same.
#[test]
fn reset_behaves_like_save() {
    let f = fixture();
    f.ctx
        .store
        .write(&doc(json!({"computerId": "OLD", "stale": true})))
        .unwrap();
    let (step, cx) = run(
        &f,
        &SessionDocument::new(),
        json!({"output": {"action": "RESET", "file": {"computerId": "NEW"}}}),
    );
    assert!(matches!(step, Step::Complete));
    assert_eq!(cx.enqueued_names(), vec!["pause"]);
    assert_eq!(f.ctx.store.read(), doc(json!({"computerId": "NEW"})));
}

#[test]
fn setup_is_skipped_when_computer_id_present() {
    let f = fixture();
    let sent = doc(json!({"computerId": "PC-7"}));
    let (step, cx) = run(&f, &sent, json!({"output": {"action": "SETUP"}}));
    assert!(matches!(step, Step::Complete));
    assert!(cx.enqueued_names().is_empty());
}

#[test]
fn setup_queues_pause_then_setup() {
    let f = fixture();
    let (step, cx) = run(
        &f,
        &SessionDocument::new(),
        json!({"output": {"action": "SETUP", "site": "lab-3"}}),
    );
    assert!(matches!(step, Step::Complete));
    assert_eq!(cx.enqueued_names(), vec!["pause", "computer_setup"]);
}

#[test]
fn login_queues_pause_then_login() {
    let f = fixture();
    let (step, cx) = run(
        &f,
        &doc(json!({"computerId": "PC-7"})),
        json!({"output": {"action": "LOGIN"}}),
    );
    assert!(matches!(step, Step::Complete));
    assert_eq!(cx.enqueued_names(), vec!["pause", "computer_login"]);
}

#[test]
fn sleep_queues_a_pause() {
    let f = fixture();
    let (step, cx) = run(
        &f,
        &SessionDocument::new(),
        json!({"output": {"action": "SLEEP", "pattern": "[0,10,0]"}}),
    );
    assert!(matches!(step, Step::Complete));
    assert_eq!(cx.enqueued_names(), vec!["pause"]);
}

#[test]
fn unknown_directive_keeps_polling() {
    let f = fixture();
    for output in [json!({"action": "NOTHING"}), json!({})] {
        let (step, cx) = run(&f, &SessionDocument::new(), json!({ "output": output }));
        assert!(matches!(step, Step::Continue));
        assert!(cx.enqueued_names().is_empty());
        assert!(!cx.reset_requested());
    }
    assert_eq!(f.ctx.escalation.count(), 0);
}

#[test]
fn abort_quits_the_application() {
    let f = fixture();
    assert!(f.ctx.prevent_quit());
    let (step, cx) = run(
        &f,
        &SessionDocument::new(),
        json!({"output": {"action": "ABORT", "message": "exam revoked"}}),
    );
    assert!(matches!(step, Step::Complete));
    assert!(cx.enqueued_names().is_empty());
    assert!(!f.ctx.prevent_quit());
    assert_eq!(f.host.calls(), vec!["quit"]);
}

#[test]
fn timers_apply_before_dispatch() {
    let f = fixture();
    let (_, _) = run(
        &f,
        &SessionDocument::new(),
        json!({
            "output": {"action": "IDLE"},
            "timers": {"breathe": {"pattern": [0, 0, 10], "value": 1}}
        }),
    );
    let timers = f.ctx.timers();
    assert_eq!(timers.get(timer::BREATHE), Some(Duration::from_millis(10)));
    assert_eq!(timers.get(timer::CALLOUT), None);
}

// ─── Failures ─────────────────────────────────────────────────────────────

#[test]
fn transport_failure_escalates_once_and_resets() {
    let f = fixture();
    let mut cx = TickContext::new(Instant::now());
    let err = KioskError::Status {
        status: 502,
        url: "http://127.0.0.1:9/handshake".into(),
    };
    let step = apply(&f.ctx, &SessionDocument::new(), Err(err), &mut cx);

    assert!(matches!(step, Step::Complete));
    assert!(cx.reset_requested());
    assert_eq!(f.ctx.escalation.count(), 1);
    let calls = f.host.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("HTTP 502"));
}

#[test]
fn malformed_directive_escalates_and_resets() {
    let f = fixture();
    let (step, cx) = run(
        &f,
        &SessionDocument::new(),
        json!({"output": {"action": "SAVE"}}),
    );
    assert!(matches!(step, Step::Complete));
    assert!(cx.reset_requested());
    assert_eq!(f.ctx.escalation.count(), 1);
}

#[test]
fn overflowing_timer_push_escalates_and_keeps_timers() {
    let f = fixture();
    let before = f.ctx.timers();
    let (step, cx) = run(
        &f,
        &SessionDocument::new(),
        json!({
            "output": {"action": "SAVE", "file": {"computerId": "X"}},
            "timers": {"breathe": {"pattern": [18446744073709551615u64, 1, 0]}}
        }),
    );
    assert!(matches!(step, Step::Complete));
    assert!(cx.reset_requested());
    assert_eq!(f.ctx.escalation.count(), 1);
    assert_eq!(f.ctx.timers(), before);
    assert!(f.ctx.store.read().is_empty());
}

#[test]
fn failed_session_write_escalates() {
    let f = fixture();
    // A directory where the document should be makes the rename fail.
    std::fs::create_dir_all(f.ctx.store.path()).unwrap();
    let (_, cx) = run(
        &f,
        &SessionDocument::new(),
        json!({"output": {"action": "SAVE", "file": {"computerId": "X"}}}),
    );
    assert!(cx.reset_requested());
    assert_eq!(f.ctx.escalation.count(), 1);
}

// ─── Setup / Login ────────────────────────────────────────────────────────

#[test]
fn setup_shows_window_and_finishes_on_page_load() {
    let f = fixture();
    let mut setup = ComputerSetup::new(f.ctx.clone(), json!({"action": "SETUP"}));
    let t0 = Instant::now();

    // Messages before the window is up are not consumed.
    assert!(!setup.on_message(&HostMessage::PageLoad { url: "x".into() }));

    let mut cx = TickContext::new(t0);
    assert!(matches!(setup.tick(&mut cx), Step::Continue));
    assert_eq!(f.host.calls(), vec!["show"]);

    let mut cx = TickContext::new(t0 + Duration::from_millis(10));
    assert!(matches!(setup.tick(&mut cx), Step::Continue));

    assert!(setup.on_message(&HostMessage::PageLoad {
        url: "file:///setup.html".into()
    }));
    let mut cx = TickContext::new(t0 + Duration::from_millis(20));
    assert!(matches!(setup.tick(&mut cx), Step::Complete));
    assert_eq!(cx.enqueued_names(), vec!["handshake"]);
}

#[test]
fn login_gives_up_waiting_after_callout() {
    let f = fixture();
    let mut login = ComputerLogin::new(f.ctx.clone(), json!({"action": "LOGIN"}));
    let t0 = Instant::now();

    let mut cx = TickContext::new(t0);
    assert!(matches!(login.tick(&mut cx), Step::Continue));

    let callout = f.ctx.timer(timer::CALLOUT, Duration::ZERO);
    let mut cx = TickContext::new(t0 + callout);
    assert!(matches!(login.tick(&mut cx), Step::Complete));
    assert_eq!(cx.enqueued_names(), vec!["handshake"]);
    assert_eq!(login.payload()["action"], "LOGIN");
}
