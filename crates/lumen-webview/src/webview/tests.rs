//! Lifecycle, thread-affinity and bind tests against the in-process engine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, Weak};
use std::thread;
use std::time::Duration;

use lumen_common::{LifecycleState, LumenError, PlatformError, RunMode, SizeHint};
use lumen_native::testing::{FakeEngine, NativeCall};
use lumen_native::{NativeApi, WindowHandle};
use lumen_platform::{UnsupportedAdapter, WindowAdapter};

use super::Webview;
use crate::hook::{on_termination_signal, SignalAction};
use crate::scripts::wrap_init_script;
use crate::WebviewBuilder;

const WAIT: Duration = Duration::from_secs(5);

fn try_build(fake: &Arc<FakeEngine>, builder: WebviewBuilder) -> Result<Webview, LumenError> {
    builder
        .window_adapter(Arc::new(UnsupportedAdapter))
        .shutdown_hook(false)
        .build_with(Arc::clone(fake) as Arc<dyn NativeApi>)
}

fn build(fake: &Arc<FakeEngine>, builder: WebviewBuilder) -> Webview {
    match try_build(fake, builder) {
        Ok(webview) => webview,
        Err(e) => panic!("build failed: {e}"),
    }
}

fn background() -> WebviewBuilder {
    WebviewBuilder::new().run_mode(RunMode::Background)
}

fn position(calls: &[NativeCall], wanted: &NativeCall) -> usize {
    calls
        .iter()
        .position(|c| c == wanted)
        .unwrap_or_else(|| panic!("{wanted:?} not in {calls:?}"))
}

// -- construction --

#[test]
fn blank_page_and_default_size_when_nothing_configured() {
    let fake = Arc::new(FakeEngine::new());
    let _webview = build(&fake, WebviewBuilder::new());
    assert_eq!(
        fake.calls(),
        vec![
            NativeCall::Create {
                debug: false,
                has_parent: false
            },
            NativeCall::SetSize {
                width: 800,
                height: 600,
                hint: SizeHint::None
            },
            NativeCall::Navigate("about:blank".into()),
        ]
    );
}

#[test]
fn url_wins_over_html_and_title_is_applied() {
    let fake = Arc::new(FakeEngine::new());
    let _webview = build(
        &fake,
        WebviewBuilder::new()
            .title("Docs")
            .size(1024, 768)
            .developer_tools(true)
            .html("<p>ignored</p>")
            .url("https://example.com"),
    );
    assert_eq!(
        fake.calls(),
        vec![
            NativeCall::Create {
                debug: true,
                has_parent: false
            },
            NativeCall::SetTitle("Docs".into()),
            NativeCall::SetSize {
                width: 1024,
                height: 768,
                hint: SizeHint::None
            },
            NativeCall::Navigate("https://example.com".into()),
        ]
    );
}

#[test]
fn parent_window_is_passed_to_create() {
    let fake = Arc::new(FakeEngine::new());
    let parent = WindowHandle::from_raw(0x3000 as *mut std::ffi::c_void);
    let _webview = build(&fake, WebviewBuilder::new().parent_window(parent));
    assert_eq!(
        fake.calls()[0],
        NativeCall::Create {
            debug: false,
            has_parent: true
        }
    );
}

#[test]
fn null_engine_is_creation_failed() {
    let fake = Arc::new(FakeEngine::new());
    fake.fail_create();
    match try_build(&fake, WebviewBuilder::new()) {
        Err(LumenError::CreationFailed(msg)) => assert!(msg.contains("webview_create")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("build should fail"),
    }
}

#[test]
fn null_engine_in_background_mode_is_creation_failed() {
    let fake = Arc::new(FakeEngine::new());
    fake.fail_create();
    assert!(matches!(
        try_build(&fake, background()),
        Err(LumenError::CreationFailed(_))
    ));
}

#[test]
fn failed_initial_configuration_destroys_the_engine() {
    let fake = Arc::new(FakeEngine::new());
    fake.fail_on("navigate");
    assert!(matches!(
        try_build(&fake, WebviewBuilder::new()),
        Err(LumenError::NativeFault(_))
    ));
    assert_eq!(fake.count("destroy"), 1);
}

#[test]
fn version_is_read_from_the_engine() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    assert_eq!(webview.version().unwrap().version_number, "0.12.0");
}

// -- blocking lifecycle --

#[test]
fn blocking_run_destroys_then_terminates_once() {
    let fake = Arc::new(FakeEngine::returning_immediately());
    let webview = build(&fake, WebviewBuilder::new().html("<h1>Hi</h1>"));
    assert_eq!(webview.state(), LifecycleState::Created);

    webview.run().unwrap();

    assert_eq!(webview.state(), LifecycleState::Closed);
    let calls = fake.calls();
    assert!(calls.contains(&NativeCall::SetHtml("<h1>Hi</h1>".into())));
    assert_eq!(fake.count("destroy"), 1);
    assert_eq!(fake.count("terminate"), 1);
    let run = position(&calls, &NativeCall::Run);
    let destroy = position(&calls, &NativeCall::Destroy);
    let terminate = position(&calls, &NativeCall::Terminate);
    assert!(run < destroy && destroy < terminate);
}

#[test]
fn run_twice_enters_the_loop_once() {
    let fake = Arc::new(FakeEngine::returning_immediately());
    let webview = build(&fake, WebviewBuilder::new());
    webview.run().unwrap();
    webview.run().unwrap();
    assert_eq!(fake.count("run"), 1);
    assert_eq!(fake.count("destroy"), 1);
    assert_eq!(fake.count("terminate"), 1);
}

#[test]
fn run_from_another_thread_is_rejected() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    let result = thread::scope(|s| s.spawn(|| webview.run()).join().unwrap());
    assert!(matches!(result, Err(LumenError::WrongThread("run"))));
    assert_eq!(fake.count("run"), 0);
}

#[test]
fn close_before_run_skips_the_loop() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    thread::scope(|s| {
        s.spawn(|| webview.close().unwrap());
    });

    webview.run().unwrap();

    assert_eq!(webview.state(), LifecycleState::Closed);
    assert_eq!(fake.count("run"), 0);
    assert_eq!(fake.count("destroy"), 1);
    assert_eq!(fake.count("terminate"), 0);
}

#[test]
fn wait_closed_on_owner_before_run_is_rejected() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    assert!(matches!(
        webview.wait_closed(),
        Err(LumenError::WrongThread("wait_closed"))
    ));
}

#[test]
fn loop_failure_still_tears_down() {
    let fake = Arc::new(FakeEngine::returning_immediately());
    fake.fail_on("run");
    let webview = build(&fake, WebviewBuilder::new());
    assert!(matches!(webview.run(), Err(LumenError::NativeFault(_))));
    assert_eq!(webview.state(), LifecycleState::Closed);
    assert_eq!(fake.count("destroy"), 1);
    assert_eq!(fake.count("terminate"), 1);
}

#[test]
fn operations_after_close_are_refused() {
    let fake = Arc::new(FakeEngine::returning_immediately());
    let webview = build(&fake, WebviewBuilder::new());
    webview.run().unwrap();

    assert!(matches!(webview.set_title("late"), Err(LumenError::Closed)));
    assert!(matches!(webview.eval("1"), Err(LumenError::Closed)));
    assert!(matches!(
        webview.bind("late", |_| Ok(None)),
        Err(LumenError::Closed)
    ));
    assert!(matches!(webview.window(), Err(LumenError::Closed)));
    assert_eq!(fake.count("set_title"), 0);
}

#[test]
fn dropping_an_unrun_webview_on_its_owner_destroys_it() {
    let fake = Arc::new(FakeEngine::new());
    drop(build(&fake, WebviewBuilder::new()));
    assert_eq!(fake.count("destroy"), 1);
    assert_eq!(fake.count("terminate"), 0);
}

/// Build a blocking webview on a fresh thread that then runs it.
fn spawn_blocking_owner(
    fake: &Arc<FakeEngine>,
) -> (Arc<Webview>, thread::JoinHandle<thread::ThreadId>) {
    let (tx, rx) = mpsc::channel();
    let owner_fake = Arc::clone(fake);
    let owner = thread::spawn(move || {
        let webview = Arc::new(build(&owner_fake, WebviewBuilder::new()));
        tx.send(Arc::clone(&webview)).unwrap();
        webview.run().unwrap();
        thread::current().id()
    });
    let webview = rx.recv_timeout(WAIT).unwrap();
    assert!(fake.wait_until_running(WAIT));
    (webview, owner)
}

#[test]
fn close_from_another_thread_is_marshalled_onto_the_loop() {
    let fake = Arc::new(FakeEngine::new());
    let (webview, owner) = spawn_blocking_owner(&fake);
    assert_eq!(webview.state(), LifecycleState::Running);

    webview.close().unwrap();
    let owner_id = owner.join().unwrap();

    assert_eq!(webview.state(), LifecycleState::Closed);
    assert_eq!(fake.loop_thread(), Some(owner_id));
    assert!(fake.count("dispatch") >= 1);
    assert_eq!(fake.count("terminate"), 1);
    assert_eq!(fake.count("destroy"), 1);
}

// -- background lifecycle --

#[test]
fn background_close_before_run_destroys_without_terminate() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, background());
    assert_eq!(webview.state(), LifecycleState::AwaitingStart);

    webview.close().unwrap();
    assert!(webview.wait_closed_timeout(WAIT).unwrap());

    assert_eq!(fake.count("run"), 0);
    assert_eq!(fake.count("destroy"), 1);
    assert_eq!(fake.count("terminate"), 0);
    assert!(fake.loop_thread().is_none());

    webview.run().unwrap();
    assert_eq!(fake.count("run"), 0);
}

#[test]
fn background_run_starts_loop_on_owner_thread() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, background().thread_name("lumen-test-owner"));
    assert!(!webview.is_owner_thread());

    webview.run().unwrap();
    assert!(fake.wait_until_running(WAIT));
    assert_eq!(webview.state(), LifecycleState::Running);
    assert_ne!(fake.loop_thread(), Some(thread::current().id()));

    webview.close().unwrap();
    assert!(webview.wait_closed_timeout(WAIT).unwrap());
}

#[test]
fn close_twice_terminates_once() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, background());
    webview.run().unwrap();
    assert!(fake.wait_until_running(WAIT));

    webview.close().unwrap();
    webview.close().unwrap();
    assert!(webview.wait_closed_timeout(WAIT).unwrap());
    webview.close().unwrap();
    webview.shutdown();

    assert_eq!(fake.count("terminate"), 1);
    assert_eq!(fake.count("destroy"), 1);
}

#[test]
fn background_run_twice_enters_the_loop_once() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, background());
    webview.run().unwrap();
    webview.run().unwrap();
    assert!(fake.wait_until_running(WAIT));
    webview.run().unwrap();

    webview.close().unwrap();
    webview.wait_closed().unwrap();
    assert_eq!(fake.count("run"), 1);
}

#[test]
fn shutdown_stops_a_running_loop() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, background());
    webview.run().unwrap();
    assert!(fake.wait_until_running(WAIT));

    webview.shutdown();
    assert!(webview.wait_closed_timeout(WAIT).unwrap());
    webview.shutdown();
    assert_eq!(fake.count("terminate"), 1);
}

#[test]
fn shutdown_terminates_while_the_loop_is_busy() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, background());
    webview.run().unwrap();
    assert!(fake.wait_until_running(WAIT));

    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    webview
        .dispatch(move || {
            entered_tx.send(()).unwrap();
            let _ = release_rx.recv_timeout(WAIT);
        })
        .unwrap();
    entered_rx.recv_timeout(WAIT).unwrap();

    webview.shutdown();
    assert_eq!(fake.count("terminate"), 1);
    assert_eq!(webview.state(), LifecycleState::Running);

    release_tx.send(()).unwrap();
    assert!(webview.wait_closed_timeout(WAIT).unwrap());
    assert_eq!(fake.count("terminate"), 1);
    assert_eq!(fake.count("destroy"), 1);
}

#[test]
fn termination_signal_shuts_down_a_running_webview() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, background());
    webview.run().unwrap();
    assert!(fake.wait_until_running(WAIT));

    let core = Arc::downgrade(&webview.core);
    assert_eq!(on_termination_signal(&core, false), SignalAction::Wait);
    assert!(webview.wait_closed_timeout(WAIT).unwrap());
    assert_eq!(fake.count("terminate"), 1);

    assert_eq!(on_termination_signal(&core, true), SignalAction::Exit);
    assert_eq!(on_termination_signal(&Weak::new(), false), SignalAction::Exit);
}

#[test]
fn termination_signal_before_run_skips_the_loop() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    let core = Arc::downgrade(&webview.core);
    assert_eq!(on_termination_signal(&core, false), SignalAction::Wait);

    webview.run().unwrap();
    assert_eq!(fake.count("run"), 0);
    assert_eq!(webview.state(), LifecycleState::Closed);
}

#[cfg(unix)]
#[test]
fn shutdown_hook_is_installed_by_default_and_released_on_drop() {
    let fake = Arc::new(FakeEngine::new());
    let webview = WebviewBuilder::new()
        .window_adapter(Arc::new(UnsupportedAdapter))
        .run_mode(RunMode::Background)
        .build_with(Arc::clone(&fake) as Arc<dyn NativeApi>)
        .unwrap_or_else(|e| panic!("build failed: {e}"));
    assert!(webview.has_shutdown_hook());

    webview.run().unwrap();
    assert!(fake.wait_until_running(WAIT));
    webview.close().unwrap();
    assert!(webview.wait_closed_timeout(WAIT).unwrap());
    drop(webview);
    assert_eq!(fake.count("destroy"), 1);
}

#[test]
fn shutdown_hook_can_be_disabled() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    assert!(!webview.has_shutdown_hook());
}

#[test]
fn dropping_an_unstarted_background_webview_cancels_it() {
    let fake = Arc::new(FakeEngine::new());
    drop(build(&fake, background()));
    assert!(fake.wait_for_calls(WAIT, |calls| calls.contains(&NativeCall::Destroy)));
    assert_eq!(fake.count("run"), 0);
    assert_eq!(fake.count("terminate"), 0);
}

#[test]
fn operations_before_start_run_in_order_before_the_loop() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, background());
    webview.set_title("queued").unwrap();
    webview.eval("window.ready = true;").unwrap();
    assert_eq!(fake.count("set_title"), 0);
    assert_eq!(fake.count("eval"), 0);

    webview.run().unwrap();
    assert!(fake.wait_until_running(WAIT));

    let calls = fake.calls();
    let title = position(&calls, &NativeCall::SetTitle("queued".into()));
    let eval = calls
        .iter()
        .position(|c| matches!(c, NativeCall::Eval(js) if js.contains("window.ready = true;")))
        .unwrap();
    let run = position(&calls, &NativeCall::Run);
    assert!(title < eval && eval < run);

    webview.close().unwrap();
    webview.wait_closed().unwrap();
}

#[test]
fn live_dispatch_preserves_submission_order() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, background());
    webview.run().unwrap();
    assert!(fake.wait_until_running(WAIT));

    let order = Arc::new(Mutex::new(Vec::new()));
    for i in 0..10 {
        let order = Arc::clone(&order);
        webview
            .dispatch(move || order.lock().unwrap().push(i))
            .unwrap();
    }
    webview.close().unwrap();
    webview.wait_closed().unwrap();

    assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
}

#[test]
fn operations_after_background_close_are_refused() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, background());
    webview.close().unwrap();
    webview.wait_closed().unwrap();
    assert!(matches!(webview.set_title("late"), Err(LumenError::Closed)));
    assert!(matches!(webview.dispatch(|| {}), Err(LumenError::Closed)));
}

// -- thread affinity --

#[test]
fn owner_thread_operations_run_inline() {
    let fake = Arc::new(FakeEngine::new());
    let webview = Arc::new(build(&fake, WebviewBuilder::new()));
    let depth = Arc::new(AtomicUsize::new(0));
    let max_depth = Arc::new(AtomicUsize::new(0));

    let inner_webview = Arc::clone(&webview);
    let (outer_depth, outer_max) = (Arc::clone(&depth), Arc::clone(&max_depth));
    webview
        .dispatch(move || {
            let now = outer_depth.fetch_add(1, Ordering::SeqCst) + 1;
            outer_max.fetch_max(now, Ordering::SeqCst);
            let (d, m) = (Arc::clone(&outer_depth), Arc::clone(&outer_max));
            inner_webview
                .dispatch(move || {
                    let now = d.fetch_add(1, Ordering::SeqCst) + 1;
                    m.fetch_max(now, Ordering::SeqCst);
                    d.fetch_sub(1, Ordering::SeqCst);
                })
                .unwrap();
            outer_depth.fetch_sub(1, Ordering::SeqCst);
        })
        .unwrap();

    assert_eq!(max_depth.load(Ordering::SeqCst), 2);
    assert_eq!(depth.load(Ordering::SeqCst), 0);
    assert_eq!(fake.count("dispatch"), 0);
}

#[test]
fn other_thread_operations_run_on_the_owner() {
    let fake = Arc::new(FakeEngine::new());
    let (webview, owner) = spawn_blocking_owner(&fake);
    assert!(!webview.is_owner_thread());

    let (tx, rx) = mpsc::channel();
    webview
        .dispatch(move || tx.send(thread::current().id()).unwrap())
        .unwrap();
    let ran_on = rx.recv_timeout(WAIT).unwrap();

    webview.set_title("from elsewhere").unwrap();
    webview.close().unwrap();
    let owner_id = owner.join().unwrap();

    assert_eq!(ran_on, owner_id);
    assert_ne!(ran_on, thread::current().id());
    assert!(fake
        .calls()
        .contains(&NativeCall::SetTitle("from elsewhere".into())));
}

#[test]
fn wait_closed_from_the_background_loop_is_rejected() {
    let fake = Arc::new(FakeEngine::new());
    let webview = Arc::new(build(&fake, background()));
    webview.run().unwrap();
    assert!(fake.wait_until_running(WAIT));

    let (tx, rx) = mpsc::channel();
    let inner = Arc::clone(&webview);
    webview
        .dispatch(move || tx.send(inner.wait_closed_timeout(WAIT)).unwrap())
        .unwrap();
    let result = rx.recv_timeout(WAIT).unwrap();
    assert!(matches!(result, Err(LumenError::WrongThread("wait_closed"))));

    webview.close().unwrap();
    assert!(webview.wait_closed_timeout(WAIT).unwrap());
}

// -- window operations --

#[test]
fn last_size_hint_wins() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    webview.set_size_with_hint(640, 480, SizeHint::None).unwrap();
    webview.set_size_with_hint(640, 480, SizeHint::Fixed).unwrap();
    assert_eq!(fake.last_size_hint(), Some(SizeHint::Fixed));

    webview.set_min_size(320, 240).unwrap();
    assert_eq!(fake.last_size_hint(), Some(SizeHint::Min));
    webview.set_max_size(1920, 1080).unwrap();
    assert_eq!(fake.last_size_hint(), Some(SizeHint::Max));
}

#[test]
fn native_fault_reaches_the_owner_caller() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    fake.fail_on("set_title");
    assert!(matches!(
        webview.set_title("x"),
        Err(LumenError::NativeFault(_))
    ));
}

#[test]
fn html_and_navigation_go_to_the_engine() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    webview.set_html(Some("<p>a</p>")).unwrap();
    webview.set_html(None).unwrap();
    webview.navigate(None).unwrap();
    let calls = fake.calls();
    assert!(calls.ends_with(&[
        NativeCall::SetHtml("<p>a</p>".into()),
        NativeCall::SetHtml(String::new()),
        NativeCall::Navigate("about:blank".into()),
    ]));
}

#[derive(Default)]
struct RecordingAdapter {
    calls: Mutex<Vec<(String, usize)>>,
}

impl RecordingAdapter {
    fn record(&self, op: &str, window: WindowHandle) {
        self.calls
            .lock()
            .unwrap()
            .push((op.to_string(), window.as_ptr() as usize));
    }
}

impl WindowAdapter for RecordingAdapter {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn set_dark_appearance(&self, window: WindowHandle, dark: bool) -> Result<(), PlatformError> {
        self.record(&format!("dark:{dark}"), window);
        Ok(())
    }

    fn maximize(&self, window: WindowHandle) -> Result<(), PlatformError> {
        self.record("maximize", window);
        Ok(())
    }

    fn fullscreen(&self, window: WindowHandle) -> Result<(), PlatformError> {
        self.record("fullscreen", window);
        Ok(())
    }
}

#[test]
fn window_cosmetics_go_through_the_adapter() {
    let fake = Arc::new(FakeEngine::new());
    let adapter = Arc::new(RecordingAdapter::default());
    let webview = WebviewBuilder::new()
        .window_adapter(Arc::clone(&adapter) as Arc<dyn WindowAdapter>)
        .shutdown_hook(false)
        .build_with(Arc::clone(&fake) as Arc<dyn NativeApi>)
        .unwrap_or_else(|e| panic!("build failed: {e}"));

    webview.maximize().unwrap();
    webview.set_dark_appearance(true).unwrap();
    webview.fullscreen().unwrap();

    assert_eq!(
        *adapter.calls.lock().unwrap(),
        vec![
            ("maximize".to_string(), 0x2000),
            ("dark:true".to_string(), 0x2000),
            ("fullscreen".to_string(), 0x2000),
        ]
    );
}

#[test]
fn unsupported_cosmetics_report_platform_error() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    assert!(matches!(
        webview.maximize(),
        Err(LumenError::Platform(PlatformError::NotSupported(_)))
    ));
}

// -- scripts --

#[test]
fn init_script_is_wrapped_with_top_frame_guard() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    webview.set_init_script_top_only("doStuff();").unwrap();

    let expected = wrap_init_script("doStuff();", false);
    assert_eq!(fake.calls().last(), Some(&NativeCall::Init(expected.clone())));
    assert!(expected.contains("window.top === window.self || false"));
    assert!(expected.contains("\"doStuff();\""));
}

#[test]
fn eval_is_queued_even_on_the_owner() {
    let fake = Arc::new(FakeEngine::returning_immediately());
    let webview = build(&fake, WebviewBuilder::new());
    webview.eval("window.ready = true;").unwrap();
    assert_eq!(fake.count("eval"), 0);

    webview.run().unwrap();

    let calls = fake.calls();
    let eval = calls
        .iter()
        .position(|c| {
            matches!(c, NativeCall::Eval(js)
                if js.contains("window.ready = true;")
                    && js.contains("whilst evaluating script:"))
        })
        .unwrap();
    assert!(eval < position(&calls, &NativeCall::Run));
}

// -- bindings --

#[test]
fn echo_binding_returns_payload() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    webview
        .bind("echo", |payload| Ok(Some(payload.to_string())))
        .unwrap();
    assert!(fake.is_bound("echo"));

    assert!(fake.invoke_binding("echo", 7, "[1,2]"));
    assert_eq!(fake.returns(), vec![(7, false, "[1,2]".to_string())]);
}

#[test]
fn failing_binding_rejects_with_escaped_message() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    webview.bind("boom", |_| Err("x".into())).unwrap();

    assert!(fake.invoke_binding("boom", 3, "[]"));
    assert_eq!(fake.returns(), vec![(3, true, "\"x\"".to_string())]);
}

#[test]
fn error_text_with_quotes_is_json_escaped() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    webview
        .bind("quote", |_| Err("bad \"input\"\nhere".into()))
        .unwrap();

    fake.invoke_binding("quote", 1, "[]");
    let (_, is_error, result) = fake.returns().remove(0);
    assert!(is_error);
    let decoded: String = serde_json::from_str(&result).unwrap();
    assert_eq!(decoded, "bad \"input\"\nhere");
}

#[test]
fn panicking_binding_is_recovered() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    webview.bind("panics", |_| panic!("kaboom")).unwrap();

    assert!(fake.invoke_binding("panics", 4, "[]"));
    assert_eq!(
        fake.returns(),
        vec![(4, true, "\"panicked: kaboom\"".to_string())]
    );
}

#[test]
fn absent_result_becomes_null() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    webview.bind("nothing", |_| Ok(None)).unwrap();
    fake.invoke_binding("nothing", 9, "[]");
    assert_eq!(fake.returns(), vec![(9, false, "null".to_string())]);
}

#[test]
fn payload_and_result_are_forced_safe() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    let seen = Arc::new(Mutex::new(String::new()));
    let sink = Arc::clone(&seen);
    webview
        .bind("greet", move |payload| {
            *sink.lock().unwrap() = payload.to_string();
            Ok(Some("\"héllo\"".into()))
        })
        .unwrap();

    fake.invoke_binding("greet", 2, "[\"Zoë\"]");
    assert_eq!(*seen.lock().unwrap(), "[\"Zo\\u00eb\"]");
    assert_eq!(
        fake.returns(),
        vec![(2, false, "\"h\\u00e9llo\"".to_string())]
    );
}

#[test]
fn invalid_utf8_payload_is_decoded_lossily() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    webview
        .bind("raw", |payload| Ok(Some(payload.to_string())))
        .unwrap();

    assert!(fake.invoke_binding_bytes("raw", 5, b"[\"\xff\"]"));
    assert_eq!(
        fake.returns(),
        vec![(5, false, "[\"\\ufffd\"]".to_string())]
    );
}

#[test]
fn bind_json_decodes_and_encodes() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    webview
        .bind_json("add", |(a, b): (i64, i64)| Ok(a + b))
        .unwrap();

    fake.invoke_binding("add", 1, "[2,3]");
    fake.invoke_binding("add", 2, "[\"two\",3]");
    let returns = fake.returns();
    assert_eq!(returns[0], (1, false, "5".to_string()));
    assert_eq!(returns[1].0, 2);
    assert!(returns[1].1);
    assert!(returns[1].2.contains("invalid type"));
}

#[test]
fn unbind_keeps_slot_until_destroy() {
    let fake = Arc::new(FakeEngine::returning_immediately());
    let webview = build(&fake, WebviewBuilder::new());
    webview.bind("a", |_| Ok(None)).unwrap();
    webview.unbind("a").unwrap();

    assert!(!fake.is_bound("a"));
    assert!(!webview.core.bindings.is_bound("a"));
    assert_eq!(webview.core.bindings.slot_count(), 1);

    webview.run().unwrap();
    assert_eq!(webview.core.bindings.slot_count(), 0);
}

#[test]
fn rebinding_replaces_the_handler() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    webview.bind("v", |_| Ok(Some("1".into()))).unwrap();
    webview.bind("v", |_| Ok(Some("2".into()))).unwrap();

    let calls = fake.calls();
    let unbind = position(&calls, &NativeCall::Unbind("v".into()));
    assert!(unbind > position(&calls, &NativeCall::Bind("v".into())));
    assert_eq!(webview.core.bindings.slot_count(), 2);

    fake.invoke_binding("v", 1, "[]");
    assert_eq!(fake.returns(), vec![(1, false, "2".to_string())]);
}

#[test]
fn failed_native_bind_does_not_register() {
    let fake = Arc::new(FakeEngine::new());
    let webview = build(&fake, WebviewBuilder::new());
    fake.fail_on("bind");
    assert!(webview.bind("x", |_| Ok(None)).is_err());
    assert_eq!(webview.core.bindings.slot_count(), 0);
    assert!(!webview.core.bindings.is_bound("x"));
}
