mod common;

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc, Mutex,
    },
    time::Duration,
};

use common::{current_thread_name, slow_value, Counter, EventLog};
use ret_supervisor::{
    CompletionHook, Message, RetConfig, RetResp, Supervisor, Work, LOOP_THREAD_PREFIX,
};

fn thread_recorder(names: Arc<Mutex<Vec<String>>>) -> CompletionHook {
    Arc::new(move |_resp: &RetResp| names.lock().unwrap().push(current_thread_name()))
}

fn ordered_supervisor(log: &EventLog) -> Supervisor {
    let configured = log.hook("configured");
    Supervisor::with_config(
        RetConfig::builder()
            .with_on_task_complete(move |resp| configured(resp))
            .build(),
    )
}

#[tokio::test]
async fn test_create_task_reuses_ambient_runtime() {
    let names = Arc::new(Mutex::new(Vec::new()));
    let supervisor = Supervisor::with_config(RetConfig::default());

    let task = supervisor
        .create_task(
            Work::raw(slow_value(Duration::from_millis(10), 1)),
            Some(thread_recorder(names.clone())),
            None,
        )
        .unwrap();
    assert!(!task.is_background_owned());

    let resp = task.join().await.unwrap();
    assert_eq!(resp.payload::<u32>(), Some(1));

    let names = names.lock().unwrap();
    assert_eq!(*names, vec![current_thread_name()]);
    assert!(!names[0].starts_with(LOOP_THREAD_PREFIX));
}

#[test]
fn test_create_task_uses_explicit_runtime_without_stopping_it() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let names = Arc::new(Mutex::new(Vec::new()));
    let supervisor = Supervisor::with_config(RetConfig::default());

    let task = supervisor
        .create_task(
            Work::raw(async { Ok::<_, anyhow::Error>("explicit") }),
            Some(thread_recorder(names.clone())),
            Some(runtime.handle().clone()),
        )
        .unwrap();
    assert!(!task.is_background_owned());

    let resp = runtime.block_on(task.join()).unwrap();
    assert_eq!(resp.payload::<&str>(), Some("explicit"));
    assert!(!names.lock().unwrap()[0].starts_with(LOOP_THREAD_PREFIX));

    // Still usable after the task completed.
    assert_eq!(runtime.block_on(async { 40 + 2 }), 42);
}

#[test]
fn test_create_task_without_runtime_spawns_one_background_loop() {
    let names = Arc::new(Mutex::new(Vec::new()));
    let supervisor = Supervisor::with_config(RetConfig::default());

    let task = supervisor
        .create_task(
            Work::raw(slow_value(Duration::from_millis(20), 3)),
            Some(thread_recorder(names.clone())),
            None,
        )
        .unwrap();
    assert!(task.is_background_owned());

    let resp = task.wait().unwrap();
    assert_eq!(resp.payload::<u32>(), Some(3));

    let names = names.lock().unwrap();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with(LOOP_THREAD_PREFIX));
    assert_ne!(names[0], current_thread_name());
}

#[test]
fn test_create_task_inside_entered_runtime_reuses_it() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let _guard = runtime.enter();
    let names = Arc::new(Mutex::new(Vec::new()));

    let task = Supervisor::with_config(RetConfig::default())
        .create_task(
            Work::raw(slow_value(Duration::from_millis(5), 4)),
            Some(thread_recorder(names.clone())),
            None,
        )
        .unwrap();
    assert!(!task.is_background_owned());

    let resp = task.wait().unwrap();
    assert_eq!(resp.payload::<u32>(), Some(4));
    assert!(!names.lock().unwrap()[0].starts_with(LOOP_THREAD_PREFIX));
}

#[test]
fn test_dropped_task_still_stops_its_loop() {
    let (tx, rx) = mpsc::channel();
    let callback: CompletionHook = Arc::new(move |resp: &RetResp| {
        tx.send((current_thread_name(), resp.succeeded())).unwrap();
    });

    let task = Supervisor::with_config(RetConfig::default())
        .create_task(
            Work::raw(slow_value(Duration::from_millis(10), 5)),
            Some(callback),
            None,
        )
        .unwrap();
    assert!(task.is_background_owned());
    let runtime = task.runtime().clone();
    drop(task);

    let (name, succeeded) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(name.starts_with(LOOP_THREAD_PREFIX));
    assert!(succeeded);

    // Once the loop thread exits its runtime is gone, and new work on it is
    // cancelled instead of run.
    let mut stopped = false;
    for _ in 0..500 {
        let spawned = runtime.spawn(async {});
        if futures::executor::block_on(spawned).is_err() {
            stopped = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(stopped, "background loop kept running after its task was dropped");
}

#[test]
fn test_wait_task_spawns_a_loop_per_call() {
    let names = Arc::new(Mutex::new(Vec::new()));
    let supervisor = Supervisor::with_config(RetConfig::default());

    for n in 0..2 {
        let resp = supervisor
            .wait_task(
                Work::raw(slow_value(Duration::from_millis(5), n)),
                Some(thread_recorder(names.clone())),
            )
            .unwrap();
        assert_eq!(resp.payload::<u32>(), Some(n));
    }

    let names = names.lock().unwrap();
    assert_eq!(names.len(), 2);
    assert!(names.iter().all(|name| name.starts_with(LOOP_THREAD_PREFIX)));
    assert_ne!(names[0], names[1]);
}

#[test]
fn test_wait_task_blocks_until_work_settles() {
    let log = EventLog::new();
    let supervisor = ordered_supervisor(&log);
    let work_log = log.clone();

    let resp = supervisor
        .wait_task(
            Work::raw(async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                work_log.push("work");
                Ok::<_, anyhow::Error>(())
            }),
            Some(log.hook("callback")),
        )
        .unwrap();
    log.push("returned");

    assert!(resp.succeeded());
    assert_eq!(log.events(), vec!["work", "callback", "configured", "returned"]);
}

#[test]
fn test_wait_task_failure_yields_failed_envelope() {
    let supervisor = Supervisor::with_config(RetConfig::default());
    let finished = Arc::new(AtomicBool::new(false));
    let flag = finished.clone();

    let resp = supervisor
        .wait_task(
            Work::raw(async move {
                tokio::task::yield_now().await;
                flag.store(true, Ordering::SeqCst);
                Err::<(), _>(anyhow::anyhow!("remote refused"))
            }),
            None,
        )
        .unwrap();

    assert!(finished.load(Ordering::SeqCst));
    assert!(resp.failed());
    assert_eq!(resp.message().to_string(), "remote refused");
    assert!(resp.trace().is_some_and(|t| !t.is_empty()));
}

#[test]
fn test_wait_task_captures_panicking_work() {
    let supervisor = Supervisor::with_config(RetConfig::default());
    let resp = supervisor
        .wait_task(
            Work::raw(async {
                if true {
                    panic!("worker crashed");
                }
                Ok::<(), anyhow::Error>(())
            }),
            None,
        )
        .unwrap();

    assert!(resp.failed());
    assert_eq!(resp.message().to_string(), "worker crashed");
}

#[tokio::test]
async fn test_dispatcher_fires_once_caller_first() {
    let log = EventLog::new();
    let supervisor = ordered_supervisor(&log);
    let caller = Counter::new();
    let counting = caller.hook();
    let caller_log = log.hook("callback");
    let callback: CompletionHook = Arc::new(move |resp: &RetResp| {
        counting(resp);
        caller_log(resp);
    });

    let resp = supervisor
        .create_task(
            Work::raw(slow_value(Duration::from_millis(5), 9)),
            Some(callback),
            None,
        )
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(resp.payload::<u32>(), Some(9));
    assert_eq!(caller.get(), 1);
    assert_eq!(log.events(), vec!["callback", "configured"]);
}

#[tokio::test]
async fn test_callbacks_receive_the_returned_envelope() {
    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    let callback: CompletionHook = Arc::new(move |resp: &RetResp| {
        *sink.lock().unwrap() = Some(resp.to_string());
    });

    let resp = Supervisor::with_config(RetConfig::default())
        .create_task(
            Work::raw(async { Err::<(), _>(anyhow::anyhow!("bad gateway")) }),
            Some(callback),
            None,
        )
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(resp.to_string(), "Failed: bad gateway");
    assert_eq!(seen.lock().unwrap().as_deref(), Some("Failed: bad gateway"));
}

#[test]
fn test_supervised_work_is_not_rewrapped() {
    let log = EventLog::new();
    let supervisor = ordered_supervisor(&log);
    let work = Work::supervised(async {
        RetResp::new(true, Message::Text("pre-built".into()), None, None)
    });
    assert!(work.is_supervised());

    let resp = supervisor.wait_task(work, None).unwrap();

    assert!(resp.succeeded());
    assert_eq!(resp.message().to_string(), "pre-built");
    assert_eq!(log.events(), vec!["configured"]);
}

#[test]
#[should_panic(expected = "callback exploded")]
fn test_callback_panic_reaches_waiting_caller() {
    let callback: CompletionHook = Arc::new(|_: &RetResp| panic!("callback exploded"));
    let _ = Supervisor::with_config(RetConfig::default())
        .wait_task(Work::raw(async { Ok::<_, anyhow::Error>(()) }), Some(callback));
}
