use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use ret_supervisor::{CompletionHook, RetResp, Value};

// Shared ordered log used to assert callback ordering across threads.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

#[allow(unused)]
impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    // Completion hook that logs `name`.
    pub fn hook(&self, name: &'static str) -> CompletionHook {
        let log = self.clone();
        Arc::new(move |_resp: &RetResp| log.push(name))
    }
}

#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

#[allow(unused)]
impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn hook(&self) -> CompletionHook {
        let counter = self.clone();
        Arc::new(move |_resp: &RetResp| counter.bump())
    }
}

#[allow(unused)]
pub fn as_strs(args: &[Value]) -> Vec<&'static str> {
    args.iter()
        .map(|arg| *arg.downcast_ref::<&'static str>().expect("string argument"))
        .collect()
}

#[allow(unused)]
pub fn failing() -> anyhow::Result<u32> {
    anyhow::bail!("Failed")
}

#[allow(unused)]
pub async fn slow_value(delay: Duration, value: u32) -> anyhow::Result<u32> {
    tokio::time::sleep(delay).await;
    Ok(value)
}

#[allow(unused)]
pub fn current_thread_name() -> String {
    std::thread::current()
        .name()
        .unwrap_or("<unnamed>")
        .to_string()
}
