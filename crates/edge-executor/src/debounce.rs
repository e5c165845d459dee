//! Debounced invocation.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Debounce behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceOptions {
    /// Quiet period that ends a burst.
    pub wait: Duration,
    /// Invoke on the first call of a burst.
    pub leading: bool,
    /// Invoke with the latest arguments when the burst settles.
    pub trailing: bool,
    /// Longest a pending call may be deferred under continuous input.
    pub max_wait: Option<Duration>,
}

impl DebounceOptions {
    /// Trailing-only debounce.
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            leading: false,
            trailing: true,
            max_wait: None,
        }
    }

    /// Set leading invocation.
    pub fn with_leading(mut self, leading: bool) -> Self {
        self.leading = leading;
        self
    }

    /// Set trailing invocation.
    pub fn with_trailing(mut self, trailing: bool) -> Self {
        self.trailing = trailing;
        self
    }

    /// Bound the deferral under continuous input.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }
}

type Callback<A> = Box<dyn Fn(A) + Send + Sync>;

#[derive(Debug, Clone, Copy)]
struct Burst {
    /// Start of the current max-wait window.
    started: Instant,
    last_call: Instant,
}

struct State<A> {
    pending: Option<A>,
    burst: Option<Burst>,
    timer: Option<JoinHandle<()>>,
    /// Bumped on cancel/flush so a stale timer exits without firing.
    generation: u64,
}

struct Inner<A> {
    options: DebounceOptions,
    state: Mutex<State<A>>,
    callback: Callback<A>,
}

enum Tick<A> {
    Stop,
    Sleep,
    Fire(Option<A>, bool),
}

/// Coalesces rapid calls into as few invocations as the options allow.
///
/// Timers run on the current Tokio runtime, so `call` must be made from
/// within one. The callback always runs outside the internal lock, either on
/// the caller's task (leading edge, `flush`) or on the timer task.
///
/// Dropping the debouncer cancels any pending invocation.
pub struct Debouncer<A: Send + 'static> {
    inner: Arc<Inner<A>>,
}

impl<A: Send + 'static> Debouncer<A> {
    /// Create a new debouncer.
    pub fn new<F>(options: DebounceOptions, callback: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                options,
                state: Mutex::new(State {
                    pending: None,
                    burst: None,
                    timer: None,
                    generation: 0,
                }),
                callback: Box::new(callback),
            }),
        }
    }

    /// Get the options.
    pub fn options(&self) -> &DebounceOptions {
        &self.inner.options
    }

    /// Record a call. The latest arguments win.
    pub fn call(&self, args: A) {
        let now = Instant::now();
        let leading = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            match state.burst.as_mut() {
                Some(burst) => {
                    burst.last_call = now;
                    state.pending = Some(args);
                    None
                }
                None => {
                    state.burst = Some(Burst {
                        started: now,
                        last_call: now,
                    });
                    let generation = state.generation;
                    state.timer = Some(tokio::spawn(run_timer(self.inner.clone(), generation)));

                    if self.inner.options.leading {
                        Some(args)
                    } else {
                        state.pending = Some(args);
                        None
                    }
                }
            }
        };

        if let Some(args) = leading {
            (self.inner.callback)(args);
        }
    }

    /// Discard any pending invocation.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        state.pending = None;
        reset(&mut state);
    }

    /// Run the pending invocation now. Returns whether one ran.
    pub fn flush(&self) -> bool {
        let pending = {
            let mut state = self.inner.state.lock();
            let pending = state.pending.take();
            reset(&mut state);
            pending
        };

        match pending {
            Some(args) => {
                (self.inner.callback)(args);
                true
            }
            None => false,
        }
    }

    /// Whether an invocation is waiting for its timer.
    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().pending.is_some()
    }
}

impl<A: Send + 'static> Drop for Debouncer<A> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<A: Send + 'static> std::fmt::Debug for Debouncer<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("options", &self.inner.options)
            .field("pending", &self.is_pending())
            .finish()
    }
}

fn reset<A>(state: &mut State<A>) {
    state.generation = state.generation.wrapping_add(1);
    state.burst = None;
    if let Some(timer) = state.timer.take() {
        timer.abort();
    }
}

async fn run_timer<A: Send + 'static>(inner: Arc<Inner<A>>, generation: u64) {
    let options = inner.options;

    loop {
        let deadline = {
            let state = inner.state.lock();
            match state.burst {
                Some(burst) if state.generation == generation => {
                    let settle = burst.last_call + options.wait;
                    match options.max_wait {
                        Some(max_wait) => settle.min(burst.started + max_wait),
                        None => settle,
                    }
                }
                _ => return,
            }
        };

        tokio::time::sleep_until(deadline).await;

        let tick = {
            let mut guard = inner.state.lock();
            let state = &mut *guard;
            let now = Instant::now();
            match state.burst {
                Some(burst) if state.generation == generation => {
                    if now >= burst.last_call + options.wait {
                        // burst settled
                        state.burst = None;
                        state.timer = None;
                        let pending = state.pending.take();
                        Tick::Fire(pending.filter(|_| options.trailing), true)
                    } else if options
                        .max_wait
                        .is_some_and(|max_wait| now >= burst.started + max_wait)
                    {
                        state.burst = Some(Burst {
                            started: now,
                            last_call: burst.last_call,
                        });
                        Tick::Fire(state.pending.take(), false)
                    } else {
                        Tick::Sleep
                    }
                }
                _ => Tick::Stop,
            }
        };

        match tick {
            Tick::Stop => return,
            Tick::Sleep => {}
            Tick::Fire(args, done) => {
                if let Some(args) = args {
                    (inner.callback)(args);
                }
                if done {
                    return;
                }
            }
        }
    }
}
