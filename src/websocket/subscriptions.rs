//! Subscription multiplexing.
//!
//! The exchange sees one subscription per channel key; locally any number of
//! handlers can share it. Every handler owns an unbounded queue drained by
//! its own task, so a slow or panicking handler only affects itself and each
//! handler sees frames in arrival order.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::Stream;
use pin_project_lite::pin_project;
use tokio::sync::{mpsc, watch};

use crate::websocket::types::{ChannelArg, ChannelKey, PushFrame};

/// Callback invoked for every push on a subscribed channel.
pub type PushHandler = Box<dyn FnMut(Arc<PushFrame>) + Send + 'static>;

type FrameSender = mpsc::UnboundedSender<Arc<PushFrame>>;

/// Identifies one attached handler. Pass it back to unsubscribe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    key: ChannelKey,
    handler_id: u64,
}

impl SubscriptionHandle {
    pub fn key(&self) -> &ChannelKey {
        &self.key
    }
}

struct HandlerSlot {
    id: u64,
    tx: FrameSender,
}

/// Outcome of the first subscribe round trip for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AckState {
    Pending,
    Confirmed,
    Failed(String),
}

/// One exchange-side subscription and its local handlers.
pub(crate) struct ChannelEntry {
    arg: ChannelArg,
    confirmed: AtomicBool,
    ack: watch::Sender<AckState>,
    handlers: Mutex<Vec<HandlerSlot>>,
}

impl ChannelEntry {
    fn new(arg: ChannelArg) -> Self {
        let (ack, _) = watch::channel(AckState::Pending);
        Self {
            arg,
            confirmed: AtomicBool::new(false),
            ack,
            handlers: Mutex::new(Vec::new()),
        }
    }

    fn lock_handlers(&self) -> MutexGuard<'_, Vec<HandlerSlot>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Result of attaching a handler.
#[derive(Debug)]
pub(crate) struct Attached {
    pub handle: SubscriptionHandle,
    /// No handler existed for the key before: the caller must subscribe
    pub first: bool,
    /// Outcome of the key's first subscribe; later attachers wait on it
    pub ack: watch::Receiver<AckState>,
}

/// Routes channel pushes to the handlers registered for their key.
#[derive(Default)]
pub struct SubscriptionMultiplexer {
    channels: DashMap<ChannelKey, Arc<ChannelEntry>>,
    next_handler_id: AtomicU64,
}

impl SubscriptionMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a callback. Must be called within a Tokio runtime.
    pub(crate) fn attach(&self, arg: ChannelArg, handler: PushHandler) -> Attached {
        let key = arg.key();
        let tx = spawn_worker(key.clone(), handler);
        self.attach_sender(arg, tx)
    }

    /// Attach a stream consumer.
    pub(crate) fn attach_stream(&self, arg: ChannelArg) -> (SubscriptionStream, Attached) {
        let (tx, rx) = mpsc::unbounded_channel();
        let attached = self.attach_sender(arg, tx);
        let stream = SubscriptionStream {
            handle: attached.handle.clone(),
            rx,
        };
        (stream, attached)
    }

    fn attach_sender(&self, arg: ChannelArg, tx: FrameSender) -> Attached {
        let key = arg.key();
        let id = self.next_handler_id.fetch_add(1, Ordering::Relaxed);
        let slot = HandlerSlot { id, tx };

        let (first, ack) = match self.channels.entry(key.clone()) {
            Entry::Occupied(occupied) => {
                let entry = occupied.get();
                entry.lock_handlers().push(slot);
                (false, entry.ack.subscribe())
            }
            Entry::Vacant(vacant) => {
                let entry = ChannelEntry::new(arg);
                entry.lock_handlers().push(slot);
                let ack = entry.ack.subscribe();
                vacant.insert(Arc::new(entry));
                (true, ack)
            }
        };

        Attached {
            handle: SubscriptionHandle {
                key,
                handler_id: id,
            },
            first,
            ack,
        }
    }

    /// Detach one handler. Returns the channel argument when it was the last
    /// handler for its key, meaning the exchange subscription should go.
    pub(crate) fn detach(&self, handle: &SubscriptionHandle) -> Option<ChannelArg> {
        let now_empty = {
            let entry = self.channels.get(&handle.key)?;
            let mut handlers = entry.lock_handlers();
            let before = handlers.len();
            handlers.retain(|slot| slot.id != handle.handler_id);
            if handlers.len() == before {
                return None;
            }
            handlers.is_empty()
        };

        if !now_empty {
            return None;
        }
        self.channels
            .remove_if(&handle.key, |_, entry| entry.lock_handlers().is_empty())
            .map(|(_, entry)| entry.arg.clone())
    }

    /// Drop a key and all of its handlers.
    pub(crate) fn remove(&self, key: &ChannelKey) -> Option<ChannelArg> {
        self.channels.remove(key).map(|(_, entry)| entry.arg.clone())
    }

    /// Deliver a push to every handler registered under its key, in
    /// registration order. Returns how many handlers accepted it.
    pub fn dispatch(&self, frame: PushFrame) -> usize {
        let key = frame.arg.key();
        let Some(entry) = self.channels.get(&key).map(|e| Arc::clone(e.value())) else {
            tracing::debug!(channel = %key, "Dropping push for unsubscribed channel");
            return 0;
        };

        let frame = Arc::new(frame);
        let handlers = entry.lock_handlers();
        handlers
            .iter()
            .filter(|slot| slot.tx.send(Arc::clone(&frame)).is_ok())
            .count()
    }

    /// Record the exchange's subscribe ack.
    pub(crate) fn mark_confirmed(&self, key: &ChannelKey) -> bool {
        match self.channels.get(key) {
            Some(entry) => {
                entry.confirmed.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Publish the outcome of a key's first subscribe to every attacher
    /// waiting on it.
    pub(crate) fn settle(&self, key: &ChannelKey, state: AckState) {
        if let Some(entry) = self.channels.get(key) {
            entry.ack.send_replace(state);
        }
    }

    /// Every key needs a fresh ack after a reconnect.
    pub(crate) fn mark_all_unconfirmed(&self) {
        for entry in self.channels.iter() {
            entry.confirmed.store(false, Ordering::SeqCst);
        }
    }

    pub fn is_confirmed(&self, key: &ChannelKey) -> bool {
        self.channels
            .get(key)
            .map(|entry| entry.confirmed.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Arguments of every tracked subscription, for resubscribing.
    pub fn all_args(&self) -> Vec<ChannelArg> {
        let mut args: Vec<ChannelArg> = self.channels.iter().map(|e| e.arg.clone()).collect();
        args.sort_by_key(ChannelArg::key);
        args
    }

    pub fn handler_count(&self, key: &ChannelKey) -> usize {
        self.channels
            .get(key)
            .map(|entry| entry.lock_handlers().len())
            .unwrap_or(0)
    }

    pub fn contains(&self, key: &ChannelKey) -> bool {
        self.channels.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Forget every subscription. Handler tasks end once their queues drain.
    pub fn clear(&self) {
        self.channels.clear();
    }
}

fn spawn_worker(key: ChannelKey, mut handler: PushHandler) -> FrameSender {
    let (tx, mut rx) = mpsc::unbounded_channel::<Arc<PushFrame>>();
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if catch_unwind(AssertUnwindSafe(|| handler(frame))).is_err() {
                tracing::warn!(channel = %key, "Subscription handler panicked");
            }
        }
    });
    tx
}

pin_project! {
    /// Stream form of a subscription.
    ///
    /// Yields every push for the channel. Pass [`handle`](Self::handle) to
    /// `unsubscribe` when done.
    pub struct SubscriptionStream {
        handle: SubscriptionHandle,
        #[pin]
        rx: mpsc::UnboundedReceiver<Arc<PushFrame>>,
    }
}

impl SubscriptionStream {
    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }
}

impl Stream for SubscriptionStream {
    type Item = Arc<PushFrame>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        this.rx.poll_recv(cx)
    }
}
