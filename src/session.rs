use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use bot_api::{BotApiError, CancellationSignal};
use chat_events::StreamEvent;
use chat_model::{BlockReducer, ChatMessage, Conversation};
use conversation_store::{ConversationStore, ConversationStoreError};

use crate::error::ChatSessionError;
use crate::transport::StreamTransport;

/// Identifier for one accepted stream.
pub type StreamId = u64;

/// Handle returned by [`ChatSession::subscribe`].
pub type ObserverId = u64;

type Observer = Box<dyn Fn() + Send + Sync>;

/// Coordinates at most one active chat stream for one conversation at a
/// time.
///
/// All conversation state lives behind this instance; there is no
/// module-level singleton, so independent coordinators can coexist. Each
/// decoded event is applied to the in-flight assistant message under the
/// state lock in strict arrival order, and observers are notified after
/// every transition.
pub struct ChatSession {
    state: Mutex<ChatState>,
    transport: Arc<dyn StreamTransport>,
    store: Arc<dyn ConversationStore>,
    active_stream: Mutex<Option<ActiveStream>>,
    next_stream_id: AtomicU64,
    observers: Mutex<Vec<(ObserverId, Observer)>>,
    next_observer_id: AtomicU64,
}

#[derive(Default)]
struct ChatState {
    conversation: Option<Conversation>,
    streaming: bool,
    /// Stale-stream guard: events and finalization are dropped unless the
    /// worker's stream id still matches.
    active_stream_id: Option<StreamId>,
    last_error: Option<String>,
}

struct ActiveStream {
    stream_id: StreamId,
    cancel: CancellationSignal,
    join_handle: Option<JoinHandle<()>>,
}

impl ChatSession {
    pub fn new(
        transport: Arc<dyn StreamTransport>,
        store: Arc<dyn ConversationStore>,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ChatState::default()),
            transport,
            store,
            active_stream: Mutex::new(None),
            next_stream_id: AtomicU64::new(1),
            observers: Mutex::new(Vec::new()),
            next_observer_id: AtomicU64::new(1),
        })
    }

    /// Starts streaming a response to `text`.
    ///
    /// Rejected synchronously, before any side effect, when `text` trims to
    /// empty, no bot is selected, or a stream is already active. On accept
    /// the user message and a streaming assistant placeholder are appended
    /// and a worker thread begins consuming the event stream.
    pub fn start_stream(self: &Arc<Self>, text: &str) -> Result<StreamId, ChatSessionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ChatSessionError::EmptyMessage);
        }

        let mut active_stream = self.lock_active_stream();
        if active_stream.is_some() {
            return Err(ChatSessionError::StreamActive);
        }

        let stream_id = self.next_stream_id.fetch_add(1, Ordering::SeqCst);
        {
            let mut state = self.lock_state();
            match state.conversation.as_mut() {
                Some(conversation) => {
                    conversation.messages.push(ChatMessage::user(trimmed));
                    conversation
                        .messages
                        .push(ChatMessage::assistant_placeholder());
                }
                None => return Err(ChatSessionError::NoBotSelected),
            }
            state.streaming = true;
            state.active_stream_id = Some(stream_id);
            state.last_error = None;
        }

        let cancel: CancellationSignal = Arc::new(AtomicBool::new(false));
        let worker = {
            let session = Arc::clone(self);
            let query = trimmed.to_string();
            let cancel = Arc::clone(&cancel);
            thread::Builder::new()
                .name(format!("chat-stream-{stream_id}"))
                .spawn(move || session.run_worker(stream_id, query, cancel))
        };

        let join_handle = match worker {
            Ok(join_handle) => join_handle,
            Err(error) => {
                self.finalize_stream(stream_id, Some(format!("spawn failed: {error}")));
                return Err(ChatSessionError::WorkerSpawn(error.to_string()));
            }
        };

        *active_stream = Some(ActiveStream {
            stream_id,
            cancel,
            join_handle: Some(join_handle),
        });
        drop(active_stream);

        self.notify_observers();
        Ok(stream_id)
    }

    /// Cancels the in-flight stream, if any, and finalizes its assistant
    /// message immediately. Idempotent; calling while idle is a no-op.
    pub fn abort(&self) {
        let taken = self.lock_active_stream().take();
        let Some(active) = taken else {
            return;
        };

        active.cancel.store(true, Ordering::Release);
        tracing::debug!(stream_id = active.stream_id, "aborting chat stream");

        let finalized = self.finalize_stream(active.stream_id, None);
        if finalized {
            self.notify_observers();
        }
        // The worker exits on its own once it observes the cancel signal;
        // its terminal handling is a no-op because the stream id no longer
        // matches.
    }

    /// Makes `bot_id` the current conversation context.
    ///
    /// A no-op when already current. Otherwise any in-flight stream is
    /// aborted, the outgoing conversation is persisted, and the target is
    /// loaded from the store (or initialized empty). The session identifier
    /// travels with the conversation.
    pub fn select_bot(&self, bot_id: &str) -> Result<(), ChatSessionError> {
        {
            let state = self.lock_state();
            let already_current = state
                .conversation
                .as_ref()
                .is_some_and(|conversation| conversation.bot_id == bot_id);
            if already_current {
                return Ok(());
            }
        }

        self.abort();
        self.persist_current()?;

        let loaded = self.store.load(bot_id)?;
        {
            let mut state = self.lock_state();
            state.conversation = Some(loaded.unwrap_or_else(|| Conversation::new(bot_id)));
            state.last_error = None;
        }

        self.notify_observers();
        Ok(())
    }

    /// Discards the current conversation: aborts any stream, removes the
    /// persisted record, and clears messages and the session identifier.
    pub fn clear_conversation(&self) -> Result<(), ChatSessionError> {
        self.abort();

        let bot_id = {
            let state = self.lock_state();
            state
                .conversation
                .as_ref()
                .map(|conversation| conversation.bot_id.clone())
        };
        let Some(bot_id) = bot_id else {
            return Ok(());
        };

        self.store.remove(&bot_id)?;
        {
            let mut state = self.lock_state();
            if let Some(conversation) = state.conversation.as_mut() {
                conversation.messages.clear();
                conversation.session_id = None;
            }
            state.last_error = None;
        }

        self.notify_observers();
        Ok(())
    }

    /// Snapshot of the current message sequence, empty when no bot is
    /// selected.
    #[must_use]
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock_state()
            .conversation
            .as_ref()
            .map(|conversation| conversation.messages.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.lock_state().streaming
    }

    #[must_use]
    pub fn current_bot(&self) -> Option<String> {
        self.lock_state()
            .conversation
            .as_ref()
            .map(|conversation| conversation.bot_id.clone())
    }

    #[must_use]
    pub fn session_id(&self) -> Option<String> {
        self.lock_state()
            .conversation
            .as_ref()
            .and_then(|conversation| conversation.session_id.clone())
    }

    /// Last transport failure, cleared on the next accepted stream.
    /// Cancellation is never recorded here.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.lock_state().last_error.clone()
    }

    /// Registers a change observer invoked after every state transition.
    ///
    /// Callbacks run on whichever thread performed the transition and must
    /// not call `subscribe`/`unsubscribe` reentrantly.
    pub fn subscribe(&self, observer: impl Fn() + Send + Sync + 'static) -> ObserverId {
        let id = self.next_observer_id.fetch_add(1, Ordering::SeqCst);
        self.lock_observers().push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&self, id: ObserverId) {
        self.lock_observers().retain(|(known, _)| *known != id);
    }

    fn run_worker(self: Arc<Self>, stream_id: StreamId, query: String, cancel: CancellationSignal) {
        let outcome = self.consume_stream(stream_id, &query, &cancel);

        let finalized = match outcome {
            Ok(()) => {
                let finalized = self.finalize_stream(stream_id, None);
                if finalized {
                    self.persist_after_settle();
                }
                finalized
            }
            Err(error) if error.is_cancelled() => {
                // Normal terminal state; abort() usually finalized already.
                self.finalize_stream(stream_id, None)
            }
            Err(error) => {
                tracing::debug!(stream_id, %error, "chat stream failed");
                let finalized = self.finalize_stream(stream_id, Some(error.to_string()));
                if finalized {
                    // Partial content is preserved, not discarded.
                    self.persist_after_settle();
                }
                finalized
            }
        };

        self.clear_active_stream_if_matching(stream_id);
        if finalized {
            self.notify_observers();
        }
    }

    fn consume_stream(
        &self,
        stream_id: StreamId,
        query: &str,
        cancel: &CancellationSignal,
    ) -> Result<(), BotApiError> {
        let (bot_id, existing_session) = {
            let state = self.lock_state();
            if state.active_stream_id != Some(stream_id) {
                return Err(BotApiError::Cancelled);
            }
            match state.conversation.as_ref() {
                Some(conversation) => {
                    (conversation.bot_id.clone(), conversation.session_id.clone())
                }
                None => return Err(BotApiError::Cancelled),
            }
        };

        let session_id = match existing_session {
            Some(session_id) => session_id,
            None => {
                let session_id = self.transport.create_session(&bot_id, cancel)?;
                let mut state = self.lock_state();
                if state.active_stream_id != Some(stream_id) {
                    return Err(BotApiError::Cancelled);
                }
                if let Some(conversation) = state.conversation.as_mut() {
                    conversation.session_id = Some(session_id.clone());
                }
                session_id
            }
        };

        let mut reducer = BlockReducer::default();
        self.transport
            .stream_chat(&bot_id, &session_id, query, cancel, &mut |event| {
                self.apply_stream_event(stream_id, &mut reducer, &event);
            })
    }

    fn apply_stream_event(
        &self,
        stream_id: StreamId,
        reducer: &mut BlockReducer,
        event: &StreamEvent,
    ) {
        {
            let mut state = self.lock_state();
            if state.active_stream_id != Some(stream_id) {
                return;
            }
            let Some(message) = state
                .conversation
                .as_mut()
                .and_then(|conversation| conversation.messages.last_mut())
            else {
                return;
            };
            if !message.streaming {
                return;
            }
            reducer.apply(message, event);
        }

        self.notify_observers();
    }

    /// Marks the stream's messages not-in-progress and returns to idle.
    /// Returns `false` when another finalizer (typically `abort`) already
    /// settled this stream.
    fn finalize_stream(&self, stream_id: StreamId, error: Option<String>) -> bool {
        let mut state = self.lock_state();
        if state.active_stream_id != Some(stream_id) {
            return false;
        }

        state.active_stream_id = None;
        state.streaming = false;
        state.last_error = error;
        if let Some(conversation) = state.conversation.as_mut() {
            for message in &mut conversation.messages {
                message.streaming = false;
            }
        }

        true
    }

    fn persist_after_settle(&self) {
        if let Err(error) = self.persist_current() {
            tracing::warn!(%error, "failed to persist conversation after stream settled");
        }
    }

    fn persist_current(&self) -> Result<(), ConversationStoreError> {
        let snapshot = self.lock_state().conversation.clone();
        match snapshot {
            Some(conversation) => self.store.save(&conversation.bot_id, &conversation),
            None => Ok(()),
        }
    }

    fn clear_active_stream_if_matching(&self, stream_id: StreamId) {
        let mut active_stream = self.lock_active_stream();
        let matches = active_stream
            .as_ref()
            .map(|active| active.stream_id)
            == Some(stream_id);
        if !matches {
            return;
        }

        let mut completed = match active_stream.take() {
            Some(completed) => completed,
            None => return,
        };

        if let Some(join_handle) = completed.join_handle.take() {
            let is_current_thread = join_handle.thread().id() == thread::current().id();
            if !is_current_thread && join_handle.is_finished() {
                let _ = join_handle.join();
            }
        }
    }

    fn notify_observers(&self) {
        let observers = self.lock_observers();
        for (_, observer) in observers.iter() {
            observer();
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ChatState> {
        lock_unpoisoned(&self.state)
    }

    fn lock_active_stream(&self) -> MutexGuard<'_, Option<ActiveStream>> {
        lock_unpoisoned(&self.active_stream)
    }

    fn lock_observers(&self) -> MutexGuard<'_, Vec<(ObserverId, Observer)>> {
        lock_unpoisoned(&self.observers)
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
