use bot_api::{BotApiClient, BotApiConfig, BotApiError, CancellationSignal};
use chat_events::StreamEvent;

/// Producer contract consumed by the session coordinator.
///
/// Implementations block the calling worker thread; cancellation is
/// cooperative through the shared signal, and a cancelled call fails with
/// [`BotApiError::Cancelled`] rather than a transport error.
pub trait StreamTransport: Send + Sync + 'static {
    /// Obtains a server-assigned session identifier for one bot context.
    fn create_session(
        &self,
        bot_id: &str,
        cancel: &CancellationSignal,
    ) -> Result<String, BotApiError>;

    /// Streams a chat response, handing each decoded event to `on_event` in
    /// arrival order. Returns once the stream terminates.
    fn stream_chat(
        &self,
        bot_id: &str,
        session_id: &str,
        query: &str,
        cancel: &CancellationSignal,
        on_event: &mut dyn FnMut(StreamEvent),
    ) -> Result<(), BotApiError>;
}

/// [`StreamTransport`] backed by the real HTTP client.
#[derive(Debug)]
pub struct HttpStreamTransport {
    client: BotApiClient,
}

impl HttpStreamTransport {
    pub fn new(config: BotApiConfig) -> Result<Self, BotApiError> {
        Ok(Self {
            client: BotApiClient::new(config)?,
        })
    }

    fn runtime() -> Result<tokio::runtime::Runtime, BotApiError> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                BotApiError::Unknown(format!("failed to initialize tokio runtime: {error}"))
            })
    }
}

impl StreamTransport for HttpStreamTransport {
    fn create_session(
        &self,
        bot_id: &str,
        cancel: &CancellationSignal,
    ) -> Result<String, BotApiError> {
        Self::runtime()?.block_on(self.client.create_session(bot_id, Some(cancel)))
    }

    fn stream_chat(
        &self,
        bot_id: &str,
        session_id: &str,
        query: &str,
        cancel: &CancellationSignal,
        on_event: &mut dyn FnMut(StreamEvent),
    ) -> Result<(), BotApiError> {
        Self::runtime()?.block_on(self.client.stream_chat(
            bot_id,
            session_id,
            query,
            Some(cancel),
            |event| on_event(event),
        ))
    }
}
