use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use chat_events::{SseLineParser, StreamEvent};
use futures_util::StreamExt;
use reqwest::{Client, Response};

use crate::config::BotApiConfig;
use crate::error::{parse_error_message, BotApiError};
use crate::payload::{ChatStreamRequest, SessionResponse};
use crate::url::{chat_stream_url, sessions_url};

/// Optional cancellation signal shared across request and stream loops.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct BotApiClient {
    http: Client,
    config: BotApiConfig,
}

impl BotApiClient {
    pub fn new(config: BotApiConfig) -> Result<Self, BotApiError> {
        let mut builder = Client::builder();
        if let Some(user_agent) = config.user_agent.as_deref() {
            builder = builder.user_agent(user_agent.to_string());
        }
        let http = builder.build().map_err(BotApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &BotApiConfig {
        &self.config
    }

    /// Creates a server-side session correlating backend memory with one
    /// bot context.
    pub async fn create_session(
        &self,
        bot_id: &str,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<String, BotApiError> {
        let mut request = self
            .http
            .post(sessions_url(&self.config.base_url, bot_id))
            .bearer_auth(&self.config.auth_token);
        // Per-request, not on the client: a client-wide timeout would also
        // cover chat-stream bodies and cut off long streams.
        if let Some(timeout) = self.config.timeout {
            request = request.timeout(timeout);
        }
        let request = request.send();

        let response = await_or_cancel(request, cancellation)
            .await?
            .map_err(BotApiError::from)?;
        let response = self.check_status(response, cancellation).await?;

        let session = await_or_cancel(response.json::<SessionResponse>(), cancellation)
            .await?
            .map_err(BotApiError::from)?;
        Ok(session.session_id)
    }

    /// Opens a chat stream and invokes `on_event` for each decoded event in
    /// arrival order. Returns once the stream ends; the `[DONE]` sentinel
    /// is consumed by the line decoder and never reaches `on_event`.
    pub async fn stream_chat<F>(
        &self,
        bot_id: &str,
        session_id: &str,
        query: &str,
        cancellation: Option<&CancellationSignal>,
        mut on_event: F,
    ) -> Result<(), BotApiError>
    where
        F: FnMut(StreamEvent),
    {
        let request = self
            .http
            .post(chat_stream_url(&self.config.base_url, bot_id))
            .query(&[("session_id", session_id)])
            .bearer_auth(&self.config.auth_token)
            .json(&ChatStreamRequest::new(query))
            .send();

        let response = await_or_cancel(request, cancellation)
            .await?
            .map_err(BotApiError::from)?;
        let response = self.check_status(response, cancellation).await?;

        let mut bytes = response.bytes_stream();
        let mut parser = SseLineParser::default();

        loop {
            let Some(chunk) = await_or_cancel(bytes.next(), cancellation).await? else {
                break;
            };
            if is_cancelled(cancellation) {
                return Err(BotApiError::Cancelled);
            }
            let chunk = chunk.map_err(|error| BotApiError::StreamChunk(error.to_string()))?;
            for event in parser.feed(&chunk) {
                on_event(event);
            }
        }

        if is_cancelled(cancellation) {
            return Err(BotApiError::Cancelled);
        }

        Ok(())
    }

    async fn check_status(
        &self,
        response: Response,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Response, BotApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = await_or_cancel(response.text(), cancellation)
            .await?
            .unwrap_or_default();
        Err(BotApiError::Status(status, parse_error_message(status, &body)))
    }
}

fn is_cancelled(cancellation: Option<&CancellationSignal>) -> bool {
    cancellation.is_some_and(|signal| signal.load(Ordering::Acquire))
}

/// Awaits `future` while polling the cancellation signal between waits.
async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, BotApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(BotApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(BotApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::{await_or_cancel, is_cancelled, BotApiClient, BotApiError};
    use crate::config::BotApiConfig;

    #[tokio::test]
    async fn await_or_cancel_passes_through_without_signal() {
        let output = await_or_cancel(async { 7 }, None)
            .await
            .expect("unsignalled future should complete");
        assert_eq!(output, 7);
    }

    #[tokio::test]
    async fn await_or_cancel_returns_cancelled_when_signalled() {
        let signal = Arc::new(AtomicBool::new(true));
        let result = await_or_cancel(std::future::pending::<()>(), Some(&signal)).await;

        assert!(matches!(result, Err(BotApiError::Cancelled)));
    }

    #[tokio::test]
    async fn await_or_cancel_interrupts_a_pending_future() {
        let signal = Arc::new(AtomicBool::new(false));
        let flip = {
            let signal = Arc::clone(&signal);
            tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(60)).await;
                signal.store(true, Ordering::Release);
            })
        };

        let result = await_or_cancel(std::future::pending::<()>(), Some(&signal)).await;
        assert!(matches!(result, Err(BotApiError::Cancelled)));
        flip.await.expect("flip task should finish");
    }

    #[tokio::test]
    async fn create_session_times_out_against_a_stalled_server() {
        // Bound but never accepted: the connection completes at TCP level
        // and the request then waits forever for a response.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        let addr = listener.local_addr().expect("listener should have an address");

        let config = BotApiConfig::new(format!("http://{addr}"), "token")
            .with_timeout(std::time::Duration::from_millis(100));
        let client = BotApiClient::new(config).expect("client should build");

        match client.create_session("bot-1", None).await {
            Err(BotApiError::Request(error)) => assert!(error.is_timeout()),
            other => panic!("expected a timeout, got {other:?}"),
        }
    }

    #[test]
    fn is_cancelled_reads_signal_state() {
        assert!(!is_cancelled(None));

        let signal = Arc::new(AtomicBool::new(false));
        assert!(!is_cancelled(Some(&signal)));
        signal.store(true, Ordering::Release);
        assert!(is_cancelled(Some(&signal)));
    }
}
