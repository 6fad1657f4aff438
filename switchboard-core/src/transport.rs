use bytes::Bytes;
use eventsource_stream::{EventStreamError, Eventsource};
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::{Client, Request, Response, StatusCode};
use tracing::{debug, error, info, trace};

use crate::error::{Error, Result};
use crate::provider::{CompletionRequest, EventParser, HttpBackend, TextStream};

/// Executes requests built by an [`HttpBackend`] and normalizes the replies.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport around a preconfigured client (timeouts, proxies, ...)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Sends one request and returns the complete reply text
    pub async fn complete<B: HttpBackend + ?Sized>(
        &self,
        backend: &B,
        request: CompletionRequest<'_>,
    ) -> Result<String> {
        let response = self.execute(backend.accept(request)?).await?;

        debug!("Reading response body");
        let response_text = match response.text().await {
            Ok(text) => {
                trace!("Response body: {}", text);
                text
            }
            Err(e) => {
                error!("Failed to read response body: {}", e);
                return Err(e.into());
            }
        };

        backend.parse(response_text)
    }

    /// Opens a streaming request and returns the text deltas as they arrive
    pub async fn stream<B: HttpBackend + ?Sized>(
        &self,
        backend: &B,
        request: CompletionRequest<'_>,
    ) -> Result<TextStream> {
        let response = self.execute(backend.accept(request)?).await?;
        let body = response.bytes_stream().map_err(Error::from).boxed();
        Ok(sse_text_stream(body, backend.event_parser()))
    }

    async fn execute(&self, request: Request) -> Result<Response> {
        debug!("Sending HTTP request: {} {}", request.method(), request.url());
        let response = match self.client.execute(request).await {
            Ok(resp) => {
                info!("Received response with status: {}", resp.status());
                trace!("Response headers: {:#?}", resp.headers());
                resp
            }
            Err(e) => {
                error!("HTTP request failed: {}", e);
                return Err(e.into());
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = error_body(response).await;
        error!("Backend returned {}: {}", status, body);
        Err(error_for_status(status, &body))
    }
}

/// Reads the body of a failed response. An unreadable body is logged and read as empty.
async fn error_body(response: Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to read error body for {}: {}", status, e);
            String::new()
        }
    }
}

/// Maps a non-success status and body onto the error taxonomy, keeping the
/// backend's own message when it sent a JSON error object
pub(crate) fn error_for_status(status: StatusCode, body: &str) -> Error {
    let message = error_message(body).unwrap_or_else(|| body.to_string());
    match status.as_u16() {
        401 | 403 => Error::Authentication(message),
        429 => Error::RateLimit(message),
        code => Error::Api {
            status: code,
            message,
        },
    }
}

/// Both supported wire formats nest the message at `error.message`
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

/// Turns a raw event-stream body into text deltas using a backend's event parser.
///
/// The stream ends at `[DONE]`, at the end of the body, or right after the
/// first error it yields.
pub(crate) fn sse_text_stream(
    body: BoxStream<'static, Result<Bytes>>,
    parser: EventParser,
) -> TextStream {
    let mut events = body.eventsource();

    Box::pin(async_stream::stream! {
        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    let e = match e {
                        EventStreamError::Transport(e) => e,
                        other => Error::Stream(format!("Malformed event stream: {}", other)),
                    };
                    error!("Stream body failed: {}", e);
                    yield Err(e);
                    return;
                }
            };

            if event.data == "[DONE]" {
                debug!("Stream finished");
                return;
            }
            trace!("Stream event: {}", event.data);

            match parser(&event.data) {
                Ok(Some(text)) if !text.is_empty() => yield Ok(text),
                Ok(_) => {}
                Err(e) => {
                    error!("Stream failed: {}", e);
                    yield Err(e);
                    return;
                }
            }
        }
    })
}
