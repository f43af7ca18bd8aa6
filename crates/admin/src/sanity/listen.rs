//! Listen endpoint: a server-sent event stream of document changes.

use async_stream::stream;
use futures::stream::{BoxStream, StreamExt};
use reqwest::header::ACCEPT;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::instrument;

use super::client::check_status;
use super::{SanityClient, SanityError};

/// An event from the listen stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenEvent {
    /// The subscription is established.
    Welcome,
    /// A matching document changed.
    Mutation {
        document_id: String,
        /// `appear`, `update`, or `disappear`.
        transition: Option<String>,
    },
    /// The server is closing the stream.
    Disconnect(String),
    /// The server rejected the subscription.
    ChannelError(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutationData {
    document_id: String,
    #[serde(default)]
    transition: Option<String>,
}

#[derive(Deserialize, Default)]
struct ReasonData {
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl SanityClient {
    /// Subscribe to changes of documents matching `groq`.
    ///
    /// The stream ends when the server disconnects or the connection drops.
    /// It owns its connection, so it can outlive the client handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription request is refused.
    #[instrument(skip(self))]
    pub async fn listen(
        &self,
        groq: &str,
    ) -> Result<BoxStream<'static, Result<ListenEvent, SanityError>>, SanityError> {
        let response = self
            .inner
            .client
            .get(&self.inner.listen_url)
            .bearer_auth(self.inner.token.expose_secret())
            .header(ACCEPT, "text/event-stream")
            .query(&[("query", groq), ("includeResult", "false")])
            .send()
            .await?;

        if !response.status().is_success() {
            check_status(response).await?;
            return Err(SanityError::Stream("listen request refused".to_string()));
        }

        Ok(stream! {
            // Raw bytes: a chunk may end inside a multi-byte character.
            let mut buffer: Vec<u8> = Vec::new();
            let mut byte_stream = std::pin::pin!(response.bytes_stream());

            while let Some(chunk_result) = byte_stream.next().await {
                match chunk_result {
                    Ok(chunk) => {
                        buffer.extend_from_slice(&chunk);
                        while let Some(event) = extract_sse_event(&mut buffer) {
                            match event {
                                Ok(event) => {
                                    if let Some(parsed) = parse_sse_event(&event) {
                                        yield parsed;
                                    }
                                }
                                Err(e) => yield Err(e),
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(SanityError::Stream(e.to_string()));
                        break;
                    }
                }
            }
        }
        .boxed())
    }
}

/// Start and delimiter length of the first blank line (`\n\n` or `\r\n\r\n`).
fn event_end(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, 4));
    match (lf, crlf) {
        (Some(lf), Some(crlf)) => Some(if crlf.0 < lf.0 { crlf } else { lf }),
        (lf, crlf) => lf.or(crlf),
    }
}

/// Take one complete event (terminated by a blank line) off the buffer and
/// decode it. Bytes of a partial event stay buffered.
fn extract_sse_event(buffer: &mut Vec<u8>) -> Option<Result<String, SanityError>> {
    let (end, delimiter) = event_end(buffer)?;
    let mut event: Vec<u8> = buffer.drain(..end + delimiter).collect();
    event.truncate(end);
    Some(
        String::from_utf8(event)
            .map(|text| text.replace("\r\n", "\n"))
            .map_err(|e| SanityError::Stream(format!("Invalid UTF-8 in event: {e}"))),
    )
}

/// Parse `event:` and `data:` lines. Comments and unknown events yield `None`.
fn parse_sse_event(event: &str) -> Option<Result<ListenEvent, SanityError>> {
    let mut name = None;
    let mut data = String::new();

    for line in event.lines() {
        if let Some(value) = line.strip_prefix("event:") {
            name = Some(value.trim());
        } else if let Some(value) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(value.trim_start());
        }
    }

    let reason = || {
        let parsed: ReasonData = serde_json::from_str(&data).unwrap_or_default();
        parsed
            .reason
            .or(parsed.message)
            .unwrap_or_else(|| data.clone())
    };

    match name? {
        "welcome" => Some(Ok(ListenEvent::Welcome)),
        "mutation" => Some(
            serde_json::from_str::<MutationData>(&data)
                .map(|m| ListenEvent::Mutation {
                    document_id: m.document_id,
                    transition: m.transition,
                })
                .map_err(SanityError::from),
        ),
        "disconnect" => Some(Ok(ListenEvent::Disconnect(reason()))),
        "channelError" => Some(Ok(ListenEvent::ChannelError(reason()))),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_sse_event() {
        let mut buffer =
            b"event: welcome\ndata: {\"listenerName\":\"abc\"}\n\nevent: mutation\ndata: {}\r\n\r\n"
                .to_vec();

        assert!(extract_sse_event(&mut buffer).unwrap().unwrap().contains("welcome"));
        assert_eq!(
            extract_sse_event(&mut buffer).unwrap().unwrap(),
            "event: mutation\ndata: {}"
        );
        assert!(extract_sse_event(&mut buffer).is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_extract_sse_event_incomplete() {
        let mut buffer = b"event: mutation\ndata: {\"documentId\"".to_vec();
        assert!(extract_sse_event(&mut buffer).is_none());
        assert_eq!(buffer, b"event: mutation\ndata: {\"documentId\"");
    }

    #[test]
    fn test_character_split_across_chunks() {
        let event = "event: mutation\ndata: {\"documentId\":\"Jos\u{e9}\"}\n\n".as_bytes();
        let split = event.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let (first, second) = event.split_at(split);

        let mut buffer = first.to_vec();
        assert!(extract_sse_event(&mut buffer).is_none());
        buffer.extend_from_slice(second);

        let text = extract_sse_event(&mut buffer).unwrap().unwrap();
        assert_eq!(
            parse_sse_event(&text).unwrap().unwrap(),
            ListenEvent::Mutation {
                document_id: "Jos\u{e9}".to_string(),
                transition: None,
            }
        );
    }

    #[test]
    fn test_invalid_utf8_event_is_an_error() {
        let mut buffer = b"event: mutation\ndata: \xff\n\nevent: welcome\n\n".to_vec();
        assert!(extract_sse_event(&mut buffer).unwrap().is_err());
        assert!(extract_sse_event(&mut buffer).unwrap().is_ok());
    }

    #[test]
    fn test_parse_mutation_event() {
        let event = "event: mutation\ndata: {\"documentId\":\"order-1\",\"transition\":\"update\",\"eventId\":\"tx#order-1\"}";
        assert_eq!(
            parse_sse_event(event).unwrap().unwrap(),
            ListenEvent::Mutation {
                document_id: "order-1".to_string(),
                transition: Some("update".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_control_events() {
        assert_eq!(
            parse_sse_event("event: welcome\ndata: {\"listenerName\":\"x\"}")
                .unwrap()
                .unwrap(),
            ListenEvent::Welcome
        );
        assert_eq!(
            parse_sse_event("event: disconnect\ndata: {\"reason\":\"forcefully closed\"}")
                .unwrap()
                .unwrap(),
            ListenEvent::Disconnect("forcefully closed".to_string())
        );
        assert_eq!(
            parse_sse_event("event: channelError\ndata: {\"message\":\"bad query\"}")
                .unwrap()
                .unwrap(),
            ListenEvent::ChannelError("bad query".to_string())
        );
    }

    #[test]
    fn test_parse_skips_comments() {
        assert!(parse_sse_event(": keep-alive").is_none());
        assert!(parse_sse_event("").is_none());
    }

    #[test]
    fn test_parse_bad_mutation_data() {
        assert!(parse_sse_event("event: mutation\ndata: not json").unwrap().is_err());
    }
}
