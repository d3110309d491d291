use crate::config::{resolve_api_token, ApiConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{future, Stream, StreamExt};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use std::pin::Pin;

// Alias for the stream of text fragments returned by streaming endpoints
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

// Marks the end of a server-sent event stream
const STREAM_DONE: &str = "[DONE]";

/// Backend the chat state talks to. Paths are relative to the API root,
/// e.g. `/conversations/open`. Responses are the parsed JSON bodies.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value>;

    async fn post(&self, path: &str, body: Option<Value>) -> Result<Value>;

    // Returns the server-sent event payloads as text fragments.
    async fn post_stream(&self, path: &str, body: Option<Value>) -> Result<DeltaStream>;
}

// --- HTTP implementation ---

pub struct HttpApiClient {
    client: Client,
    config: ApiConfig,
    token: Option<String>,
}

impl HttpApiClient {
    pub fn new(config: ApiConfig, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            config,
            token,
        }
    }

    /// Builds a client, resolving the bearer token named in `config`.
    pub fn from_config(config: ApiConfig) -> Result<Self> {
        let token = resolve_api_token(&config)?;
        Ok(Self::new(config, token))
    }

    fn request(&self, method: Method, path: &str, body: Option<&Value>) -> RequestBuilder {
        let mut request = self.client.request(method, self.config.url(path));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Response> {
        log::info!("{} {}", method, path);
        let response = self
            .request(method.clone(), path, body)
            .send()
            .await
            .context(format!("Failed to send {} request to {}", method, path))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "<Failed to read error body>".to_string());
            log::error!("{} {} failed with status {}: {}", method, path, status, error_body);
            return Err(anyhow::anyhow!(
                "{} {} failed with status {}: {}",
                method,
                path,
                status,
                error_body
            ));
        }
        Ok(response)
    }
}

#[async_trait]
impl ChatApi for HttpApiClient {
    async fn get(&self, path: &str) -> Result<Value> {
        let response = self.send(Method::GET, path, None).await?;
        let text = response.text().await.context("Failed to read response body")?;
        decode_json(&text)
    }

    async fn post(&self, path: &str, body: Option<Value>) -> Result<Value> {
        let response = self.send(Method::POST, path, body.as_ref()).await?;
        let text = response.text().await.context("Failed to read response body")?;
        decode_json(&text)
    }

    async fn post_stream(&self, path: &str, body: Option<Value>) -> Result<DeltaStream> {
        let response = self.send(Method::POST, path, body.as_ref()).await?;
        Ok(delta_stream(response.bytes_stream()))
    }
}

// Empty bodies (e.g. 204 from the scores endpoint) decode to `null`.
fn decode_json(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).context("Failed to parse response body as JSON")
}

/// Turns a raw SSE byte stream into its `data:` payloads, ending at `[DONE]`.
pub fn delta_stream<S, B, E>(bytes: S) -> DeltaStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let fragments = bytes
        .eventsource()
        .map(|event_result| -> Result<Option<String>> {
            let event = event_result.context("Error reading stream event")?;
            if event.data.trim() == STREAM_DONE {
                log::info!("Stream finished with [DONE]");
                return Ok(None);
            }
            Ok(Some(event.data))
        })
        .take_while(|result| future::ready(!matches!(result, Ok(None))))
        .filter_map(|result| future::ready(result.transpose()));

    Box::pin(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{stream, TryStreamExt};

    #[test]
    fn decode_json_maps_empty_body_to_null() {
        assert_eq!(decode_json("").unwrap(), Value::Null);
        assert_eq!(decode_json("  \n").unwrap(), Value::Null);
    }

    #[test]
    fn decode_json_parses_body() {
        let value = decode_json(r#"{"id": 3, "messages": []}"#).unwrap();
        assert_eq!(value["id"], 3);
    }

    #[test]
    fn decode_json_rejects_garbage() {
        assert!(decode_json("<html>").is_err());
    }

    #[tokio::test]
    async fn delta_stream_yields_data_until_done() {
        let chunks: Vec<std::result::Result<&'static str, std::io::Error>> = vec![
            Ok("data: Hel\n\n"),
            Ok("data: lo\n\ndata: [DONE]\n\n"),
            Ok("data: ignored\n\n"),
        ];
        let fragments: Vec<String> = delta_stream(stream::iter(chunks))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(fragments, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn delta_stream_handles_events_split_across_chunks() {
        let chunks: Vec<std::result::Result<&'static str, std::io::Error>> =
            vec![Ok("da"), Ok("ta: whole\n"), Ok("\n")];
        let fragments: Vec<String> = delta_stream(stream::iter(chunks))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(fragments, vec!["whole"]);
    }

    #[tokio::test]
    async fn delta_stream_surfaces_transport_errors() {
        let chunks: Vec<std::result::Result<&'static str, std::io::Error>> = vec![
            Ok("data: a\n\n"),
            Err(std::io::Error::new(std::io::ErrorKind::Other, "reset")),
        ];
        let mut fragments = delta_stream(stream::iter(chunks));
        assert_eq!(fragments.next().await.unwrap().unwrap(), "a");
        assert!(fragments.next().await.unwrap().is_err());
    }
}
