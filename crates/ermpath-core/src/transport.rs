//! HTTP collaborator seam.
//!
//! The core never performs I/O itself. Requests it composes are handed to a
//! [`Transport`]; retry, authentication and cancellation live behind it.

use crate::{encode, error::Error};
use async_trait::async_trait;
use derive_more::Display;
use serde_json::Value;
use std::collections::BTreeMap;

/// Header carrying the client context of a request.
pub const CONTEXT_HEADER: &str = "Deriva-Client-Context";

///
/// Method
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum Method {
    #[display("DELETE")]
    Delete,
    #[display("GET")]
    Get,
    #[display("POST")]
    Post,
    #[display("PUT")]
    Put,
}

///
/// Request
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Request {
    pub method: Method,
    pub uri: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach the client context as an encoded JSON header.
    #[must_use]
    pub fn with_context(mut self, context: &Value) -> Self {
        self.headers.insert(
            CONTEXT_HEADER.to_string(),
            encode::component(&context.to_string()),
        );
        self
    }
}

///
/// Response
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Body of a 2xx response; anything else becomes `Error::Transport`.
    pub fn into_body(self) -> Result<Value, Error> {
        if self.is_success() {
            return Ok(self.body);
        }

        let message = match &self.body {
            Value::String(s) => s.clone(),
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| self.body.to_string(), ToString::to_string),
            Value::Null => String::new(),
            other => other.to_string(),
        };

        Err(Error::transport(self.status, message))
    }
}

///
/// Transport
///

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response, Error>;

    async fn get(&self, uri: &str) -> Result<Value, Error> {
        self.send(Request::new(Method::Get, uri)).await?.into_body()
    }

    async fn post(&self, uri: &str, body: Value) -> Result<Value, Error> {
        self.send(Request::new(Method::Post, uri).with_body(body))
            .await?
            .into_body()
    }

    async fn put(&self, uri: &str, body: Value) -> Result<Value, Error> {
        self.send(Request::new(Method::Put, uri).with_body(body))
            .await?
            .into_body()
    }

    async fn delete(&self, uri: &str) -> Result<Value, Error> {
        self.send(Request::new(Method::Delete, uri)).await?.into_body()
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingTransport;
    use serde_json::json;

    #[test]
    fn non_success_status_maps_to_transport_error() {
        let response = Response {
            status: 409,
            body: json!({"message": "conflict on key"}),
        };

        let err = response.into_body().expect_err("409 should fail");
        assert!(matches!(
            err,
            Error::Transport { status: 409, ref message } if message == "conflict on key"
        ));
    }

    #[test]
    fn context_header_is_encoded_json() {
        let request = Request::new(Method::Get, "/x").with_context(&json!({"cid": "app"}));

        assert_eq!(
            request.headers.get(CONTEXT_HEADER).map(String::as_str),
            Some("%7B%22cid%22%3A%22app%22%7D")
        );
    }

    #[tokio::test]
    async fn default_verbs_send_through_the_transport() {
        let transport = RecordingTransport::with_responses([json!([{"id": 1}])]);

        let body = transport.get("/entity/s:t").await.expect("get should succeed");
        transport
            .delete("/entity/s:t/id=1")
            .await
            .expect("delete should succeed");

        assert_eq!(body, json!([{"id": 1}]));
        let methods: Vec<Method> = transport.requests().iter().map(|r| r.method).collect();
        assert_eq!(methods, [Method::Get, Method::Delete]);
    }
}
