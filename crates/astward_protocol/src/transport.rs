//! Transport seam between the versioned clients and the HTTP stack.
//!
//! The clients in `astward` describe every remote call as an [`ApiRequest`]
//! and read back an [`ApiResponse`]. TLS, authentication headers, timeouts
//! and socket handling belong to whoever implements [`Transport`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::error::{ProtocolError, Result};

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One remote call. Query values are passed unencoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Look up a query parameter by name.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        for (idx, (key, value)) in self.query.iter().enumerate() {
            let sep = if idx == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, key, value)?;
        }
        Ok(())
    }
}

/// Status and decoded JSON body of a completed call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, Some(body))
    }

    pub fn no_content() -> Self {
        Self::new(204, None)
    }

    pub fn not_found() -> Self {
        Self::new(404, None)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Fail on any non-2xx status.
    pub fn require_success(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ProtocolError::UnexpectedStatus {
                status: self.status,
            })
        }
    }

    /// Decode the body of a successful response.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        let response = self.require_success()?;
        let body = response.body.ok_or(ProtocolError::MissingBody)?;
        Ok(serde_json::from_value(body)?)
    }

    /// Decode the body, treating 404 and empty 2xx responses as absent.
    pub fn json_opt<T: DeserializeOwned>(self) -> Result<Option<T>> {
        if self.is_not_found() {
            return Ok(None);
        }
        let response = self.require_success()?;
        match response.body {
            None | Some(Value::Null) => Ok(None),
            Some(body) => Ok(Some(serde_json::from_value(body)?)),
        }
    }
}

/// Failure reported by a transport implementation.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The call was abandoned because the job was cancelled.
    #[error("Remote call interrupted")]
    Interrupted,

    #[error("Connection to {endpoint} failed: {message}")]
    Connect { endpoint: String, message: String },

    #[error("Request {request} failed: {message}")]
    Request { request: String, message: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Executes remote calls against one server. One instance per job.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &ApiRequest) -> std::result::Result<ApiResponse, TransportError>;
}
