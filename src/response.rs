use std::path::Path;

use serde_json::Value;

use crate::io::{self, IoError};

/// Latest HTTP response as seen by the assertion layer.
pub trait ResponseSource {
    /// Raw response body, expected to be JSON.
    fn body(&self) -> &str;

    /// HTTP status code, when the source knows it.
    fn status(&self) -> Option<u16> {
        None
    }
}

impl<T: ResponseSource + ?Sized> ResponseSource for &T {
    fn body(&self) -> &str {
        (**self).body()
    }

    fn status(&self) -> Option<u16> {
        (**self).status()
    }
}

impl<T: ResponseSource + ?Sized> ResponseSource for Box<T> {
    fn body(&self) -> &str {
        (**self).body()
    }

    fn status(&self) -> Option<u16> {
        (**self).status()
    }
}

impl ResponseSource for str {
    fn body(&self) -> &str {
        self
    }
}

impl ResponseSource for String {
    fn body(&self) -> &str {
        self
    }
}

/// Response captured by an HTTP test client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResponse {
    status: u16,
    body: String,
}

impl TestResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    /// Builds a response whose body is the JSON, YAML or TOML fixture at
    /// `path`, re-encoded as JSON.
    pub fn from_fixture(status: u16, path: impl AsRef<Path>) -> Result<Self, IoError> {
        let document = io::reader::read_path(path.as_ref())?;
        Ok(Self::json(status, &document))
    }
}

impl ResponseSource for TestResponse {
    fn body(&self) -> &str {
        &self.body
    }

    fn status(&self) -> Option<u16> {
        Some(self.status)
    }
}
