//! Ordered request/response middleware.
//!
//! A `Pipeline` is an explicit list of `Middleware`. Request hooks run in list
//! order and the first one that returns a response short-circuits the
//! handler. Response hooks also run in list order; there is no implicit
//! reversal, so the configured list is the whole story.

use std::collections::BTreeMap;

use tracing::debug;

use agira_contracts::error::{AgiraError, AgiraResult};

/// Path prefix served inside third-party pages (embeddable widgets).
pub const EMBED_PATH_PREFIX: &str = "/embed/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub headers: BTreeMap<String, String>,
}

impl Request {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// One request/response transformer.
pub trait Middleware: Send + Sync {
    /// Name used in configuration.
    fn name(&self) -> &'static str;

    /// Inspect or rewrite the request. Returning a response skips the handler
    /// and every later request hook.
    fn process_request(&self, _request: &mut Request) -> Option<Response> {
        None
    }

    fn process_response(&self, _request: &Request, response: Response) -> Response {
        response
    }
}

/// Widget pages may be framed by any site; everything else may not.
#[derive(Debug, Default)]
pub struct EmbedFrameHeaders;

impl Middleware for EmbedFrameHeaders {
    fn name(&self) -> &'static str {
        "embed_frame"
    }

    fn process_response(&self, request: &Request, mut response: Response) -> Response {
        if request.path.starts_with(EMBED_PATH_PREFIX) {
            response.headers.remove("X-Frame-Options");
            response.headers.insert(
                "Content-Security-Policy".to_string(),
                "frame-ancestors *".to_string(),
            );
        } else {
            response
                .headers
                .insert("X-Frame-Options".to_string(), "DENY".to_string());
        }
        response
    }
}

/// Baseline hardening headers for every response.
#[derive(Debug, Default)]
pub struct SecurityHeaders;

impl Middleware for SecurityHeaders {
    fn name(&self) -> &'static str {
        "security_headers"
    }

    fn process_response(&self, _request: &Request, mut response: Response) -> Response {
        response
            .headers
            .entry("X-Content-Type-Options".to_string())
            .or_insert_with(|| "nosniff".to_string());
        response
            .headers
            .entry("Referrer-Policy".to_string())
            .or_insert_with(|| "same-origin".to_string());
        response
    }
}

/// Explicitly ordered middleware chain.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Middleware>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage to the end of the chain.
    pub fn with(mut self, middleware: Box<dyn Middleware>) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Build a pipeline from built-in middleware names, in the given order.
    ///
    /// Returns `ConfigError` for a name that is not built in.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> AgiraResult<Self> {
        let mut pipeline = Self::new();
        for name in names {
            let stage: Box<dyn Middleware> = match name.as_ref() {
                "embed_frame" => Box::new(EmbedFrameHeaders),
                "security_headers" => Box::new(SecurityHeaders),
                other => {
                    return Err(AgiraError::ConfigError {
                        reason: format!("unknown middleware '{}'", other),
                    })
                }
            };
            pipeline = pipeline.with(stage);
        }
        Ok(pipeline)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|m| m.name()).collect()
    }

    /// Run `request` through the chain around `handler`.
    pub fn handle<H>(&self, mut request: Request, handler: H) -> Response
    where
        H: FnOnce(&Request) -> Response,
    {
        let mut short_circuit = None;
        for stage in &self.stages {
            if let Some(response) = stage.process_request(&mut request) {
                debug!(middleware = stage.name(), path = %request.path, "request short-circuited");
                short_circuit = Some(response);
                break;
            }
        }

        let mut response = match short_circuit {
            Some(response) => response,
            None => handler(&request),
        };

        for stage in &self.stages {
            response = stage.process_response(&request, response);
        }
        response
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("stages", &self.names()).finish()
    }
}
