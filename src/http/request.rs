/// A single `name=value` pair from the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    pub name: String,
    pub value: String,
}

impl QueryParam {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The fields taken from a request's start line.
///
/// Only the start line is parsed; headers are skipped unless an upload needs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    /// The method token as sent, e.g. `GET` or `POST`
    pub method: String,
    /// Request path without its leading `/` (`/index.html` becomes `index.html`)
    pub path: String,
    /// Query parameters in the order they were sent
    pub params: Vec<QueryParam>,
}

impl ParsedRequest {
    /// Looks up the first query parameter named `name`.
    ///
    /// # Example
    ///
    /// ```
    /// # use courier::http::request::{ParsedRequest, QueryParam};
    /// let req = ParsedRequest {
    ///     method: "GET".to_string(),
    ///     path: "image-filter".to_string(),
    ///     params: vec![QueryParam::new("filter", "greyscale")],
    /// };
    /// assert_eq!(req.param("filter"), Some("greyscale"));
    /// assert_eq!(req.param("image"), None);
    /// ```
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn is_method(&self, method: &str) -> bool {
        self.method == method
    }
}
