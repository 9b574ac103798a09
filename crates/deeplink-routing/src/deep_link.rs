//! The value handed to route handlers.
//!
//! A [`DeepLink`] is built once per successful match and never mutated
//! afterwards. It carries the original URL, the raw pattern of the matched
//! route, the route parameters, and the parsed query and fragment.

use std::collections::HashMap;

use url::Url;

/// The query parameter that carries a URL to return to after handling.
pub const CALLBACK_URL_KEY: &str = "dpl_callback_url";

/// An immutable, matched deep link.
///
/// Route parameters and query parameters are kept separately. When a query
/// key collides with a route parameter name, lookups through [`get`](Self::get)
/// and [`parameters`](Self::parameters) return the route parameter.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use deeplink_routing::DeepLink;
/// use url::Url;
///
/// let url = Url::parse("dpl://table/book/42?id=7&party=4#menu").unwrap();
/// let params = HashMap::from([("id".to_string(), "42".to_string())]);
/// let link = DeepLink::new(url, "table/book/:id", params);
///
/// assert_eq!(link.get("id"), Some("42"));
/// assert_eq!(link.get("party"), Some("4"));
/// assert_eq!(link.query_parameters()["id"], "7");
/// assert_eq!(link.fragment(), Some("menu"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink {
    url: Url,
    route: String,
    route_parameters: HashMap<String, String>,
    query_parameters: HashMap<String, String>,
    fragment: Option<String>,
    callback_url: Option<Url>,
}

impl DeepLink {
    /// Builds a deep link from a URL, the matched route, and its parameters.
    ///
    /// Query pairs are form-decoded; a repeated key keeps its last value.
    pub fn new(
        url: Url,
        route: impl Into<String>,
        route_parameters: HashMap<String, String>,
    ) -> Self {
        let mut query_parameters = HashMap::new();
        for (key, value) in url.query_pairs() {
            query_parameters.insert(key.into_owned(), value.into_owned());
        }

        let callback_url = query_parameters
            .get(CALLBACK_URL_KEY)
            .and_then(|raw| Url::parse(raw).ok());
        let fragment = url.fragment().map(String::from);

        Self {
            url,
            route: route.into(),
            route_parameters,
            query_parameters,
            fragment,
            callback_url,
        }
    }

    /// Returns the URL the link was built from.
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the raw pattern of the route that matched.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Returns the values captured from the path, keyed by parameter name.
    pub const fn route_parameters(&self) -> &HashMap<String, String> {
        &self.route_parameters
    }

    /// Returns the decoded query parameters.
    pub const fn query_parameters(&self) -> &HashMap<String, String> {
        &self.query_parameters
    }

    /// Returns the URL fragment, if any.
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Returns the parsed `dpl_callback_url` query parameter, if present and valid.
    pub const fn callback_url(&self) -> Option<&Url> {
        self.callback_url.as_ref()
    }

    /// Looks up a route parameter, falling back to the query parameters.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.route_parameters
            .get(key)
            .or_else(|| self.query_parameters.get(key))
            .map(String::as_str)
    }

    /// Returns query and route parameters merged; route parameters win.
    pub fn parameters(&self) -> HashMap<String, String> {
        let mut merged = self.query_parameters.clone();
        merged.extend(
            self.route_parameters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        merged
    }
}
