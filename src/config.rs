//! Relay configuration.
//!
//! Defaults target the live past-orders API; every value can be overridden
//! from the command line or environment (see `cli`).

/// Default past-orders endpoint.
pub const DEFAULT_ENDPOINT: &str =
    "https://www.gyftr.com/smartbuyapi/hdfc/api/v1/order/userpastorders";

/// Path fragment identifying past-orders requests for ambient capture.
pub const DEFAULT_CAPTURE_PATH: &str = "/smartbuyapi/hdfc/api/v1/order/userpastorders";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// URL the on-demand fetch POSTs to
    pub endpoint: String,
    /// Requests whose URL contains this fragment are captured
    pub capture_path: String,
    /// Cookie names tried in order for the primary user id
    pub user_id_cookies: Vec<String>,
    /// Cookie name of the transaction token
    pub txn_token_cookie: String,
    /// Ambient cookie string of the session (`name=value; ...`)
    pub cookies: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            capture_path: DEFAULT_CAPTURE_PATH.to_string(),
            user_id_cookies: vec!["smartbuy_token".to_string(), "smartbuy_user".to_string()],
            txn_token_cookie: "smartbuy_txn_token".to_string(),
            cookies: String::new(),
        }
    }
}

impl RelayConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_capture_path(mut self, capture_path: impl Into<String>) -> Self {
        self.capture_path = capture_path.into();
        self
    }

    pub fn with_cookies(mut self, cookies: impl Into<String>) -> Self {
        self.cookies = cookies.into();
        self
    }

    /// Whether a request URL targets the past-orders endpoint.
    pub fn is_capture_target(&self, url: &str) -> bool {
        !self.capture_path.is_empty() && url.contains(&self.capture_path)
    }
}
