/// Errors from the layout persistence service client.
#[derive(Debug, thiserror::Error)]
pub enum LayoutApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Layout API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("Failed to decode layout API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl LayoutApiError {
    /// HTTP status of an API error, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::Decode(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// `true` for 401/403: the caller lacks access, retrying will not help.
    pub fn is_denied(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// `true` when a retry might succeed (transport failures and 5xx).
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::Api { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            Self::Decode(_) => false,
        }
    }
}
