/// Errors from the chat-completions gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway returned a non-2xx status code.
    #[error("AI gateway error ({status}): {body}")]
    Api {
        status: u16,
        /// Raw response body, surfaced to the caller as-is.
        body: String,
    },

    /// A 2xx response whose body did not carry a usable completion.
    #[error("Invalid AI gateway response: {0}")]
    InvalidResponse(String),
}
