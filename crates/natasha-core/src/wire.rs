//! JSON bodies exchanged with the same-origin credential endpoint.
//!
//! Shared by the endpoint itself and by [`HttpCredentialStore`](crate::auth::HttpCredentialStore),
//! and exported to TypeScript with the `ts` feature for the browser front end.

use serde::{Deserialize, Serialize};

/// `POST` request body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct TokenBody {
    pub token: String,
}

/// `GET` response body. `token` is `null` when no cookie is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct TokenResponse {
    pub token: Option<String>,
}

/// `POST`/`DELETE` acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_null() {
        let resp: TokenResponse = serde_json::from_str(r#"{"token": null}"#).unwrap();
        assert!(resp.token.is_none());

        let json = serde_json::to_string(&TokenResponse::default()).unwrap();
        assert_eq!(json, r#"{"token":null}"#);
    }

    #[test]
    fn test_token_body_requires_token() {
        assert!(serde_json::from_str::<TokenBody>("{}").is_err());
        let body: TokenBody = serde_json::from_str(r#"{"token": "abc123"}"#).unwrap();
        assert_eq!(body.token, "abc123");
    }
}
