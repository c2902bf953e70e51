//! Redirect fragment parsing.
//!
//! On return from hosted login the fragment looks like
//! `access_token=..&id_token=..&token_type=Bearer&expires_in=7200&state=..`
//! or, on failure, `error=access_denied&error_description=..`.

use std::collections::HashMap;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use url::form_urlencoded;

use super::{AuthResult, IdTokenPayload, ProviderError, ProviderResult};

/// Parse a redirect fragment (leading `#` optional).
pub fn parse_fragment(fragment: &str) -> ProviderResult<Option<AuthResult>> {
    let fragment = fragment.trim_start_matches('#');
    if fragment.is_empty() {
        return Ok(None);
    }

    let params: HashMap<String, String> = form_urlencoded::parse(fragment.as_bytes())
        .into_owned()
        .collect();
    let param = |name: &str| params.get(name).filter(|v| !v.is_empty()).cloned();

    if let Some(code) = param("error") {
        return Err(ProviderError {
            code: Some(code),
            description: param("error_description"),
            ..Default::default()
        });
    }

    let access_token = param("access_token");
    let id_token = param("id_token");
    if access_token.is_none() && id_token.is_none() {
        return Ok(None);
    }

    let id_token_payload = match &id_token {
        Some(token) => Some(decode_id_token(token)?),
        None => None,
    };

    Ok(Some(AuthResult {
        access_token,
        id_token,
        id_token_payload,
        expires_in: param("expires_in").and_then(|v| v.parse().ok()),
        token_type: param("token_type"),
        scope: param("scope"),
        state: param("state"),
    }))
}

/// Decode the claims segment of a JWT. The signature is not checked.
pub fn decode_id_token(token: &str) -> ProviderResult<IdTokenPayload> {
    let invalid = |detail: &str| ProviderError::new("invalid_token", format!("ID token {}", detail));

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(invalid("is not a JWT"));
    }

    let claims = URL_SAFE_NO_PAD
        .decode(segments[1].trim_end_matches('='))
        .map_err(|_| invalid("payload is not base64url"))?;

    serde_json::from_slice(&claims).map_err(|_| invalid("payload is not valid JSON"))
}

/// Build an unsigned JWT carrying `claims`.
#[cfg(test)]
pub(crate) fn encode_test_token(claims: &serde_json::Value) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_success_fragment() {
        let id_token = encode_test_token(&json!({"sub": "auth0|1", "email": "u@x.com"}));
        let fragment = format!(
            "#access_token=a&id_token={}&token_type=Bearer&expires_in=7200&state=xyz",
            id_token
        );

        let result = parse_fragment(&fragment).unwrap().unwrap();
        assert!(result.has_tokens());
        assert_eq!(result.access_token.as_deref(), Some("a"));
        assert_eq!(result.email(), Some("u@x.com"));
        assert_eq!(result.expires_in, Some(7200));
        assert_eq!(result.state.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_parse_error_fragment() {
        let err = parse_fragment("error=access_denied&error_description=User%20cancelled")
            .unwrap_err();
        assert_eq!(err.code.as_deref(), Some("access_denied"));
        assert_eq!(err.describe("Auth error"), "User cancelled");
    }

    #[test]
    fn test_unrelated_fragment_is_none() {
        assert_eq!(parse_fragment("").unwrap(), None);
        assert_eq!(parse_fragment("#").unwrap(), None);
        assert_eq!(parse_fragment("section-2").unwrap(), None);
        assert_eq!(parse_fragment("tab=subtitles").unwrap(), None);
    }

    #[test]
    fn test_access_token_only_has_no_payload() {
        let result = parse_fragment("access_token=a").unwrap().unwrap();
        assert!(!result.has_tokens());
        assert!(result.id_token_payload.is_none());
    }

    #[test]
    fn test_garbage_id_token_is_error() {
        let err = parse_fragment("access_token=a&id_token=not-a-jwt").unwrap_err();
        assert_eq!(err.code.as_deref(), Some("invalid_token"));

        let err = decode_id_token("a.!!!.c").unwrap_err();
        assert!(err.describe("").contains("base64url"));
    }

    #[test]
    fn test_decode_tolerates_padding() {
        let token = encode_test_token(&json!({"email": "pad@x.com"}));
        let mut segments: Vec<String> = token.split('.').map(str::to_string).collect();
        segments[1].push_str("==");
        let payload = decode_id_token(&segments.join(".")).unwrap();
        assert_eq!(payload.email.as_deref(), Some("pad@x.com"));
    }
}
