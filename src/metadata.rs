//! Request metadata resolution.
//!
//! Turns the inbound transport headers of one call into an immutable
//! [`RequestMetadata`]: the claimed caller identity plus the idempotency and
//! conditional-request headers.
//!
//! The identity header holds a layered token: base64 (in one of three
//! accepted alphabets/padding modes) around a JSON claims object. Decoding
//! problems never fail the call; they only set
//! [`RequestMetadata::identity_invalid`], because several operations accept
//! identity through the request payload instead.

use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::engine::GeneralPurpose;
use base64::Engine as _;
use serde_json::{Map, Value};

use crate::rpc::headers::{
    Headers, IDEMPOTENCY_KEY_HEADER, IDENTITY_HEADER, IF_MATCH_HEADER, IF_NONE_MATCH_HEADER,
};
use crate::secret::Secret;

/// Decoders tried in order; the first that accepts the token wins.
const TOKEN_ENGINES: [&GeneralPurpose; 3] = [&URL_SAFE_NO_PAD, &URL_SAFE, &STANDARD];

/// Claim names consulted for the subject, highest priority first.
const SUBJECT_CLAIMS: [&str; 3] = ["sub", "user_id", "uid"];

/// Request-scoped control metadata.
///
/// Produced once per inbound call by [`RequestMetadata::resolve`] and never
/// mutated afterwards: there are no setters, and the value is shared by
/// reference once attached to a [`CallContext`](crate::CallContext).
///
/// # Examples
///
/// ```
/// use catalog_boundary::RequestMetadata;
/// use catalog_boundary::rpc::Headers;
///
/// let headers: Headers = [
///     ("X-Identity-Claims", "eyJzdWIiOiJhbGljZSJ9"),
///     ("Idempotency-Key", " k-1 "),
/// ]
/// .into_iter()
/// .collect();
///
/// let meta = RequestMetadata::resolve(&headers);
/// assert_eq!(meta.caller_id(), Some("alice"));
/// assert_eq!(meta.idempotency_key(), Some("k-1"));
/// assert!(!meta.identity_invalid());
/// ```
#[derive(Debug, Default)]
pub struct RequestMetadata {
    idempotency_key: Option<String>,
    if_match: Option<String>,
    if_none_match: Option<String>,
    caller_id: Option<String>,
    raw_identity_token: Option<Secret<String>>,
    identity_invalid: bool,
}

impl RequestMetadata {
    /// Resolves metadata from inbound headers.
    ///
    /// Never fails: an unusable identity token is recorded via
    /// [`identity_invalid`](Self::identity_invalid) and left for the
    /// operation to reject or tolerate.
    pub fn resolve(headers: &Headers) -> Self {
        let raw_token = headers.get_trimmed(IDENTITY_HEADER);
        let caller_id = raw_token.and_then(decode_subject);
        let identity_invalid = raw_token.is_some() && caller_id.is_none();

        if identity_invalid {
            tracing::debug!("identity header present but unusable");
        }

        Self {
            idempotency_key: headers.get_trimmed(IDEMPOTENCY_KEY_HEADER).map(str::to_owned),
            if_match: headers.get_trimmed(IF_MATCH_HEADER).map(str::to_owned),
            if_none_match: headers.get_trimmed(IF_NONE_MATCH_HEADER).map(str::to_owned),
            caller_id,
            raw_identity_token: raw_token.map(|t| Secret::new(t.to_owned())),
            identity_invalid,
        }
    }

    /// Client idempotency key, trimmed.
    pub fn idempotency_key(&self) -> Option<&str> {
        self.idempotency_key.as_deref()
    }

    /// `If-Match` precondition, trimmed.
    pub fn if_match(&self) -> Option<&str> {
        self.if_match.as_deref()
    }

    /// `If-None-Match` precondition, trimmed.
    pub fn if_none_match(&self) -> Option<&str> {
        self.if_none_match.as_deref()
    }

    /// Subject claimed by the identity token, if one was usable.
    pub fn caller_id(&self) -> Option<&str> {
        self.caller_id.as_deref()
    }

    /// The identity header exactly as received (trimmed).
    pub fn raw_identity_token(&self) -> Option<&Secret<String>> {
        self.raw_identity_token.as_ref()
    }

    /// Set when an identity token was supplied but yielded no subject.
    pub fn identity_invalid(&self) -> bool {
        self.identity_invalid
    }

    /// Whether every field is empty.
    ///
    /// The zero value is never attached to a call context.
    pub fn is_empty(&self) -> bool {
        self.idempotency_key.is_none()
            && self.if_match.is_none()
            && self.if_none_match.is_none()
            && self.caller_id.is_none()
            && self.raw_identity_token.is_none()
            && !self.identity_invalid
    }
}

/// Decodes an identity token down to its subject claim.
pub fn decode_subject(token: &str) -> Option<String> {
    let bytes = TOKEN_ENGINES
        .iter()
        .find_map(|engine| engine.decode(token).ok())?;
    let claims: Map<String, Value> = serde_json::from_slice(&bytes).ok()?;

    SUBJECT_CLAIMS
        .iter()
        .find_map(|name| claims.get(*name).and_then(claim_as_subject))
}

fn claim_as_subject(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
