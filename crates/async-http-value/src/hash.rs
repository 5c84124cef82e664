//! The `as_hash()`/`load()` serialization contract (§4.6): every value in
//! this crate round-trips through a string-keyed, JSON-safe map, with
//! `HttpError`/`RedirectError` dispatching reconstruction on an embedded
//! tag rather than relying on the caller to already know the concrete type.

use crate::error::Error;
use crate::http_error::{HttpError, HttpErrorHash, RedirectError, RedirectErrorHash, UnknownErrorClass};
use crate::response::Response;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// The kind tag carried alongside a serialized terminal value, matching
/// the `CallbackJob` `result_kind` argument (`"response"` or `"error"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Response,
    Error,
}

impl ResultKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultKind::Response => "response",
            ResultKind::Error => "error",
        }
    }
}

/// The terminal outcome of one HTTP exchange, as delivered to callback
/// dispatch before being handed to a `CallbackHandler`.
#[derive(Clone, Debug, PartialEq)]
pub enum TerminalValue {
    Response(Response),
    TransportError(Error),
    HttpError(HttpError),
    RedirectError(RedirectError),
}

impl TerminalValue {
    /// The `result_kind` this value serializes under.
    pub fn result_kind(&self) -> ResultKind {
        match self {
            TerminalValue::Response(_) => ResultKind::Response,
            TerminalValue::TransportError(_)
            | TerminalValue::HttpError(_)
            | TerminalValue::RedirectError(_) => ResultKind::Error,
        }
    }

    /// Serializes to the neutral, string-keyed JSON-safe hash form.
    pub fn as_hash(&self) -> Json {
        match self {
            TerminalValue::Response(r) => {
                serde_json::to_value(WithTag {
                    value_class: "Response",
                    inner: r,
                })
                .expect("Response always serializes")
            }
            TerminalValue::TransportError(e) => serde_json::to_value(WithTag {
                value_class: "Error",
                inner: e,
            })
            .expect("Error always serializes"),
            TerminalValue::HttpError(e) => {
                serde_json::to_value(HttpErrorHash::from(e)).expect("HttpError always serializes")
            }
            TerminalValue::RedirectError(e) => serde_json::to_value(RedirectErrorHash::from(e))
                .expect("RedirectError always serializes"),
        }
    }

    /// Reconstructs a [`TerminalValue`] from its `as_hash()` form and the
    /// accompanying `result_kind`.
    pub fn load(kind: ResultKind, hash: Json) -> Result<Self, LoadError> {
        match kind {
            ResultKind::Response => {
                let tagged: WithTagOwned<Response> = serde_json::from_value(hash)?;
                Ok(TerminalValue::Response(tagged.inner))
            }
            ResultKind::Error => {
                // Disambiguate among Error / HttpError / RedirectError by
                // the embedded class tag, same as HttpError::load /
                // RedirectError::load do individually.
                let class = hash
                    .get("value_class")
                    .and_then(Json::as_str)
                    .or_else(|| hash.get("error_class").and_then(Json::as_str))
                    .ok_or(LoadError::MissingClassTag)?;

                match class {
                    "Error" => {
                        let tagged: WithTagOwned<Error> = serde_json::from_value(hash)?;
                        Ok(TerminalValue::TransportError(tagged.inner))
                    }
                    "ClientError" | "ServerError" => {
                        let tagged: HttpErrorHash = serde_json::from_value(hash)?;
                        Ok(TerminalValue::HttpError(tagged.load()))
                    }
                    "TooManyRedirectsError" | "RecursiveRedirectError" => {
                        let tagged: RedirectErrorHash = serde_json::from_value(hash)?;
                        Ok(TerminalValue::RedirectError(tagged.load()?))
                    }
                    other => Err(LoadError::UnknownErrorClass(UnknownErrorClass(
                        other.to_string(),
                    ))),
                }
            }
        }
    }
}

/// Errors raised while reconstructing a [`TerminalValue`] from its hash
/// form.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("serialized hash is missing a class tag")]
    MissingClassTag,
    #[error(transparent)]
    UnknownErrorClass(#[from] UnknownErrorClass),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct WithTag<'a, T> {
    value_class: &'static str,
    #[serde(flatten)]
    inner: &'a T,
}

#[derive(Deserialize)]
struct WithTagOwned<T> {
    #[allow(dead_code)]
    value_class: String,
    #[serde(flatten)]
    inner: T,
}

/// A reference to a payload externalized to a [`crate::PayloadStore`]-style
/// adapter, substituted in place of an oversized `body` field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PayloadRef {
    pub store: String,
    pub key: String,
}

const REF_FIELD: &str = "$ref";
const BODY_FIELD: &str = "body";

/// Replaces the top-level `body` field of a serialized hash with a
/// `{ "$ref": { "store": ..., "key": ... } }` marker, returning the bytes
/// that were extracted so the caller can write them to the named store.
///
/// No-op (returns `None`) if there is no `body` field or it is already
/// `null`.
pub fn externalize_body(hash: &mut Json, store: &str, key: &str) -> Option<Json> {
    let obj = hash.as_object_mut()?;
    let existing = obj.get(BODY_FIELD)?;
    if existing.is_null() {
        return None;
    }
    let extracted = obj.remove(BODY_FIELD)?;
    obj.insert(
        BODY_FIELD.to_string(),
        serde_json::json!({ REF_FIELD: { "store": store, "key": key } }),
    );
    Some(extracted)
}

/// Returns the [`PayloadRef`] the `body` field was substituted with, if
/// any.
pub fn body_ref(hash: &Json) -> Option<PayloadRef> {
    let body = hash.get(BODY_FIELD)?;
    let reference = body.get(REF_FIELD)?;
    serde_json::from_value(reference.clone()).ok()
}

/// Replaces a `{ "$ref": ... }` `body` field with the resolved bytes,
/// making the hash indistinguishable from one that was never
/// externalized.
pub fn inline_body(hash: &mut Json, resolved: Json) {
    if let Some(obj) = hash.as_object_mut() {
        obj.insert(BODY_FIELD.to_string(), resolved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback_args::CallbackArgs;
    use crate::headers::HttpHeaders;
    use crate::request::Method;
    use std::time::Duration;
    use url::Url;
    use uuid::Uuid;

    fn sample_response() -> Response {
        Response::new(
            200,
            HttpHeaders::new(),
            Some(b"hello".to_vec()),
            "HTTP/1.1",
            Duration::from_millis(42),
            Uuid::new_v4(),
            Url::parse("https://example.com/test/200").unwrap(),
            Method::Get,
            CallbackArgs::from_pairs([("webhook_id", "W".into()), ("index", 1i64.into())]),
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn response_round_trips_field_for_field() {
        let response = sample_response();
        let value = TerminalValue::Response(response.clone());
        let hash = value.as_hash();
        let loaded = TerminalValue::load(ResultKind::Response, hash).unwrap();
        assert_eq!(loaded, TerminalValue::Response(response));
    }

    #[test]
    fn transport_error_round_trips() {
        let error = Error::new(
            "Timeout",
            "connect timed out",
            None,
            crate::error::ErrorType::Timeout,
            Duration::from_millis(100),
            Uuid::new_v4(),
            "https://example.com",
            Method::Get,
            CallbackArgs::new(),
        );
        let value = TerminalValue::TransportError(error.clone());
        let hash = value.as_hash();
        let loaded = TerminalValue::load(ResultKind::Error, hash).unwrap();
        assert_eq!(loaded, TerminalValue::TransportError(error));
    }

    #[test]
    fn http_error_round_trips_via_error_kind() {
        let error = HttpError::from_response(
            Response::new(
                404,
                HttpHeaders::new(),
                None,
                "HTTP/1.1",
                Duration::from_millis(5),
                Uuid::new_v4(),
                Url::parse("https://example.com").unwrap(),
                Method::Get,
                CallbackArgs::new(),
                vec![],
            )
            .unwrap(),
        );
        let value = TerminalValue::HttpError(error.clone());
        let hash = value.as_hash();
        let loaded = TerminalValue::load(ResultKind::Error, hash).unwrap();
        assert_eq!(loaded, TerminalValue::HttpError(error));
    }

    #[test]
    fn externalized_body_is_indistinguishable_after_resolution() {
        let response = sample_response();
        let value = TerminalValue::Response(response.clone());
        let mut hash = value.as_hash();

        let extracted = externalize_body(&mut hash, "default", "abc-123").unwrap();
        let reference = body_ref(&hash).unwrap();
        assert_eq!(reference.store, "default");
        assert_eq!(reference.key, "abc-123");

        inline_body(&mut hash, extracted);
        let loaded = TerminalValue::load(ResultKind::Response, hash).unwrap();
        assert_eq!(loaded, TerminalValue::Response(response));
    }

    #[test]
    fn callback_args_survive_the_round_trip() {
        let response = sample_response();
        let value = TerminalValue::Response(response);
        let hash = value.as_hash();
        let loaded = TerminalValue::load(ResultKind::Response, hash).unwrap();
        let TerminalValue::Response(r) = loaded else {
            panic!("expected response");
        };
        assert_eq!(r.callback_args.get("webhook_id").unwrap().to_owned(), crate::callback_args::JsonScalar::String("W".into()));
    }
}
