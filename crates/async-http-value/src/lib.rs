//! Immutable value model for async-http-processor: `Request`, `Response`,
//! the transport `Error`, `HttpError`/redirect errors, `CallbackArgs`, and
//! the `as_hash`/`load` serialization contract that lets a terminal value
//! cross the process boundary into a callback job.

pub mod callback_args;
pub mod error;
pub mod hash;
pub mod headers;
pub mod http_error;
pub mod request;
pub mod response;
mod serde_url;

pub use callback_args::{CallbackArgs, JsonScalar};
pub use error::{Error, ErrorType};
pub use hash::{body_ref, externalize_body, inline_body, LoadError, PayloadRef, ResultKind, TerminalValue};
pub use headers::HttpHeaders;
pub use http_error::{HttpError, HttpErrorHash, RedirectError, RedirectErrorData, RedirectErrorHash, UnknownErrorClass};
pub use request::{Method, Request, RequestBuildError, RequestBuilder};
pub use response::{InvalidStatus, Response};
