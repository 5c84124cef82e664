//! [`CallbackHandlerRegistry`] and [`Hooks`]: the pieces `configure`
//! installs so a finished request's terminal value can be routed back to
//! user code (§4.5, §4.6). [`execute_callback_job`] is the `CallbackJob`
//! execution side a job worker calls once it pops one off the queue.

use async_http_jobqueue::{CallbackError, CallbackHandler, CallbackJob, CallbackJobError};
use async_http_payload::PayloadStoreRegistry;
use async_http_value::{Response, TerminalValue};
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves a `callback_class_name` to the handler instance registered
/// under it at configure-time. Flat name -> instance lookup stands in for
/// "resolve callback_class_name to a class; instantiate" (§4.5 step 1) —
/// there is no dynamic class loading in Rust, so the handler is registered
/// up front instead.
#[derive(Default)]
pub struct CallbackHandlerRegistry {
    handlers: HashMap<String, Arc<dyn CallbackHandler>>,
}

impl CallbackHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn CallbackHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn CallbackHandler>> {
        self.handlers.get(name).cloned()
    }
}

/// Global before-hooks installed via configuration (§2 item 3, §4.5 step
/// 3): run ahead of `on_complete`/`on_error`, in registration order.
#[derive(Default, Clone)]
pub struct Hooks {
    after_completion: Vec<Arc<dyn Fn(&Response) + Send + Sync>>,
    after_error: Vec<Arc<dyn Fn(&CallbackError) + Send + Sync>>,
}

impl Hooks {
    pub fn push_after_completion(&mut self, hook: impl Fn(&Response) + Send + Sync + 'static) {
        self.after_completion.push(Arc::new(hook));
    }

    pub fn push_after_error(&mut self, hook: impl Fn(&CallbackError) + Send + Sync + 'static) {
        self.after_error.push(Arc::new(hook));
    }

    fn run_after_completion(&self, response: &Response) {
        for hook in &self.after_completion {
            hook(response);
        }
    }

    fn run_after_error(&self, error: &CallbackError) {
        for hook in &self.after_error {
            hook(error);
        }
    }
}

/// Runs a `CallbackJob` (§4.5 "CallbackJob execution"): resolves the
/// handler, loads the terminal value (fetching an externalized body first
/// if the blob still carries a `$ref`), unstores the external payload the
/// moment it's been inlined, then runs the before-hooks and invokes
/// `on_complete`/`on_error`.
///
/// The unstore happens *before* the handler runs, not in a `finally` after
/// it, because `on_complete`/`on_error` is arbitrary user code called
/// synchronously: a panic there would unwind straight past any cleanup
/// placed after the call, leaking the blob. The delete is idempotent, so
/// doing it early costs nothing and is the only way to guarantee it always
/// runs — matching "still attempt the unstore to avoid leaked blobs" (§4.5)
/// even when the handler itself fails catastrophically.
pub async fn execute_callback_job(
    job: CallbackJob,
    handlers: &CallbackHandlerRegistry,
    payload_stores: &PayloadStoreRegistry,
    hooks: &Hooks,
) -> Result<(), CallbackJobError> {
    let handler = handlers
        .resolve(&job.callback_class_name)
        .ok_or_else(|| CallbackJobError::ClassNotRegistered(job.callback_class_name.clone()))?;

    let mut hash = job.result_blob;
    let external_ref = async_http_value::body_ref(&hash);
    if let Some(reference) = &external_ref {
        let store = payload_stores
            .get(&reference.store)
            .map_err(|e| CallbackJobError::LoadFailed(e.to_string()))?;
        let resolved = store
            .fetch(&reference.key)
            .await
            .map_err(|e| CallbackJobError::LoadFailed(e.to_string()))?
            .ok_or_else(|| {
                CallbackJobError::LoadFailed(format!(
                    "payload {:?} not found in store {:?}",
                    reference.key, reference.store
                ))
            })?;
        async_http_value::inline_body(&mut hash, resolved);
        let _ = store.delete(&reference.key).await;
    }

    let terminal = TerminalValue::load(job.result_kind.into(), hash)
        .map_err(|e| CallbackJobError::LoadFailed(e.to_string()))?;

    dispatch_terminal_value(terminal, handler.as_ref(), hooks)
}

fn dispatch_terminal_value(
    terminal: TerminalValue,
    handler: &dyn CallbackHandler,
    hooks: &Hooks,
) -> Result<(), CallbackJobError> {
    match terminal {
        TerminalValue::Response(response) => {
            hooks.run_after_completion(&response);
            handler.on_complete(response);
        }
        TerminalValue::TransportError(error) => {
            let error = CallbackError::Transport(error);
            hooks.run_after_error(&error);
            handler.on_error(error);
        }
        TerminalValue::HttpError(error) => {
            let error = CallbackError::Http(error);
            hooks.run_after_error(&error);
            handler.on_error(error);
        }
        TerminalValue::RedirectError(error) => {
            let error = CallbackError::Redirect(error);
            hooks.run_after_error(&error);
            handler.on_error(error);
        }
    }
    Ok(())
}
