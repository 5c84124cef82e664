//! The "current job" context (§9 design note: replace thread-local leakage
//! with an explicit object). [`JobContext`] is a plain value callers can
//! pass directly; [`current`] only exists so the job-system integration
//! shim (`middleware.rs`) can make it ambient for the duration of one job
//! without every call site threading it through by hand. Nothing in
//! `async-http-processor` ever reads the thread-local — `Processor::enqueue`
//! only ever sees an explicit [`JobEnvelope`].

use std::cell::RefCell;

/// Identifies the job a `request`/`get`/`post`/... call is running inside,
/// so the pushed `CallbackJob`/re-enqueued envelope can carry it forward.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JobContext {
    pub job_class: String,
    pub job_id: Option<String>,
    pub attempt: u32,
}

impl JobContext {
    pub fn new(job_class: impl Into<String>) -> Self {
        Self {
            job_class: job_class.into(),
            job_id: None,
            attempt: 0,
        }
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }
}

thread_local! {
    static CURRENT: RefCell<Option<JobContext>> = const { RefCell::new(None) };
}

/// Set by the integration middleware around one job's execution; never
/// call this directly in application code.
pub(crate) fn set_current(context: Option<JobContext>) {
    CURRENT.with(|cell| *cell.borrow_mut() = context);
}

/// Reads whatever job context the integration middleware made ambient on
/// this thread for the job currently executing, if any. `request`/`get`/
/// `post`/... consult this only when the caller didn't pass an explicit
/// `JobContext` in the request options — tests should always pass one
/// explicitly rather than rely on this.
pub fn current() -> Option<JobContext> {
    CURRENT.with(|cell| cell.borrow().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_is_none_until_set() {
        assert_eq!(current(), None);
    }

    #[test]
    fn set_current_makes_the_context_visible_on_this_thread() {
        let ctx = JobContext::new("SendWebhook").with_job_id("job-1").with_attempt(2);
        set_current(Some(ctx.clone()));
        assert_eq!(current(), Some(ctx));
        set_current(None);
        assert_eq!(current(), None);
    }
}
