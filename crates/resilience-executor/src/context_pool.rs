//! Reuses [`ResilienceContext`] allocations across calls.
//!
//! Every `Executor::execute` acquires one on entry and returns it on every
//! exit path, including panics unwound through the caller's `action`. The
//! return is expressed as `Drop` on [`PooledContext`] rather than a manual
//! step, so it can't be forgotten on an early return.

use resilience_core::{HttpMethod, ResilienceContext};
use std::ops::Deref;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
pub struct ContextPool {
    free: Mutex<Vec<ResilienceContext>>,
}

impl ContextPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(
        &self,
        operation_key: impl Into<String>,
        rate_limit_partition: impl Into<String>,
        resource: impl Into<String>,
        method: HttpMethod,
        cancellation: CancellationToken,
    ) -> PooledContext<'_> {
        let mut ctx = self.free.lock().unwrap().pop().unwrap_or_else(|| {
            ResilienceContext::new(String::new(), String::new(), String::new(), HttpMethod::Get, CancellationToken::new())
        });
        ctx.reset(operation_key, rate_limit_partition, resource, method, cancellation);
        PooledContext { pool: self, ctx: Some(ctx) }
    }

    fn release(&self, ctx: ResilienceContext) {
        self.free.lock().unwrap().push(ctx);
    }
}

/// A [`ResilienceContext`] borrowed from a [`ContextPool`]; returns itself
/// to the pool when dropped.
pub struct PooledContext<'a> {
    pool: &'a ContextPool,
    ctx: Option<ResilienceContext>,
}

impl Deref for PooledContext<'_> {
    type Target = ResilienceContext;

    fn deref(&self) -> &ResilienceContext {
        self.ctx.as_ref().expect("context taken before drop")
    }
}

impl Drop for PooledContext<'_> {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            self.pool.release(ctx);
        }
    }
}
