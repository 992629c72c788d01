//! Host hooks installed into every sandboxed context.
//!
//! Boa reports promise rejections that have no handler attached through
//! `HostHooks::promise_rejection_tracker`, and reports again when a handler
//! shows up later. Promises still unhandled once the run has settled are
//! uncaught async errors.

use std::cell::RefCell;

use boa_engine::builtins::promise::{OperationType, PromiseState};
use boa_engine::context::HostHooks;
use boa_engine::object::builtins::JsPromise;
use boa_engine::{Context, JsObject, JsValue};

thread_local! {
    static UNHANDLED: RefCell<Vec<JsObject>> = const { RefCell::new(Vec::new()) };
}

/// Host hooks of a sandboxed context.
pub(crate) struct SandboxHooks;

pub(crate) static SANDBOX_HOOKS: SandboxHooks = SandboxHooks;

impl HostHooks for SandboxHooks {
    fn promise_rejection_tracker(
        &self,
        promise: &JsObject,
        operation: OperationType,
        _context: &mut Context,
    ) {
        UNHANDLED.with(|cell| {
            let mut unhandled = cell.borrow_mut();
            match operation {
                OperationType::Reject => unhandled.push(promise.clone()),
                OperationType::Handle => {
                    unhandled.retain(|tracked| !JsObject::equals(tracked, promise))
                }
            }
        });
    }
}

/// Forget rejections left over from an earlier context on this thread.
pub(crate) fn reset() {
    UNHANDLED.with(|cell| cell.borrow_mut().clear());
}

/// Rejection reasons of promises that never got a handler, in rejection
/// order. Clears the tracked list.
pub(crate) fn take_unhandled(context: &mut Context) -> Vec<String> {
    let promises = UNHANDLED.with(|cell| std::mem::take(&mut *cell.borrow_mut()));
    promises
        .into_iter()
        .filter_map(|promise| match JsPromise::from_object(promise).ok()?.state() {
            PromiseState::Rejected(reason) => Some(describe(&reason, context)),
            PromiseState::Pending | PromiseState::Fulfilled(_) => None,
        })
        .collect()
}

fn describe(reason: &JsValue, context: &mut Context) -> String {
    match reason.to_string(context) {
        Ok(text) => text.to_std_string_escaped(),
        Err(_) => reason.display().to_string(),
    }
}
