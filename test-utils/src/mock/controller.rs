use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Identifier for global overrides that apply to all RPC calls
const GLOBAL_OVERRIDE_KEY: &str = "global";

/// Response types that can be forced for RPC calls.
#[derive(Debug, derive_more::Display, Clone)]
pub enum CallResponse {
    /// Return a JSON-RPC error with the given message.
    #[display("Error: {}", _0)]
    Error(String),
    /// Return a JSON-RPC error with the given code and message.
    #[display("Error {code}: {message}")]
    ErrorWithCode { code: i32, message: String },
    /// Sleep before executing the normal handler logic.
    #[display("Delay: {:?}", _0)]
    Delay(Duration),
}

#[derive(Debug, derive_more::Display, Clone)]
pub enum CallOverride {
    #[display("Override: once -> {}", _0)]
    Once(CallResponse),
    #[display("Override: {n} times -> {response}")]
    NTimes { response: CallResponse, n: usize },
    #[display("Override: always -> {}", _0)]
    Always(CallResponse),
}

impl CallOverride {
    fn response(&self) -> &CallResponse {
        match self {
            CallOverride::Once(response) => response,
            CallOverride::NTimes { response, .. } => response,
            CallOverride::Always(response) => response,
        }
    }

    /// Check if this override is used up after `call_count` uses.
    fn is_exhausted(&self, call_count: usize) -> bool {
        match self {
            CallOverride::Once(_) => call_count >= 1,
            CallOverride::NTimes { n, .. } => call_count >= *n,
            CallOverride::Always(_) => false,
        }
    }
}

#[derive(Debug)]
struct OverrideEntry {
    rpc_override: CallOverride,
    call_count: usize,
}

/// Inner state of the mock controller
#[derive(Debug, Default)]
struct MockControllerInner {
    /// All overrides organized by key, with "global" having priority over RPC-specific keys.
    overrides: HashMap<String, Vec<OverrideEntry>>,
    /// Number of times each RPC method was invoked.
    calls: HashMap<String, usize>,
}

impl MockControllerInner {
    /// Uses the first override queued under `key`, dropping it once exhausted.
    fn take_from_queue(&mut self, key: &str) -> Option<CallResponse> {
        let queue = self.overrides.get_mut(key)?;
        let entry = queue.first_mut()?;
        entry.call_count += 1;
        let response = entry.rpc_override.response().clone();
        if entry.rpc_override.is_exhausted(entry.call_count) {
            queue.remove(0);
        }
        Some(response)
    }
}

/// Controller for forcing responses of the mock node
#[derive(Debug, Default, Clone)]
pub struct MockController {
    inner: Arc<Mutex<MockControllerInner>>,
}

impl MockController {
    /// Create a new mock controller
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a global override response that will be used for any RPC call
    pub fn global_override(&self, rpc_override: CallOverride) {
        log::debug!("Adding global override: {rpc_override}");
        self.push(GLOBAL_OVERRIDE_KEY, rpc_override);
    }

    /// Add a response override for a specific RPC call, e.g. `eth_getLogs`
    pub fn override_rpc(&self, rpc_name: &str, rpc_override: CallOverride) {
        log::debug!("Adding RPC override for '{rpc_name}': {rpc_override}");
        self.push(rpc_name, rpc_override);
    }

    fn push(&self, key: &str, rpc_override: CallOverride) {
        let mut lock = self.inner.lock().unwrap();
        lock.overrides
            .entry(key.to_string())
            .or_default()
            .push(OverrideEntry {
                rpc_override,
                call_count: 0,
            });
    }

    /// Records a call and returns the override to apply to it, if any.
    /// Global overrides have priority over RPC-specific ones.
    pub fn take_next_override(&self, rpc_name: &str) -> Option<CallResponse> {
        let mut controller = self.inner.lock().unwrap();
        *controller.calls.entry(rpc_name.to_string()).or_default() += 1;

        let response = controller
            .take_from_queue(GLOBAL_OVERRIDE_KEY)
            .or_else(|| controller.take_from_queue(rpc_name));
        if let Some(response) = &response {
            log::debug!("{rpc_name}: applying {response}");
        }
        response
    }

    /// How many times `rpc_name` has been called so far.
    pub fn call_count(&self, rpc_name: &str) -> usize {
        let controller = self.inner.lock().unwrap();
        controller.calls.get(rpc_name).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_once_override_is_used_once() {
        let controller = MockController::new();
        controller.override_rpc(
            "eth_call",
            CallOverride::Once(CallResponse::Error("boom".into())),
        );

        assert!(matches!(
            controller.take_next_override("eth_call"),
            Some(CallResponse::Error(_))
        ));
        assert!(controller.take_next_override("eth_call").is_none());
        assert_eq!(controller.call_count("eth_call"), 2);
    }

    #[test]
    fn test_global_override_has_priority() {
        let controller = MockController::new();
        controller.override_rpc(
            "eth_call",
            CallOverride::Always(CallResponse::Error("specific".into())),
        );
        controller.global_override(CallOverride::NTimes {
            response: CallResponse::Error("global".into()),
            n: 2,
        });

        for expected in ["global", "global", "specific", "specific"] {
            match controller.take_next_override("eth_call") {
                Some(CallResponse::Error(message)) => assert_eq!(message, expected),
                other => panic!("unexpected override {other:?}"),
            }
        }
    }
}
