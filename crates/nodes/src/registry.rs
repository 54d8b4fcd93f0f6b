//! In-process function registry for `FunctionExec` targets.
//!
//! `FunctionExec` names a callable by a string identifier (`target`). Since
//! the engine is statically typed there's no dynamic import machinery to
//! resolve it with, so the embedding application registers implementations
//! up front with [`register`], keyed by the same identifier the workflow
//! author used. The registered function is only ever called from the
//! isolated child process spawned for that node (see [`crate::process`]),
//! via [`run_invocation_entrypoint`] — never from the parent process.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, OnceLock};

use serde_json::Value;

/// Signature every registered function must have. Errors are returned as a
/// human-readable message; the spec requires it land on the child's stderr.
pub type RegisteredFn = fn(&[Value], &BTreeMap<String, Value>) -> Result<(), String>;

fn registry() -> &'static Mutex<HashMap<String, RegisteredFn>> {
    static REGISTRY: OnceLock<Mutex<HashMap<String, RegisteredFn>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Register `f` under `target`. Call this during application start-up,
/// before any workflow referencing `target` is executed.
pub fn register(target: &str, f: RegisteredFn) {
    registry().lock().unwrap().insert(target.to_string(), f);
}

/// Look up a previously [`register`]ed function by name.
pub fn lookup(target: &str) -> Option<RegisteredFn> {
    registry().lock().unwrap().get(target).copied()
}

/// Entry point for the re-exec'd child process of a `FunctionExec`.
///
/// Resolves `target` in the registry, invokes it, and terminates the
/// process: `0` on success, `1` with the error printed to stderr otherwise.
/// This never returns — it is meant to be the last thing `main` does for
/// the hidden invocation subcommand.
pub fn run_invocation_entrypoint(
    target: &str,
    args: &[Value],
    kwargs: &BTreeMap<String, Value>,
) -> ! {
    let outcome = match lookup(target) {
        Some(f) => f(args, kwargs),
        None => Err(format!("no function registered for target '{target}'")),
    };

    match outcome {
        Ok(()) => std::process::exit(0),
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok_fn(_args: &[Value], _kwargs: &BTreeMap<String, Value>) -> Result<(), String> {
        Ok(())
    }

    fn failing_fn(_args: &[Value], _kwargs: &BTreeMap<String, Value>) -> Result<(), String> {
        Err("boom".into())
    }

    #[test]
    fn register_then_lookup_round_trips() {
        register("nodes::tests::ok_fn", ok_fn);
        let f = lookup("nodes::tests::ok_fn").expect("should be registered");
        assert!(f(&[json!(1)], &BTreeMap::new()).is_ok());
    }

    #[test]
    fn lookup_of_unknown_target_is_none() {
        assert!(lookup("no.such.function.ever_registered").is_none());
    }

    #[test]
    fn failing_fn_reports_error_message() {
        register("nodes::tests::failing_fn", failing_fn);
        let f = lookup("nodes::tests::failing_fn").unwrap();
        assert_eq!(f(&[], &BTreeMap::new()), Err("boom".to_string()));
    }
}
