//! `Executable` — the description of a unit of work attached to a node.
//!
//! Two variants: a shell command, interpreted by `/bin/sh -c`, or a named
//! in-process function invoked in an isolated child process. Both carry an
//! optional per-node timeout.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What to run for a node that carries work.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Executable {
    /// A shell-interpreted command string. May contain pipes, redirections, etc.
    Command {
        cmd: String,
        #[serde(default, with = "duration_secs_opt")]
        timeout: Option<Duration>,
    },
    /// A named in-process function, resolved via [`crate::registry`] in an
    /// isolated child process — never invoked in the parent's address space.
    Function {
        target: String,
        #[serde(default)]
        args: Vec<Value>,
        #[serde(default)]
        kwargs: BTreeMap<String, Value>,
        #[serde(default, with = "duration_secs_opt")]
        timeout: Option<Duration>,
    },
}

impl Executable {
    /// The timeout configured on this executable, if any.
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            Executable::Command { timeout, .. } => *timeout,
            Executable::Function { timeout, .. } => *timeout,
        }
    }
}

/// Serialises `Option<Duration>` as fractional seconds, since `Duration`
/// itself has no canonical JSON form.
mod duration_secs_opt {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(v: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        v.map(|d| d.as_secs_f64()).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs: Option<f64> = Option::deserialize(d)?;
        Ok(secs.map(Duration::from_secs_f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn command_round_trips_through_json() {
        let exec = Executable::Command {
            cmd: "echo hi".into(),
            timeout: Some(Duration::from_millis(250)),
        };
        let v = serde_json::to_value(&exec).unwrap();
        assert_eq!(v["kind"], "command");
        assert_eq!(v["timeout"], 0.25);

        let back: Executable = serde_json::from_value(v).unwrap();
        assert_eq!(back.timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn function_defaults_args_and_kwargs() {
        let v = json!({"kind": "function", "target": "mypkg.myfunc"});
        let exec: Executable = serde_json::from_value(v).unwrap();
        match exec {
            Executable::Function { target, args, kwargs, timeout } => {
                assert_eq!(target, "mypkg.myfunc");
                assert!(args.is_empty());
                assert!(kwargs.is_empty());
                assert_eq!(timeout, None);
            }
            _ => panic!("expected Function"),
        }
    }
}
