//! Typed playbook model
//!
//! A playbook is an ordered list of plays. Each play targets a host group,
//! optionally escalates privileges, and runs an ordered list of tasks.
//!
//! A task is a mapping with:
//! - `name`: human-readable description (required)
//! - exactly one action module key (`apt`, `service`, `debug`, ...) whose
//!   value is the module arguments
//! - any number of task keywords from [`TASK_KEYWORDS`] (`when`, `notify`, ...)
//!
//! Anything else is rejected as a schema violation rather than carried
//! through untyped.

use crate::error::{PlaybookError, TaskSchemaError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};
use std::fmt;

/// Task-level keywords that are not action modules
///
/// Any `with_<lookup>` key is a keyword too, see [`is_task_keyword`].
pub const TASK_KEYWORDS: [&str; 41] = [
    "always",
    "any_errors_fatal",
    "args",
    "async",
    "become",
    "become_exe",
    "become_flags",
    "become_method",
    "become_user",
    "changed_when",
    "check_mode",
    "collections",
    "connection",
    "debugger",
    "delay",
    "delegate_facts",
    "delegate_to",
    "diff",
    "environment",
    "failed_when",
    "ignore_errors",
    "ignore_unreachable",
    "listen",
    "loop",
    "loop_control",
    "module_defaults",
    "no_log",
    "notify",
    "poll",
    "port",
    "register",
    "remote_user",
    "rescue",
    "retries",
    "run_once",
    "tags",
    "throttle",
    "timeout",
    "until",
    "vars",
    "when",
];

const LOOP_KEYWORD_PREFIX: &str = "with_";

/// Whether `key` is a task keyword rather than an action module
#[must_use]
pub fn is_task_keyword(key: &str) -> bool {
    TASK_KEYWORDS.contains(&key) || key.starts_with(LOOP_KEYWORD_PREFIX)
}

/// Typed playbook document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Playbook {
    plays: Vec<Play>,
}

impl Playbook {
    /// Create from plays
    #[inline]
    #[must_use]
    pub fn new(plays: Vec<Play>) -> Self {
        Self { plays }
    }

    /// Parse and validate YAML text
    ///
    /// # Errors
    /// - `PlaybookError::Syntax` if the text is not well-formed YAML
    /// - `PlaybookError::Schema` if it does not fit the playbook schema
    pub fn from_yaml(text: &str) -> Result<Self, PlaybookError> {
        let value: Value = serde_yaml::from_str(text).map_err(PlaybookError::Syntax)?;
        Self::from_value(value)
    }

    /// Validate an already-parsed YAML value
    ///
    /// # Errors
    /// `PlaybookError::Schema` if the value does not fit the playbook schema
    pub fn from_value(value: Value) -> Result<Self, PlaybookError> {
        if value.is_null() {
            return Err(PlaybookError::schema("empty document"));
        }
        let playbook: Playbook =
            serde_yaml::from_value(value).map_err(|e| PlaybookError::schema(e.to_string()))?;
        playbook.check_shape()?;
        Ok(playbook)
    }

    /// Serialize with a leading document marker
    ///
    /// # Errors
    /// `PlaybookError::Serialize` if serialization fails
    pub fn to_yaml(&self) -> Result<String, PlaybookError> {
        let body = serde_yaml::to_string(self).map_err(PlaybookError::Serialize)?;
        Ok(format!("---\n{body}"))
    }

    /// Plays in order
    #[inline]
    #[must_use]
    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    /// All tasks of all plays, in order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.plays.iter().flat_map(|play| play.tasks.iter())
    }

    /// Whether any play escalates privileges
    #[must_use]
    pub fn requires_privilege(&self) -> bool {
        self.plays.iter().any(|play| play.privileged)
    }

    fn check_shape(&self) -> Result<(), PlaybookError> {
        if self.plays.is_empty() {
            return Err(PlaybookError::schema("playbook has no plays"));
        }
        for (idx, play) in self.plays.iter().enumerate() {
            if play.hosts.is_empty() {
                return Err(PlaybookError::schema(format!("play {idx} has no hosts")));
            }
            if play.tasks.is_empty() {
                return Err(PlaybookError::schema(format!("play {idx} has no tasks")));
            }
        }
        Ok(())
    }
}

/// One play: a host group and the tasks to run on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Play {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Host group pattern
    pub hosts: Hosts,

    /// Privilege escalation
    #[serde(rename = "become", default, deserialize_with = "lenient_bool")]
    pub privileged: bool,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_opt_bool"
    )]
    pub gather_facts: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vars: Option<Mapping>,

    #[serde(default)]
    pub tasks: Vec<Task>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub handlers: Vec<Task>,
}

impl Play {
    /// Create play targeting `hosts`
    #[must_use]
    pub fn new(hosts: impl Into<Hosts>) -> Self {
        Self {
            name: None,
            hosts: hosts.into(),
            privileged: false,
            gather_facts: None,
            vars: None,
            tasks: Vec::new(),
            handlers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    #[must_use]
    pub fn gather_facts(mut self, gather: bool) -> Self {
        self.gather_facts = Some(gather);
        self
    }

    #[must_use]
    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }
}

/// Play target: one pattern (`web:&staging`) or a list of groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Hosts {
    Pattern(String),
    Groups(Vec<String>),
}

impl Hosts {
    /// Whether no host is named
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Hosts::Pattern(pattern) => pattern.trim().is_empty(),
            Hosts::Groups(groups) => groups.iter().all(|group| group.trim().is_empty()),
        }
    }

    /// Single pattern form, groups joined with `:`
    #[must_use]
    pub fn pattern(&self) -> String {
        match self {
            Hosts::Pattern(pattern) => pattern.clone(),
            Hosts::Groups(groups) => groups.join(":"),
        }
    }
}

impl From<&str> for Hosts {
    fn from(pattern: &str) -> Self {
        Hosts::Pattern(pattern.to_string())
    }
}

impl From<String> for Hosts {
    fn from(pattern: String) -> Self {
        Hosts::Pattern(pattern)
    }
}

impl From<Vec<String>> for Hosts {
    fn from(groups: Vec<String>) -> Self {
        Hosts::Groups(groups)
    }
}

impl PartialEq<&str> for Hosts {
    fn eq(&self, other: &&str) -> bool {
        matches!(self, Hosts::Pattern(pattern) if pattern == other)
    }
}

impl fmt::Display for Hosts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern())
    }
}

/// Action module invocation
#[derive(Debug, Clone, PartialEq)]
pub struct TaskAction {
    /// Module name, e.g. `apt` or `ansible.builtin.service`
    pub module: String,
    /// Module arguments as written
    pub args: Value,
}

/// One task: a name, one action, optional keywords
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Mapping", into = "Mapping")]
pub struct Task {
    pub name: String,
    pub action: TaskAction,
    pub keywords: Mapping,
}

impl Task {
    /// Create task running `module` with `args`
    #[must_use]
    pub fn new(name: impl Into<String>, module: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            action: TaskAction {
                module: module.into(),
                args,
            },
            keywords: Mapping::new(),
        }
    }

    /// `debug` task printing `msg`
    #[must_use]
    pub fn debug(name: impl Into<String>, msg: impl Into<String>) -> Self {
        let mut args = Mapping::new();
        args.insert(Value::from("msg"), Value::from(msg.into()));
        Self::new(name, "debug", Value::Mapping(args))
    }

    /// Attach a task keyword
    #[must_use]
    pub fn with_keyword(mut self, key: &str, value: Value) -> Self {
        self.keywords.insert(Value::from(key), value);
        self
    }

    /// Module name
    #[inline]
    #[must_use]
    pub fn module(&self) -> &str {
        &self.action.module
    }
}

impl TryFrom<Mapping> for Task {
    type Error = TaskSchemaError;

    fn try_from(mut map: Mapping) -> Result<Self, Self::Error> {
        let name = match map.remove("name") {
            Some(Value::String(name)) => name,
            Some(_) => return Err(TaskSchemaError::InvalidName),
            None => return Err(TaskSchemaError::MissingName),
        };

        let mut keywords = Mapping::new();
        let mut actions = Vec::new();
        for (key, value) in map {
            let Value::String(key) = key else {
                return Err(TaskSchemaError::NonStringKey { task: name });
            };
            if is_task_keyword(&key) {
                keywords.insert(Value::String(key), value);
            } else {
                actions.push((key, value));
            }
        }

        if actions.len() > 1 {
            return Err(TaskSchemaError::MultipleActions {
                task: name,
                modules: actions.into_iter().map(|(module, _)| module).collect(),
            });
        }
        let Some((module, args)) = actions.pop() else {
            return Err(TaskSchemaError::NoAction { task: name });
        };

        Ok(Self {
            name,
            action: TaskAction { module, args },
            keywords,
        })
    }
}

impl From<Task> for Mapping {
    fn from(task: Task) -> Self {
        let mut map = Mapping::new();
        map.insert(Value::from("name"), Value::String(task.name));
        map.insert(Value::String(task.action.module), task.action.args);
        for (key, value) in task.keywords {
            map.insert(key, value);
        }
        map
    }
}

fn parse_flag<E: serde::de::Error>(value: Value) -> Result<bool, E> {
    match value {
        Value::Bool(flag) => Ok(flag),
        Value::String(text) => match text.to_ascii_lowercase().as_str() {
            "yes" | "true" | "on" => Ok(true),
            "no" | "false" | "off" => Ok(false),
            other => Err(E::custom(format!("expected a boolean, got '{other}'"))),
        },
        other => Err(E::custom(format!("expected a boolean, got {other:?}"))),
    }
}

// `yes`/`no` are strings in YAML 1.2 but booleans to playbook runners.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    parse_flag(Value::deserialize(deserializer)?)
}

fn lenient_opt_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    parse_flag(Value::deserialize(deserializer)?).map(Some)
}
