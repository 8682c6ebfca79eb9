//! Scripted [`CommandRunner`] for collaborator tests.

use crate::command_stream::{CommandRunner, CommandSpec};
use crate::error::{BuildError, Result};
use std::sync::Mutex;

type Hook = Box<dyn Fn(&CommandSpec) -> Result<String> + Send + Sync>;

/// Records every command and answers from rules matched by program name.
///
/// Unmatched commands succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<(String, Hook)>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands whose program (or first argument after an `scl` prefix
    /// `--`) equals `program`.
    pub fn on<F>(mut self, program: &str, hook: F) -> Self
    where
        F: Fn(&CommandSpec) -> Result<String> + Send + Sync + 'static,
    {
        self.rules.push((program.to_string(), Box::new(hook)));
        self
    }

    /// Fail every command for `program`.
    pub fn failing(self, program: &str) -> Self {
        let name = program.to_string();
        self.on(program, move |spec| {
            Err(BuildError::Command(format!("{} failed: {}", name, spec)))
        })
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().iter().map(effective_program).collect()
    }

    fn dispatch(&self, spec: &CommandSpec) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(spec.clone());
        }
        let program = effective_program(spec);
        match self.rules.iter().rev().find(|(name, _)| *name == program) {
            Some((_, hook)) => hook(spec),
            None => Ok(String::new()),
        }
    }
}

fn effective_program(spec: &CommandSpec) -> String {
    if spec.program == "scl" {
        if let Some(pos) = spec.args.iter().position(|a| a == "--") {
            if let Some(inner) = spec.args.get(pos + 1) {
                return inner.clone();
            }
        }
    }
    spec.program.clone()
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, spec: &CommandSpec) -> Result<()> {
        self.dispatch(spec).map(|_| ())
    }

    fn capture(&self, spec: &CommandSpec) -> Result<String> {
        self.dispatch(spec)
    }
}
