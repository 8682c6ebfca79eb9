// Standard library
use std::ffi::OsString;
use std::fmt;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

// External crates
use crate::error::{BuildError, Result};
use duct::cmd;
use tracing::{debug, info};
use which::which;

/// A fully described external command: program, arguments, environment and
/// working directory. Collaborators build these and hand them to a
/// [`CommandRunner`], which keeps process spawning out of their logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Wrap this command so it runs inside `prefix` (e.g. `scl enable ... --`).
    pub fn wrapped_in(self, prefix: &[String]) -> Self {
        let Some((program, rest)) = prefix.split_first() else {
            return self;
        };
        let mut args: Vec<String> = rest.to_vec();
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: program.clone(),
            args,
            env: self.env,
            cwd: self.cwd,
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Seam between collaborators and the process table.
pub trait CommandRunner: Send + Sync {
    /// Run to completion, streaming combined output through `tracing`.
    fn run(&self, spec: &CommandSpec) -> Result<()>;

    /// Run to completion and return stdout.
    fn capture(&self, spec: &CommandSpec) -> Result<String>;
}

/// Runs commands with `duct`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DuctRunner;

fn expression(spec: &CommandSpec) -> duct::Expression {
    let args: Vec<OsString> = spec.args.iter().map(OsString::from).collect();
    let mut expr = cmd(&spec.program, args);
    if let Some(dir) = &spec.cwd {
        expr = expr.dir(dir);
    }
    for (key, value) in &spec.env {
        expr = expr.env(key, value);
    }
    expr
}

impl CommandRunner for DuctRunner {
    fn run(&self, spec: &CommandSpec) -> Result<()> {
        debug!(command = %spec, "running command");
        let reader = expression(spec)
            .stderr_to_stdout()
            .reader()
            .map_err(|e| BuildError::Command(format!("failed to start '{}': {}", spec, e)))?;

        // duct surfaces a non-zero exit as an error on the final read
        for line in BufReader::new(reader).lines() {
            let line = line.map_err(|e| BuildError::Command(format!("{}: {}", spec, e)))?;
            info!(target: "nodebuild::cmd", "{}", line);
        }
        Ok(())
    }

    fn capture(&self, spec: &CommandSpec) -> Result<String> {
        debug!(command = %spec, "capturing command output");
        let output = expression(spec)
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .map_err(|e| BuildError::Command(format!("failed to start '{}': {}", spec, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BuildError::Command(format!(
                "'{}' exited with {:?}: {}",
                spec,
                output.status.code(),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Checks if a command-line tool is available in the system's PATH.
pub fn is_tool_installed(tool_name: &str) -> bool {
    which(tool_name).is_ok()
}
