use std::{
    env,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt::MakeWriter, prelude::*, registry, EnvFilter};

// --- Custom "Tee" Writer ---
struct Tee<A, B> {
    a: A,
    b: B,
}

impl<A, B> Write for Tee<A, B>
where
    A: Write,
    B: Write,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let res_a = self.a.write(buf);
        let res_b = self.b.write(buf);
        res_a.or(res_b)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.a.flush()?;
        self.b.flush()
    }
}

#[derive(Clone)]
struct MakeTee<A, B> {
    make_a: A,
    make_b: B,
}

impl<'a, A, B, W1, W2> MakeWriter<'a> for MakeTee<A, B>
where
    A: MakeWriter<'a, Writer = W1>,
    B: MakeWriter<'a, Writer = W2>,
    W1: Write + 'a,
    W2: Write + 'a,
{
    type Writer = Tee<W1, W2>;
    fn make_writer(&'a self) -> Self::Writer {
        Tee {
            a: self.make_a.make_writer(),
            b: self.make_b.make_writer(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Console,
    File,
    Both,
    Off,
}

impl LogOutput {
    fn parse(value: &str) -> Self {
        match value {
            "file" => LogOutput::File,
            "both" => LogOutput::Both,
            "off" | "none" => LogOutput::Off,
            _ => LogOutput::Console,
        }
    }
}

/// Logging settings, normally read from `LOG_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub output: LogOutput,
    pub json: bool,
    pub file_path: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: LogOutput::Console,
            json: false,
            file_path: PathBuf::from("/tmp/nodebuild.log"),
        }
    }
}

impl LogSettings {
    /// `verbose` forces `debug` unless `LOG_LEVEL` asks for something explicit.
    pub fn from_env(verbose: bool) -> Self {
        let defaults = Self::default();
        let level = env::var("LOG_LEVEL").unwrap_or_else(|_| {
            if verbose {
                "debug".to_string()
            } else {
                defaults.level.clone()
            }
        });
        Self {
            level,
            output: env::var("LOG_OUTPUT")
                .map(|v| LogOutput::parse(&v))
                .unwrap_or(defaults.output),
            json: env::var("LOG_FORMAT").is_ok_and(|v| v == "json"),
            file_path: env::var("LOG_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.file_path),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));
        match "reqwest=warn".parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        }
    }
}

/// Initializes the global tracing subscriber.
///
/// Console output goes to stderr so stdout stays free for command results.
/// Hold the returned guard until exit or buffered file lines are lost.
pub fn init_subscriber(settings: &LogSettings) -> Option<WorkerGuard> {
    let subscriber = registry().with(settings.env_filter());
    let is_json = settings.json;

    let log_path = settings.file_path.as_path();
    let log_dir = log_path.parent().unwrap_or_else(|| Path::new("/tmp"));
    let log_filename = log_path.file_name().unwrap_or("nodebuild.log".as_ref());

    let mut guard: Option<WorkerGuard> = None;

    match settings.output {
        LogOutput::Both => {
            let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
            let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
            guard = Some(_guard);

            let tee_writer = MakeTee {
                make_a: std::io::stderr,
                make_b: non_blocking,
            };

            let fmt_layer = tracing_subscriber::fmt::layer().with_writer(tee_writer);
            if is_json {
                let _ = subscriber.with(fmt_layer.json()).try_init();
            } else {
                let _ = subscriber.with(fmt_layer.with_ansi(false)).try_init();
            }
        }
        LogOutput::Console => {
            let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if is_json {
                let _ = subscriber.with(fmt_layer.json()).try_init();
            } else {
                let _ = subscriber.with(fmt_layer.compact()).try_init();
            }
        }
        LogOutput::File => {
            let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
            let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
            guard = Some(_guard);

            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            if is_json {
                let _ = subscriber.with(fmt_layer.json()).try_init();
            } else {
                let _ = subscriber.with(fmt_layer).try_init();
            }
        }
        LogOutput::Off => {}
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_log_env() {
        for key in ["LOG_LEVEL", "LOG_OUTPUT", "LOG_FORMAT", "LOG_FILE_PATH"] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_verbose_selects_debug() {
        clear_log_env();
        let settings = LogSettings::from_env(true);
        assert_eq!(settings.level, "debug");
        assert_eq!(settings.output, LogOutput::Console);
        assert!(!settings.json);
    }

    #[test]
    #[serial]
    fn test_env_overrides_verbose_level() {
        clear_log_env();
        env::set_var("LOG_LEVEL", "warn");
        env::set_var("LOG_OUTPUT", "both");
        env::set_var("LOG_FORMAT", "json");
        env::set_var("LOG_FILE_PATH", "/var/log/nodebuild/build.log");

        let settings = LogSettings::from_env(true);
        assert_eq!(settings.level, "warn");
        assert_eq!(settings.output, LogOutput::Both);
        assert!(settings.json);
        assert_eq!(settings.file_path, PathBuf::from("/var/log/nodebuild/build.log"));
        clear_log_env();
    }

    #[test]
    fn test_unknown_output_falls_back_to_console() {
        assert_eq!(LogOutput::parse("syslog"), LogOutput::Console);
        assert_eq!(LogOutput::parse("none"), LogOutput::Off);
    }
}
