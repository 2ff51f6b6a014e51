//! Command-line shells around the pyfmt engine
//!
//! Two binaries share this crate:
//!
//!   pyfmt [OPTIONS] [FILES]...     - format files (or stdin) to stdout
//!   pyfmti [OPTIONS] <FILES>...    - format files in place
//!
//! Files are formatted in parallel on a rayon pool, one engine run per file, and reported in
//! argument order. A file that fails to format produces a `path:line:column: message`
//! diagnostic on stderr and no output; in place, the original is left untouched because the
//! result is staged in a temporary file next to it and renamed over it only on success.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use config::ConfigError;
use pyfmt::{FormatError, FormatOptions, LexError};
use pyfmt_config::{Loader, PyfmtConfig, PROJECT_FILE};
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Which binary is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Formatted text goes to stdout.
    Stdout,
    /// Each file is replaced by its formatted text.
    InPlace,
}

impl Mode {
    fn program(self) -> &'static str {
        match self {
            Mode::Stdout => "pyfmt",
            Mode::InPlace => "pyfmti",
        }
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{path}:{source}")]
    Lexical { path: Input, source: LexError },
    #[error("{path}: {source}")]
    Io { path: Input, source: io::Error },
    #[error("{path}: cannot serialise tokens: {source}")]
    Json {
        path: Input,
        source: serde_json::Error,
    },
    #[error("cannot write to stdout: {0}")]
    Stdout(#[source] io::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("stdin cannot be formatted in place")]
    StdinInPlace,
}

impl CliError {
    fn format(path: &Input, error: FormatError) -> Self {
        match error {
            FormatError::Lexical(source) => CliError::Lexical {
                path: path.clone(),
                source,
            },
            FormatError::Io(source) => CliError::Io {
                path: path.clone(),
                source,
            },
        }
    }

    fn io(path: &Input, source: io::Error) -> Self {
        CliError::Io {
            path: path.clone(),
            source,
        }
    }
}

/// A file argument, or `-` for stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Input::Stdin
        } else {
            Input::File(PathBuf::from(arg))
        }
    }

    fn read(&self) -> Result<Vec<u8>, CliError> {
        match self {
            Input::Stdin => {
                let mut source = Vec::new();
                io::stdin()
                    .lock()
                    .read_to_end(&mut source)
                    .map_err(|error| CliError::io(self, error))?;
                Ok(source)
            }
            Input::File(path) => fs::read(path).map_err(|error| CliError::io(self, error)),
        }
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Stdin => f.write_str("<stdin>"),
            Input::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Everything a worker needs to handle one input.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub mode: Mode,
    pub options: FormatOptions,
    pub check: bool,
    pub dump_tokens: bool,
}

/// What happened to one input.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Output to print, in argument order.
    Output(Vec<u8>),
    /// Check mode: formatting would change the file.
    WouldChange,
    Unchanged,
    Rewritten,
}

pub fn command(mode: Mode) -> Command {
    let files = Arg::new("files")
        .value_name("FILES")
        .num_args(0..)
        .action(ArgAction::Append);
    let (about, files) = match mode {
        Mode::Stdout => (
            "Format Python source and write the result to stdout",
            files.help("Files to format; `-` or none reads stdin"),
        ),
        Mode::InPlace => (
            "Format Python files in place",
            files.help("Files to rewrite").required(true).num_args(1..),
        ),
    };

    Command::new(mode.program())
        .version(env!("CARGO_PKG_VERSION"))
        .about(about)
        .arg(files)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Extra TOML configuration layered over ./pyfmt.toml"),
        )
        .arg(
            Arg::new("jobs")
                .long("jobs")
                .short('j')
                .value_name("N")
                .value_parser(value_parser!(u64))
                .help("Files formatted in parallel (0: one per core)"),
        )
        .arg(
            Arg::new("indent-width")
                .long("indent-width")
                .value_name("N")
                .value_parser(value_parser!(u64).range(1..))
                .help("Spaces per indentation level"),
        )
        .arg(
            Arg::new("max-blank-lines")
                .long("max-blank-lines")
                .value_name("N")
                .value_parser(value_parser!(u64))
                .help("Longest run of blank lines to keep"),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .action(ArgAction::SetTrue)
                .help("Report files that would change and write nothing"),
        )
        .arg(
            Arg::new("dump-tokens")
                .long("dump-tokens")
                .action(ArgAction::SetTrue)
                .help("Print the token stream as JSON lines instead of formatting"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("More logging on stderr; repeat for more detail"),
        )
}

/// Entry point shared by both binaries.
pub fn run(mode: Mode) -> ExitCode {
    let matches = command(mode).get_matches();
    init_logging(matches.get_count("verbose"));

    match execute(mode, &matches) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("{}: {error}", mode.program());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Layer the project file, `--config` and flags over the built-in defaults.
pub fn load_config(matches: &ArgMatches) -> Result<PyfmtConfig, ConfigError> {
    let mut loader = Loader::new().with_optional_file(PROJECT_FILE);
    if let Some(path) = matches.get_one::<PathBuf>("config") {
        loader = loader.with_file(path);
    }
    if let Some(&width) = matches.get_one::<u64>("indent-width") {
        loader = loader.set_override("formatting.indent_width", width)?;
    }
    if let Some(&blank_lines) = matches.get_one::<u64>("max-blank-lines") {
        loader = loader.set_override("formatting.max_blank_lines", blank_lines)?;
    }
    if let Some(&jobs) = matches.get_one::<u64>("jobs") {
        loader = loader.set_override("cli.jobs", jobs)?;
    }
    if matches.get_flag("check") {
        loader = loader.set_override("cli.check", true)?;
    }
    loader.build()
}

/// Format every input and report the results. `Ok(false)` means at least one input failed
/// or, in check mode, would change.
pub fn execute(mode: Mode, matches: &ArgMatches) -> Result<bool, CliError> {
    let config = load_config(matches)?;
    let settings = Settings {
        mode,
        options: config.to_format_options(),
        check: config.cli.check,
        dump_tokens: matches.get_flag("dump-tokens"),
    };

    let mut inputs: Vec<Input> = matches
        .get_many::<String>("files")
        .map(|files| files.map(|file| Input::from_arg(file)).collect())
        .unwrap_or_default();
    if inputs.is_empty() {
        inputs.push(Input::Stdin);
    }
    let writes_files = mode == Mode::InPlace && !settings.check && !settings.dump_tokens;
    if writes_files && inputs.contains(&Input::Stdin) {
        return Err(CliError::StdinInPlace);
    }

    tracing::debug!(files = inputs.len(), jobs = config.cli.jobs, ?settings, "starting");
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.cli.jobs)
        .build()?;
    let results: Vec<_> = pool.install(|| {
        inputs
            .par_iter()
            .map(|input| process(input, &settings))
            .collect()
    });

    report(&inputs, results)
}

/// Print results in argument order.
fn report(inputs: &[Input], results: Vec<Result<Outcome, CliError>>) -> Result<bool, CliError> {
    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    let mut clean = true;

    for (input, result) in inputs.iter().zip(results) {
        match result {
            Ok(Outcome::Output(bytes)) => {
                stdout.write_all(&bytes).map_err(CliError::Stdout)?;
            }
            Ok(Outcome::WouldChange) => {
                eprintln!("would reformat {input}");
                clean = false;
            }
            Ok(Outcome::Unchanged) => tracing::info!(%input, "unchanged"),
            Ok(Outcome::Rewritten) => tracing::info!(%input, "reformatted"),
            Err(error) => {
                eprintln!("{error}");
                clean = false;
            }
        }
    }
    stdout.flush().map_err(CliError::Stdout)?;
    Ok(clean)
}

/// Handle one input on a worker thread.
pub fn process(input: &Input, settings: &Settings) -> Result<Outcome, CliError> {
    let source = input.read()?;
    tracing::debug!(%input, bytes = source.len(), "read");

    if settings.dump_tokens {
        return dump_tokens(input, &source).map(Outcome::Output);
    }
    if settings.check {
        let formatted = format_to_vec(input, &source, &settings.options)?;
        return Ok(if formatted == source {
            Outcome::Unchanged
        } else {
            Outcome::WouldChange
        });
    }

    match (settings.mode, input) {
        (Mode::InPlace, Input::File(path)) => {
            let formatted = format_to_vec(input, &source, &settings.options)?;
            if formatted == source {
                return Ok(Outcome::Unchanged);
            }
            rewrite(input, path, &formatted)?;
            Ok(Outcome::Rewritten)
        }
        (Mode::InPlace, Input::Stdin) => Err(CliError::StdinInPlace),
        (Mode::Stdout, _) => format_to_vec(input, &source, &settings.options).map(Outcome::Output),
    }
}

fn format_to_vec(
    input: &Input,
    source: &[u8],
    options: &FormatOptions,
) -> Result<Vec<u8>, CliError> {
    let buffer = Vec::with_capacity(source.len() + source.len() / 8);
    pyfmt::format(source, buffer, options).map_err(|error| CliError::format(input, error))
}

/// Stage `formatted` beside `path` and rename it over the original.
fn rewrite(input: &Input, path: &Path, formatted: &[u8]) -> Result<(), CliError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let io_error = |error| CliError::io(input, error);

    let mut staged = NamedTempFile::new_in(dir).map_err(io_error)?;
    staged.write_all(formatted).map_err(io_error)?;
    staged.flush().map_err(io_error)?;

    let metadata = fs::metadata(path).map_err(io_error)?;
    fs::set_permissions(staged.path(), metadata.permissions()).map_err(io_error)?;
    copy_ownership(&metadata, staged.path());
    staged.persist(path).map_err(|error| io_error(error.error))?;
    Ok(())
}

/// Give the staged file the original's owner and group where the process is allowed to.
#[cfg(unix)]
fn copy_ownership(original: &fs::Metadata, staged: &Path) {
    use std::os::unix::fs::MetadataExt;

    let owner = std::os::unix::fs::chown(staged, Some(original.uid()), Some(original.gid()));
    if let Err(error) = owner {
        tracing::debug!(%error, path = %staged.display(), "ownership not copied");
    }
}

#[cfg(not(unix))]
fn copy_ownership(_original: &fs::Metadata, _staged: &Path) {}

/// One JSON object per token, one per line.
fn dump_tokens(input: &Input, source: &[u8]) -> Result<Vec<u8>, CliError> {
    let lexical = |source| CliError::Lexical {
        path: input.clone(),
        source,
    };
    let text = pyfmt::decode(source).map_err(lexical)?;
    let tokens = pyfmt::tokenize(text).map_err(lexical)?;

    let mut out = Vec::new();
    for token in &tokens {
        serde_json::to_writer(&mut out, token).map_err(|source| CliError::Json {
            path: input.clone(),
            source,
        })?;
        out.push(b'\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(mode: Mode, args: &[&str]) -> ArgMatches {
        command(mode)
            .try_get_matches_from(std::iter::once(mode.program()).chain(args.iter().copied()))
            .expect("arguments to parse")
    }

    fn settings(mode: Mode) -> Settings {
        Settings {
            mode,
            options: FormatOptions::default(),
            check: false,
            dump_tokens: false,
        }
    }

    fn python_file(dir: &Path, name: &str, source: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).expect("create file");
        file.write_all(source.as_bytes()).expect("write file");
        path
    }

    #[test]
    fn flags_override_config() {
        let config = load_config(&matches(
            Mode::Stdout,
            &["--indent-width", "2", "--max-blank-lines", "0", "-j", "3", "--check"],
        ))
        .expect("config to load");
        assert_eq!(config.formatting.indent_width, 2);
        assert_eq!(config.formatting.max_blank_lines, 0);
        assert_eq!(config.cli.jobs, 3);
        assert!(config.cli.check);
    }

    #[test]
    fn zero_indent_width_is_rejected_by_the_parser() {
        assert!(command(Mode::Stdout)
            .try_get_matches_from(["pyfmt", "--indent-width", "0"])
            .is_err());
    }

    #[test]
    fn in_place_requires_files() {
        assert!(command(Mode::InPlace)
            .try_get_matches_from(["pyfmti"])
            .is_err());
    }

    #[test]
    fn input_display() {
        assert_eq!(Input::from_arg("-").to_string(), "<stdin>");
        assert_eq!(Input::from_arg("a/b.py").to_string(), "a/b.py");
    }

    #[test]
    fn stdout_errors_name_stdout() {
        let error = CliError::Stdout(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        assert_eq!(error.to_string(), "cannot write to stdout: closed");
    }

    #[test]
    fn formats_file_to_output() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = python_file(dir.path(), "a.py", "x=1\n");
        let outcome = process(&Input::File(path), &settings(Mode::Stdout)).expect("formats");
        assert_eq!(outcome, Outcome::Output(b"x = 1\n".to_vec()));
    }

    #[test]
    fn lexical_errors_carry_the_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = python_file(dir.path(), "bad.py", "x = (1,\n");
        let error = process(&Input::File(path.clone()), &settings(Mode::Stdout)).unwrap_err();
        assert_eq!(
            error.to_string(),
            format!("{}:1:5: '(' was never closed", path.display())
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let error = process(
            &Input::File(PathBuf::from("does/not/exist.py")),
            &settings(Mode::Stdout),
        )
        .unwrap_err();
        assert!(matches!(error, CliError::Io { .. }));
    }

    #[test]
    fn rewrites_in_place() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = python_file(dir.path(), "a.py", "if x :\n\ty( 1 )\n");
        let outcome = process(&Input::File(path.clone()), &settings(Mode::InPlace)).expect("formats");
        assert_eq!(outcome, Outcome::Rewritten);
        assert_eq!(fs::read_to_string(&path).unwrap(), "if x:\n    y(1)\n");
    }

    #[cfg(unix)]
    #[test]
    fn clean_file_is_not_rewritten() {
        use std::os::unix::fs::MetadataExt;

        let dir = tempfile::tempdir().expect("temp dir");
        let path = python_file(dir.path(), "a.py", "x = 1\n");
        let inode_before = fs::metadata(&path).unwrap().ino();
        let outcome = process(&Input::File(path.clone()), &settings(Mode::InPlace)).expect("formats");
        assert_eq!(outcome, Outcome::Unchanged);
        assert_eq!(fs::metadata(&path).unwrap().ino(), inode_before);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_rewrite_leaves_original_and_no_staging_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let source = "x = 1\ny = '''open\n";
        let path = python_file(dir.path(), "a.py", source);
        assert!(process(&Input::File(path.clone()), &settings(Mode::InPlace)).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), source);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn check_mode_reports_changes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let messy = python_file(dir.path(), "messy.py", "x=1\n");
        let clean = python_file(dir.path(), "clean.py", "x = 1\n");
        let settings = Settings {
            check: true,
            ..settings(Mode::InPlace)
        };
        assert_eq!(
            process(&Input::File(messy.clone()), &settings).unwrap(),
            Outcome::WouldChange
        );
        assert_eq!(
            process(&Input::File(clean), &settings).unwrap(),
            Outcome::Unchanged
        );
        assert_eq!(fs::read_to_string(&messy).unwrap(), "x=1\n");
    }

    #[test]
    fn dumps_tokens_as_json_lines() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = python_file(dir.path(), "a.py", "x\n");
        let settings = Settings {
            dump_tokens: true,
            ..settings(Mode::Stdout)
        };
        let Outcome::Output(bytes) = process(&Input::File(path), &settings).unwrap() else {
            panic!("expected output");
        };
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["text"], "x");
        assert_eq!(first["position"]["line"], 1);
    }
}
