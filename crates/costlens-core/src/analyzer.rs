//! # Analyzer Invocation
//!
//! Runs the external cost analyzer and returns its raw JSON report.
//!
//! | Target | Command line |
//! |--------|--------------|
//! | File | `infer --cost -o <out> -- javac <path>` |
//! | Project | `infer --cost -o <out> -- <build command>` |
//!
//! The report is read from `<out>/costs-report.json`, then `<out>` is removed
//! whether or not the run succeeded. Decoding is left to the caller so the
//! analyzer stays a thin process wrapper.
//!
//! Runs are blocking and can take minutes; the host calls [`Analyzer::run`]
//! from a blocking task.

use crate::{error::CostlensError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// Name of the report file inside an output directory.
pub const REPORT_FILE: &str = "costs-report.json";

/// What the analyzer should compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisTarget {
    /// A single Java source file.
    File(PathBuf),
    /// A project build, already split into program and arguments.
    Project(Vec<String>),
}

/// One analyzer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisJob {
    /// What to compile.
    pub target: AnalysisTarget,

    /// Per-run output directory; removed after the run.
    pub output_dir: PathBuf,

    /// Working directory of the analyzer process.
    pub working_dir: PathBuf,
}

/// Source of cost reports.
pub trait Analyzer: Send + Sync {
    /// Runs the analyzer and returns the raw report bytes.
    ///
    /// # Errors
    ///
    /// Returns `CostlensError::AnalysisFailed` if the process cannot be
    /// started, exits unsuccessfully, or leaves no readable report.
    fn run(&self, job: &AnalysisJob) -> Result<Vec<u8>>;
}

/// Runs the Infer command-line analyzer.
#[derive(Debug, Clone)]
pub struct InferAnalyzer {
    binary: PathBuf,
}

impl InferAnalyzer {
    /// Creates an analyzer that invokes `binary`.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Analyzer executable.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Builds the analyzer command line for `job`.
    pub fn command(&self, job: &AnalysisJob) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg("--cost")
            .arg("-o")
            .arg(&job.output_dir)
            .arg("--")
            .current_dir(&job.working_dir);

        match &job.target {
            AnalysisTarget::File(path) => {
                command.arg("javac").arg(path);
            }
            AnalysisTarget::Project(build) => {
                command.args(build);
            }
        }
        command
    }

    fn execute(&self, job: &AnalysisJob) -> Result<Vec<u8>> {
        let output = self.command(job).output().map_err(|e| {
            CostlensError::AnalysisFailed(format!(
                "could not start {}: {}",
                self.binary.display(),
                e
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.lines().last().unwrap_or("no output").trim().to_string();
            return Err(CostlensError::AnalysisFailed(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                detail
            )));
        }

        let report = job.output_dir.join(REPORT_FILE);
        std::fs::read(&report).map_err(|e| {
            CostlensError::AnalysisFailed(format!("cannot read {}: {}", report.display(), e))
        })
    }
}

impl Default for InferAnalyzer {
    fn default() -> Self {
        Self::new("infer")
    }
}

impl Analyzer for InferAnalyzer {
    fn run(&self, job: &AnalysisJob) -> Result<Vec<u8>> {
        info!("Running analyzer on {:?}", job.target);
        let result = self.execute(job);

        if job.output_dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&job.output_dir) {
                warn!("Could not remove {}: {}", job.output_dir.display(), e);
            }
        }

        match &result {
            Ok(bytes) => debug!("Analyzer report: {} bytes", bytes.len()),
            Err(e) => warn!("{}", e),
        }
        result
    }
}

/// Splits a build command shell-style.
///
/// Whitespace separates words. Single quotes keep their content literally,
/// double quotes allow `\"` and `\\` escapes, and a backslash outside quotes
/// escapes the next character.
///
/// # Errors
///
/// Returns `CostlensError::InputInvalid` for an empty command, an unbalanced
/// quote, or a trailing backslash.
///
/// # Example
///
/// ```rust
/// use costlens_core::analyzer::split_command;
///
/// let words = split_command(r#"mvn -q "-Dmsg=hello world" compile"#).unwrap();
/// assert_eq!(words, vec!["mvn", "-q", "-Dmsg=hello world", "compile"]);
/// ```
pub fn split_command(command: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = command.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(next) => word.push(next),
                        None => return Err(invalid(command, "unbalanced single quote")),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(next @ ('"' | '\\')) => word.push(next),
                            Some(next) => {
                                word.push('\\');
                                word.push(next);
                            }
                            None => return Err(invalid(command, "unbalanced double quote")),
                        },
                        Some(next) => word.push(next),
                        None => return Err(invalid(command, "unbalanced double quote")),
                    }
                }
            }
            '\\' => match chars.next() {
                Some(next) => {
                    in_word = true;
                    word.push(next);
                }
                None => return Err(invalid(command, "trailing backslash")),
            },
            c => {
                in_word = true;
                word.push(c);
            }
        }
    }

    if in_word {
        words.push(word);
    }
    if words.is_empty() {
        return Err(CostlensError::InputInvalid(
            "build command must not be empty".to_string(),
        ));
    }
    Ok(words)
}

fn invalid(command: &str, reason: &str) -> CostlensError {
    CostlensError::InputInvalid(format!("build command {:?}: {}", command, reason))
}
