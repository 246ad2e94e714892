/// System module: external command execution, operator prompt, workspace paths

pub mod paths;
pub mod preflight;

use std::fmt;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{BuildError, Result};

pub use paths::WorkspacePaths;

/// One external command invocation: program, arguments, working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
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

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// File name of the program (`make`, `gh`, `feeds`).
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.contains('\n') {
                // Multi-line values are elided to their first line
                let first = arg.lines().next().unwrap_or_default();
                write!(f, " \"{}…\"", first)?;
            } else if arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Seam for every external process the pipeline starts.
///
/// Each call blocks until the process exits. A non-zero exit is an error;
/// there is no retry and no timeout.
pub trait CommandRunner: Send + Sync {
    fn run(&self, spec: &CommandSpec) -> Result<()>;
}

/// Production runner: inherits stdio so the operator sees the tool output live.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<()> {
        log::info!("[Exec] {}", spec);

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(dir) = &spec.cwd {
            command.current_dir(dir);
        }

        let status = command.status().map_err(|e| BuildError::CommandSpawn {
            cmd: spec.to_string(),
            reason: e.to_string(),
        })?;

        if status.success() {
            Ok(())
        } else {
            let status = match status.code() {
                Some(code) => format!("exit code {}", code),
                None => "terminated by signal".to_string(),
            };
            log::error!("[Exec] {} failed: {}", spec.program_name(), status);
            Err(BuildError::CommandFailed {
                cmd: spec.to_string(),
                status,
            })
        }
    }
}

/// Ask a yes/no question and read one line of response.
///
/// Only a trimmed, case-insensitive `y` or `yes` counts as yes. EOF counts as no.
pub fn prompt_yes_no<R, W>(input: &mut R, output: &mut W, question: &str) -> Result<bool>
where
    R: BufRead + ?Sized,
    W: Write + ?Sized,
{
    write!(output, "{} [y/N] ", question).map_err(|e| BuildError::Prompt(e.to_string()))?;
    output.flush().map_err(|e| BuildError::Prompt(e.to_string()))?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .map_err(|e| BuildError::Prompt(e.to_string()))?;

    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_command_spec_display() {
        let spec = CommandSpec::new("make")
            .args(["-j8", "V=s"])
            .current_dir("/tmp/openwrt");
        assert_eq!(spec.to_string(), "make -j8 V=s");
        assert_eq!(spec.cwd.as_deref(), Some(Path::new("/tmp/openwrt")));
    }

    #[test]
    fn test_command_spec_elides_multiline_args() {
        let spec = CommandSpec::new("gh").arg("--notes").arg("Build Time: now\nmore");
        assert_eq!(spec.to_string(), "gh --notes \"Build Time: now…\"");
    }

    #[test]
    fn test_command_spec_quotes_paths_with_spaces() {
        let spec = CommandSpec::new("gh").arg("--notes-file").arg("/my out/release-info.txt");
        assert_eq!(spec.to_string(), "gh --notes-file \"/my out/release-info.txt\"");
    }

    #[test]
    fn test_program_name_strips_directory() {
        let spec = CommandSpec::new("/src/openwrt/scripts/feeds");
        assert_eq!(spec.program_name(), "feeds");
    }

    #[test]
    fn test_prompt_yes_variants() {
        for answer in ["y\n", "Y\n", "yes\n", "  YES  \n"] {
            let mut input = Cursor::new(answer.as_bytes());
            let mut output = Vec::new();
            assert!(prompt_yes_no(&mut input, &mut output, "Publish?").unwrap());
        }
    }

    #[test]
    fn test_prompt_no_variants() {
        for answer in ["n\n", "\n", "nope\n", ""] {
            let mut input = Cursor::new(answer.as_bytes());
            let mut output = Vec::new();
            assert!(!prompt_yes_no(&mut input, &mut output, "Publish?").unwrap());
        }
    }

    #[test]
    fn test_prompt_writes_question() {
        let mut input = Cursor::new(b"n\n".as_slice());
        let mut output = Vec::new();
        prompt_yes_no(&mut input, &mut output, "Publish release?").unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "Publish release? [y/N] ");
    }

    #[test]
    fn test_system_runner_reports_failure() {
        let result = SystemRunner.run(&CommandSpec::new("false"));
        assert!(matches!(result, Err(BuildError::CommandFailed { .. })));
    }

    #[test]
    fn test_system_runner_reports_spawn_failure() {
        let result = SystemRunner.run(&CommandSpec::new("definitely_not_a_real_command_12345"));
        assert!(matches!(result, Err(BuildError::CommandSpawn { .. })));
    }
}
