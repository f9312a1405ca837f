//! Execution tool resolution
//
// Finds the interpreter-bootstrap tool (uv by default) and builds the command
// line used to run a script. Configured search directories win over PATH so a
// private toolchain can shadow whatever the host has installed.

use std::path::{Path, PathBuf};
use tokio::process::Command;
use which::which;

use crate::config::ExecutionConfig;
use crate::errors::ForgeError;

#[derive(Debug, Clone)]
pub struct ToolResolver {
    program: String,
    args: Vec<String>,
    search_dirs: Vec<PathBuf>,
}

impl ToolResolver {
    pub fn new(config: &ExecutionConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            search_dirs: config.search_dirs.clone(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn find_tool(&self) -> Option<PathBuf> {
        let program = Path::new(&self.program);
        if program.is_absolute() || program.components().count() > 1 {
            return program.canonicalize().ok().filter(|p| p.is_file());
        }

        self.find_tool_in_search_dirs().or_else(|| which(&self.program).ok())
    }

    fn find_tool_in_search_dirs(&self) -> Option<PathBuf> {
        self.search_dirs
            .iter()
            .map(|dir| dir.join(&self.program))
            .find(|candidate| candidate.is_file())
    }

    /// `<tool> <args...> <script_path>`, not yet configured for I/O or env.
    pub fn get_command(&self, script_path: &Path) -> Result<Command, ForgeError> {
        let tool_path = self.find_tool().ok_or_else(|| {
            ForgeError::Launch(format!("'{}' executable not found in PATH", self.program))
        })?;

        log::debug!(
            "Resolved '{}' to {} (args: {:?})",
            self.program,
            tool_path.display(),
            self.args
        );

        let mut cmd = Command::new(tool_path);
        cmd.args(&self.args).arg(script_path);
        Ok(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn resolver(program: &str, search_dirs: Vec<PathBuf>) -> ToolResolver {
        let config = ExecutionConfig {
            program: program.to_string(),
            search_dirs,
            ..Default::default()
        };
        ToolResolver::new(&config)
    }

    #[test]
    fn test_missing_tool_is_launch_error() {
        let r = resolver("protoforge-no-such-tool-xyz", Vec::new());
        assert!(r.find_tool().is_none());

        let err = r.get_command(Path::new("/tmp/script.py")).unwrap_err();
        assert!(matches!(err, ForgeError::Launch(ref m) if m.contains("protoforge-no-such-tool-xyz")));
    }

    #[test]
    fn test_search_dirs_take_precedence() {
        let tmp = tempdir().unwrap();
        let fake = tmp.path().join("sh");
        fs::write(&fake, "#!/bin/sh\n").unwrap();

        let r = resolver("sh", vec![tmp.path().to_path_buf()]);
        assert_eq!(r.find_tool(), Some(fake));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("bin").join("uv");
        let r = resolver(missing.to_str().unwrap(), Vec::new());
        assert!(r.find_tool().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_line_layout() {
        let config = ExecutionConfig {
            program: "sh".to_string(),
            args: vec!["-e".to_string()],
            ..Default::default()
        };
        let cmd = ToolResolver::new(&config)
            .get_command(Path::new("/runs/x/script.py"))
            .unwrap();

        let args: Vec<_> = cmd
            .as_std()
            .get_args()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, vec!["-e", "/runs/x/script.py"]);
        assert!(cmd.as_std().get_program().to_string_lossy().ends_with("sh"));
    }
}
