use crate::error::{ExecutorError, Result};
use common::Language;
use std::path::{Path, PathBuf};

/// Maps each language to its runner script under one directory.
///
/// Scripts are named `run_<language>.sh` and all speak the same four-argument
/// invocation and report contract, so nothing above this registry ever
/// branches on the language.
#[derive(Debug, Clone)]
pub struct RunnerSet {
    dir: PathBuf,
}

impl RunnerSet {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn script_for(&self, language: Language) -> PathBuf {
        self.dir.join(format!("run_{}.sh", language.as_str()))
    }

    /// Checks that one language's script exists and is executable.
    pub fn verify_language(&self, language: Language) -> Result<()> {
        let path = self.script_for(language);
        let metadata = std::fs::metadata(&path).map_err(|_| ExecutorError::MissingRunner {
            language,
            path: path.clone(),
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if metadata.permissions().mode() & 0o111 == 0 {
                return Err(ExecutorError::RunnerNotExecutable { language, path });
            }
        }
        #[cfg(not(unix))]
        let _ = metadata;
        Ok(())
    }

    /// Checks every language at once. Called at startup so a missing runner
    /// is found before any submission is accepted.
    pub fn verify(&self) -> Result<()> {
        for language in Language::ALL {
            self.verify_language(*language)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_paths() {
        let runners = RunnerSet::new("runners");
        assert_eq!(runners.dir(), Path::new("runners"));
        assert_eq!(
            runners.script_for(Language::Cpp),
            PathBuf::from("runners/run_cpp.sh")
        );
        assert_eq!(
            runners.script_for(Language::Python),
            PathBuf::from("runners/run_python.sh")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_verify_finds_missing_and_non_executable_scripts() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let runners = RunnerSet::new(dir.path());
        assert!(matches!(
            runners.verify(),
            Err(ExecutorError::MissingRunner { .. })
        ));

        for language in Language::ALL {
            let path = runners.script_for(*language);
            std::fs::write(&path, "#!/bin/sh\n").unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        }
        assert!(matches!(
            runners.verify(),
            Err(ExecutorError::RunnerNotExecutable { .. })
        ));

        for language in Language::ALL {
            let path = runners.script_for(*language);
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        assert!(runners.verify().is_ok());
    }
}
