//! This module provides the `MachineLoader` struct, responsible for loading machine
//! descriptions from files, strings and directories.

use crate::parser::{parse, parse_named};
use crate::types::{Machine, TilerError, MAX_MACHINE_SIZE};
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of machine descriptions.
pub const MACHINE_EXTENSION: &str = "tm";

/// `MachineLoader` is a utility struct for loading machine descriptions.
pub struct MachineLoader;

impl MachineLoader {
    /// Loads a single machine description from the specified file path.
    ///
    /// A description without a `NAME` directive is named after the file stem.
    ///
    /// # Returns
    ///
    /// * `Ok(Machine)` if the file is successfully read, parsed and validated.
    /// * `Err(TilerError::FileError)` if the file cannot be read or is too large.
    /// * `Err(TilerError::ParseError)` or `Err(TilerError::ValidationError)` if the
    ///   content is not a valid machine.
    pub fn load_machine(path: &Path, boundary_symbol: &str) -> Result<Machine, TilerError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TilerError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        if content.len() > MAX_MACHINE_SIZE {
            return Err(TilerError::FileError(format!(
                "Machine description {} exceeds {} bytes",
                path.display(),
                MAX_MACHINE_SIZE
            )));
        }

        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(crate::types::DEFAULT_MACHINE_NAME);

        parse_named(&content, name, boundary_symbol)
    }

    /// Loads a machine from the provided string content, e.g. user input.
    pub fn load_machine_from_string(
        content: &str,
        boundary_symbol: &str,
    ) -> Result<Machine, TilerError> {
        parse(content, boundary_symbol)
    }

    /// Loads every machine description (`.tm` extension) in a directory.
    ///
    /// Directories and other files are skipped. Each file gets its own result so one bad
    /// description does not hide the others.
    pub fn load_machines(
        directory: &Path,
        boundary_symbol: &str,
    ) -> Vec<Result<(PathBuf, Machine), TilerError>> {
        if !directory.exists() {
            return vec![Err(TilerError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(TilerError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut paths = Vec::new();
        let mut results = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => paths.push(entry.path()),
                Err(e) => results.push(Err(TilerError::FileError(format!(
                    "Failed to read directory entry: {}",
                    e
                )))),
            }
        }

        // read_dir order is platform dependent
        paths.sort();

        results.extend(
            paths
                .into_iter()
                .filter(|path| {
                    !path.is_dir() && path.extension().is_some_and(|ext| ext == MACHINE_EXTENSION)
                })
                .map(|path| match Self::load_machine(&path, boundary_symbol) {
                    Ok(machine) => Ok((path, machine)),
                    Err(e) => Err(TilerError::FileError(format!(
                        "Failed to load machine from {}: {}",
                        path.display(),
                        e
                    ))),
                }),
        );

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_BOUNDARY_SYMBOL;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_load_valid_machine() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("flip.tm");
        write(&file_path, "SYMBOL 0\nSYMBOL 1\nTRANSITION 1 0 1 H 1\nTRANSITION 1 1 0 H 1\n");

        let machine = MachineLoader::load_machine(&file_path, DEFAULT_BOUNDARY_SYMBOL).unwrap();
        assert_eq!(machine.name, "flip");
        assert_eq!(machine.symbols, vec!["0", "1", "*"]);
        assert_eq!(machine.transitions.len(), 2);
    }

    #[test]
    fn test_name_directive_wins_over_file_name() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("file.tm");
        write(&file_path, "NAME declared\nSYMBOL 0\nTRANSITION 1 0 0 H 1");

        let machine = MachineLoader::load_machine(&file_path, DEFAULT_BOUNDARY_SYMBOL).unwrap();
        assert_eq!(machine.name, "declared");
    }

    #[test]
    fn test_load_invalid_machine() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("invalid.tm");
        write(&file_path, "This is not a valid machine");

        let result = MachineLoader::load_machine(&file_path, DEFAULT_BOUNDARY_SYMBOL);
        assert!(matches!(result, Err(TilerError::ValidationError(_))));
    }

    #[test]
    fn test_load_missing_and_oversized_files() {
        let dir = tempdir().unwrap();

        let missing = MachineLoader::load_machine(&dir.path().join("nope.tm"), "*");
        assert!(matches!(missing, Err(TilerError::FileError(_))));

        let file_path = dir.path().join("huge.tm");
        let mut content = String::from("SYMBOL 0\nTRANSITION 1 0 0 H 1\n");
        content.push_str(&"# padding\n".repeat(MAX_MACHINE_SIZE / 10 + 1));
        write(&file_path, &content);

        let error = MachineLoader::load_machine(&file_path, "*").unwrap_err();
        assert!(error.to_string().contains("exceeds"));
    }

    #[test]
    fn test_load_machine_from_string() {
        let machine =
            MachineLoader::load_machine_from_string("SYMBOL a\nTRANSITION 1 a a H 1", "|")
                .unwrap();
        assert_eq!(machine.boundary_symbol, "|");
        assert_eq!(machine.name, crate::types::DEFAULT_MACHINE_NAME);
    }

    #[test]
    fn test_load_machines_from_directory() {
        let dir = tempdir().unwrap();

        write(
            &dir.path().join("valid.tm"),
            "SYMBOL 0\nTRANSITION 1 0 0 H 1",
        );
        write(&dir.path().join("invalid.tm"), "SYMBOL 0");
        write(&dir.path().join("ignored.txt"), "This file should be ignored");

        let results = MachineLoader::load_machines(dir.path(), DEFAULT_BOUNDARY_SYMBOL);

        // sorted by path: invalid.tm, valid.tm
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        let (path, machine) = results[1].as_ref().unwrap();
        assert!(path.ends_with("valid.tm"));
        assert_eq!(machine.name, "valid");
    }

    #[test]
    fn test_load_machines_missing_directory() {
        let dir = tempdir().unwrap();
        let results =
            MachineLoader::load_machines(&dir.path().join("absent"), DEFAULT_BOUNDARY_SYMBOL);

        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(TilerError::FileError(_))));
    }
}
