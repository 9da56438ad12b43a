//! Source file discovery.
//!
//! Inputs are resolved against the base path. A directory input yields the
//! source files it contains (descending into subdirectories only when asked);
//! any other input is taken as a file and yielded if its name looks like
//! source. Paths keep the spelling of the input that produced them, so `.`
//! yields `./a.py`.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::languages::LanguageSupport;

/// Files found, plus directories that could not be listed.
#[derive(Debug, Default)]
pub struct Discovered {
    /// Source paths relative to the base, in discovery order
    pub files: Vec<String>,
    /// Directories skipped, with the reason
    pub directories_skipped: Vec<(PathBuf, String)>,
}

/// Expand `inputs` into the ordered list of source files to index.
pub fn discover(
    base: &Path,
    inputs: &[String],
    recurse: bool,
    language: &dyn LanguageSupport,
) -> Discovered {
    let mut found = Discovered::default();
    for input in inputs {
        if base.join(input).is_dir() {
            walk_dir(base, Path::new(input), recurse, language, &mut found);
        } else if language.handles(input) {
            found.files.push(input.clone());
        }
    }
    found
}

/// List one directory in name order.
///
/// Hidden subdirectories are never entered.
fn walk_dir(
    base: &Path,
    relative: &Path,
    recurse: bool,
    language: &dyn LanguageSupport,
    found: &mut Discovered,
) {
    let dir = base.join(relative);
    let entries = match std::fs::read_dir(&dir) {
        Ok(e) => e,
        Err(e) => {
            warn!(
                directory = %dir.display(),
                error = %e,
                "Cannot read directory, skipping"
            );
            found.directories_skipped.push((dir, e.to_string()));
            return;
        }
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(
                    directory = %dir.display(),
                    error = %e,
                    "Failed to read directory entry, skipping"
                );
                continue;
            }
        };
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => warn!(
                directory = %dir.display(),
                name = ?name,
                "File name is not valid UTF-8, skipping"
            ),
        }
    }
    names.sort();

    for name in names {
        let path = relative.join(&name);
        if base.join(&path).is_dir() {
            if recurse && !name.starts_with('.') {
                walk_dir(base, &path, recurse, language, found);
            }
        } else if language.handles(&name) {
            // Both halves are UTF-8, so the join is too.
            found.files.push(path.to_string_lossy().into_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::python::PythonLanguage;
    use std::fs;
    use tempfile::TempDir;

    fn tree(files: &[&str]) -> TempDir {
        let dir = TempDir::new().expect("create temp dir");
        for file in files {
            let path = dir.path().join(file);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create parent");
            }
            fs::write(&path, "x = 1\n").expect("write file");
        }
        dir
    }

    fn run(dir: &TempDir, inputs: &[&str], recurse: bool) -> Vec<String> {
        let inputs: Vec<String> = inputs.iter().map(|s| (*s).to_string()).collect();
        discover(dir.path(), &inputs, recurse, &PythonLanguage).files
    }

    #[test]
    fn current_directory_yields_dot_prefixed_paths_in_name_order() {
        let dir = tree(&["b.py", "a.py", "notes.txt"]);

        assert_eq!(run(&dir, &["."], false), vec!["./a.py", "./b.py"]);
    }

    #[test]
    fn subdirectories_need_recursion() {
        let dir = tree(&["top.py", "pkg/inner.py", "pkg/deep/leaf.py"]);

        assert_eq!(run(&dir, &["."], false), vec!["./top.py"]);
        assert_eq!(
            run(&dir, &["."], true),
            vec!["./pkg/deep/leaf.py", "./pkg/inner.py", "./top.py"]
        );
    }

    #[test]
    fn hidden_directories_are_skipped() {
        let dir = tree(&["a.py", ".venv/lib.py"]);

        assert_eq!(run(&dir, &["."], true), vec!["./a.py"]);
    }

    #[test]
    fn explicit_file_inputs_are_kept_verbatim() {
        let dir = tree(&["pkg/mod.py"]);

        assert_eq!(
            run(&dir, &["pkg/mod.py", "README.md", "missing.py"], false),
            vec!["pkg/mod.py", "missing.py"]
        );
    }

    #[test]
    fn directory_input_keeps_its_spelling() {
        let dir = tree(&["pkg/mod.py"]);

        assert_eq!(run(&dir, &["pkg"], false), vec!["pkg/mod.py"]);
    }

    #[test]
    fn no_sources_yields_nothing() {
        let dir = tree(&[]);

        let found = discover(dir.path(), &[".".to_string()], true, &PythonLanguage);

        assert!(found.files.is_empty());
        assert!(found.directories_skipped.is_empty());
    }
}
