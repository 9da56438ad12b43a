//! Shared utilities for pyscope benchmarks.

// Benchmark utilities - pedantic lints not critical here
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::format_push_string)]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// Create a temporary project with the given files.
/// Returns the temp directory (must be kept alive) and its path.
pub fn create_workspace(files: &[(String, String)]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");

    for (path, content) in files {
        let full_path = dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("failed to write file");
    }

    let path = dir.path().to_path_buf();
    (dir, path)
}

/// A realistic Python module: imports, a class with methods, free functions.
pub fn generate_python_module(name: &str, num_functions: usize, num_methods: usize) -> String {
    let mut code = String::new();

    code.push_str("import os.path\n");
    code.push_str("from collections import defaultdict\n\n");

    code.push_str(&format!("class {name}Service(object):\n"));
    code.push_str("    \"\"\"Keeps counts per key.\n\n    Multi-line docstring.\n    \"\"\"\n\n");
    code.push_str("    def __init__(self, root):\n");
    code.push_str("        self.root = root\n");
    code.push_str("        self.counts = defaultdict(int)\n\n");
    for i in 0..num_methods {
        code.push_str(&format!(
            "    @property\n\
             \x20   def value_{i}(self):\n\
             \x20       total = 0\n\
             \x20       for key, count in self.counts.items():\n\
             \x20           if key.startswith('{i}'):\n\
             \x20               total += count\n\
             \x20       return os.path.join(self.root, str(total))\n\n"
        ));
    }

    for i in 0..num_functions {
        code.push_str(&format!(
            "def {name}_func_{i}(items, scale=2):\n\
             \x20   result, seen = [], set()\n\
             \x20   for item in items:\n\
             \x20       seen.add(item)\n\
             \x20       result.append(item * scale + {i})\n\
             \x20   return sorted(result)\n\n"
        ));
    }

    code
}

/// `count` modules spread over a few packages.
pub fn generate_project(count: usize) -> Vec<(String, String)> {
    (0..count)
        .map(|i| {
            (
                format!("pkg{}/mod_{i}.py", i % 4),
                generate_python_module(&format!("M{i}"), 10, 5),
            )
        })
        .collect()
}
