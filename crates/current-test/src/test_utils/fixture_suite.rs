//! Deterministic fixture test-file generator for benchmarks and tests.
//!
//! Generates synthetic mocha/jest style test files with controlled
//! characteristics: number of top-level suites, nesting depth, tests per
//! suite, and extra non-test statements per test body.
//!
//! All output is deterministic, so benchmarks are reproducible.

use std::fmt::Write;
use std::path::Path;
use tempfile::TempDir;

/// Configuration for generating a fixture test file.
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    pub suite_count: usize,
    pub nesting_depth: usize,
    pub tests_per_suite: usize,
    pub extra_lines_per_test: usize,
}

/// Block call forms cycled through deterministically for generated tests.
const TEST_CALLEES: &[&str] = &["it", "test", "it.only", "test.skip", "xit"];

/// Name fragments that need regex escaping once resolved.
const NAME_DECORATIONS: &[&str] = &["", " (async)", " [edge]", " a+b", " $value", " 1.0"];

impl FixtureConfig {
    /// Small file: 3 suites, depth 2, 3 tests per suite.
    pub fn small() -> Self {
        Self {
            suite_count: 3,
            nesting_depth: 2,
            tests_per_suite: 3,
            extra_lines_per_test: 1,
        }
    }

    /// Medium file: 10 suites, depth 3, 5 tests per suite.
    pub fn medium() -> Self {
        Self {
            suite_count: 10,
            nesting_depth: 3,
            tests_per_suite: 5,
            extra_lines_per_test: 3,
        }
    }

    /// Large file: 40 suites, depth 4, 8 tests per suite.
    pub fn large() -> Self {
        Self {
            suite_count: 40,
            nesting_depth: 4,
            tests_per_suite: 8,
            extra_lines_per_test: 5,
        }
    }

    /// Number of blocks (suites and tests) a generated file contains.
    pub fn expected_block_count(&self) -> usize {
        // Each suite level holds one nested suite plus its tests
        let per_top_level = self.nesting_depth * (1 + self.tests_per_suite);
        self.suite_count * per_top_level
    }
}

fn write_suite(content: &mut String, path: &str, depth: usize, config: &FixtureConfig) {
    let indent = "  ".repeat(config.nesting_depth - depth);
    writeln!(content, "{}describe(\"suite {}\", () => {{", indent, path).unwrap();

    for test_i in 0..config.tests_per_suite {
        let callee = TEST_CALLEES[test_i % TEST_CALLEES.len()];
        let decoration = NAME_DECORATIONS[test_i % NAME_DECORATIONS.len()];
        writeln!(
            content,
            "{}  {}(\"case {}.{}{}\", () => {{",
            indent, callee, path, test_i, decoration
        )
        .unwrap();
        for line_i in 0..config.extra_lines_per_test {
            writeln!(content, "{}    const value_{} = compute({});", indent, line_i, line_i).unwrap();
        }
        writeln!(content, "{}    expect(value).toBeDefined();", indent).unwrap();
        writeln!(content, "{}  }});", indent).unwrap();
    }

    if depth > 1 {
        write_suite(content, &format!("{}.0", path), depth - 1, config);
    }

    writeln!(content, "{}}});", indent).unwrap();
}

/// Generate the content of a test file deterministically.
pub fn generate_test_file(config: &FixtureConfig) -> String {
    let mut content = String::new();
    content.push_str("import { compute } from \"./compute\";\n\n");
    for suite_i in 0..config.suite_count {
        write_suite(&mut content, &suite_i.to_string(), config.nesting_depth, config);
        content.push('\n');
    }
    content
}

/// Create a temporary workspace containing `src/generated.test.ts`.
///
/// The directory is cleaned up when the `TempDir` is dropped.
pub fn create_fixture_workspace(config: &FixtureConfig) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory for fixture workspace");
    write_fixture_workspace(temp_dir.path(), config);
    temp_dir
}

/// Write the fixture test file into an existing directory.
pub fn write_fixture_workspace(dir: &Path, config: &FixtureConfig) {
    let src = dir.join("src");
    std::fs::create_dir_all(&src)
        .unwrap_or_else(|e| panic!("Failed to create {}: {}", src.display(), e));
    let filepath = src.join("generated.test.ts");
    std::fs::write(&filepath, generate_test_file(config))
        .unwrap_or_else(|e| panic!("Failed to write fixture file {}: {}", filepath.display(), e));
}
