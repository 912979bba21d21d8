//
// resolve_command.rs
//
// Substitution of test block and path information into a command template
//

use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::test_blocks::TestBlock;

/// Compiled regex patterns for command resolution
struct ResolvePatterns {
    placeholder: Regex,
    regex_special: Regex,
}

fn patterns() -> &'static ResolvePatterns {
    static PATTERNS: OnceLock<ResolvePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| ResolvePatterns {
        placeholder: Regex::new(
            r"\$\{(workspaceRoot|testFilePath|relativeTestPath|testName|fullTestName)\}",
        )
        .unwrap(),
        regex_special: Regex::new(r"[|\\{}()\[\]^$+*?.]").unwrap(),
    })
}

/// Inputs for a single command resolution
#[derive(Debug, Clone)]
pub struct ResolveRequest<'a> {
    /// Absolute workspace root
    pub workspace_root: &'a str,
    /// Absolute path of the test file
    pub test_file_path: &'a str,
    /// Joins the names that make up `${fullTestName}`
    pub test_name_separator: &'a str,
    /// Used wherever a block name is unknown
    pub unknown_test_name_literal: &'a str,
    /// Block enclosing the cursor, if any
    pub test_block: Option<&'a TestBlock>,
    /// Rewrite `\` to `/` in path placeholders
    pub unix_paths: bool,
}

/// Resolve `template`, replacing `${workspaceRoot}`, `${testFilePath}`,
/// `${relativeTestPath}`, `${testName}` and `${fullTestName}`.
///
/// All occurrences are replaced in a single pass over the template, so
/// substituted values are never themselves scanned for placeholders.
/// Unrecognized `${...}` tokens are left as they are.
pub fn resolve_command(template: &str, request: &ResolveRequest) -> String {
    let relative_test_path = relative_path(request.workspace_root, request.test_file_path);
    let (test_name, full_test_name) = test_names(request);

    let (workspace_root, test_file_path, relative_test_path) = if request.unix_paths {
        (
            to_unix_separators(request.workspace_root),
            to_unix_separators(request.test_file_path),
            to_unix_separators(&relative_test_path),
        )
    } else {
        (
            request.workspace_root.to_string(),
            request.test_file_path.to_string(),
            relative_test_path,
        )
    };

    let resolved = patterns()
        .placeholder
        .replace_all(template, |caps: &Captures| match &caps[1] {
            "workspaceRoot" => workspace_root.clone(),
            "testFilePath" => test_file_path.clone(),
            "relativeTestPath" => relative_test_path.clone(),
            "testName" => test_name.clone(),
            "fullTestName" => full_test_name.clone(),
            other => format!("${{{}}}", other),
        })
        .into_owned();

    log::debug!("Resolved command template '{}' to '{}'", template, resolved);
    resolved
}

/// Compute `(testName, fullTestName)` for the request's block.
fn test_names(request: &ResolveRequest) -> (String, String) {
    let unknown = request.unknown_test_name_literal;
    let known = |name: &Option<String>| -> Option<String> {
        name.as_deref()
            .filter(|n| !n.is_empty())
            .map(escape_for_regex)
    };

    let Some(block) = request.test_block else {
        return (unknown.to_string(), unknown.to_string());
    };
    let name = known(&block.name);
    if name.is_none() && block.parent_names.is_empty() {
        return (unknown.to_string(), unknown.to_string());
    }

    let test_name = name.unwrap_or_else(|| unknown.to_string());
    let mut parts: Vec<String> = block
        .parent_names
        .iter()
        .map(|parent| known(parent).unwrap_or_else(|| unknown.to_string()))
        .collect();
    parts.push(test_name.clone());
    let full_test_name = parts.join(request.test_name_separator);

    (test_name, full_test_name)
}

/// Prefix every regular expression metacharacter in `name` with a backslash.
pub fn escape_for_regex(name: &str) -> String {
    patterns()
        .regex_special
        .replace_all(name, |caps: &Captures| format!("\\{}", &caps[0]))
        .into_owned()
}

fn to_unix_separators(path: &str) -> String {
    path.replace('\\', "/")
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Split a path into normalized components. `.` is dropped and `..` pops the
/// previous component when there is one.
fn path_components(path: &str) -> Vec<&str> {
    let mut components: Vec<&str> = Vec::new();
    for part in path.split(is_separator) {
        match part {
            "" | "." => {}
            ".." => match components.last() {
                Some(&last) if last != ".." => {
                    components.pop();
                }
                _ => components.push(".."),
            },
            _ => components.push(part),
        }
    }
    components
}

/// Drive prefix such as `C:` at the start of a path
fn drive_letter(path: &str) -> Option<char> {
    let mut chars = path.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), Some(':')) if letter.is_ascii_alphabetic() => Some(letter),
        _ => None,
    }
}

/// Express `path` relative to `root` without touching the filesystem.
///
/// Both `/` and `\` are accepted as separators. The result is joined with `\`
/// when `path` only uses backslashes, otherwise with `/`. Paths outside `root`
/// get leading `..` components; identical paths give an empty string.
///
/// Paths with a drive letter compare case-insensitively, and a `path` on a
/// different drive than `root` is returned unchanged.
pub fn relative_path(root: &str, path: &str) -> String {
    let root_drive = drive_letter(root);
    let path_drive = drive_letter(path);
    if let (Some(a), Some(b)) = (root_drive, path_drive) {
        if !a.eq_ignore_ascii_case(&b) {
            log::trace!("{} is on another drive than {}", path, root);
            return path.to_string();
        }
    }
    let ignore_case = root_drive.is_some() || path_drive.is_some();

    let root_components = path_components(root);
    let path_components = path_components(path);

    let common = root_components
        .iter()
        .zip(&path_components)
        .take_while(|(a, b)| if ignore_case { a.eq_ignore_ascii_case(b) } else { a == b })
        .count();

    let mut parts: Vec<&str> = Vec::new();
    parts.extend(std::iter::repeat("..").take(root_components.len() - common));
    parts.extend(&path_components[common..]);

    let separator = if path.contains('\\') && !path.contains('/') {
        "\\"
    } else {
        "/"
    };
    parts.join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(name: Option<&str>, parents: &[Option<&str>]) -> TestBlock {
        TestBlock {
            name: name.map(str::to_string),
            parent_names: parents.iter().map(|p| p.map(str::to_string)).collect(),
            start: 0,
            end: 0,
        }
    }

    fn request<'a>(test_block: Option<&'a TestBlock>) -> ResolveRequest<'a> {
        ResolveRequest {
            workspace_root: "/home/test",
            test_file_path: "/home/test/src/test.tsx",
            test_name_separator: "\\s",
            unknown_test_name_literal: ".*",
            test_block,
            unix_paths: false,
        }
    }

    #[test]
    fn test_substitutes_all_placeholders() {
        let block = block(Some("test block"), &[Some("describe"), Some("context")]);
        let result = resolve_command(
            "node ${workspaceRoot}/test ${testFilePath} ${relativeTestPath} \"${testName}\" \"${fullTestName}\"",
            &request(Some(&block)),
        );
        assert_eq!(
            result,
            "node /home/test/test /home/test/src/test.tsx src/test.tsx \"test block\" \"describe\\scontext\\stest block\""
        );
    }

    #[test]
    fn test_replaces_every_occurrence() {
        let block = block(Some("a"), &[]);
        let result = resolve_command("${testName} ${testName}${testName}", &request(Some(&block)));
        assert_eq!(result, "a aa");
    }

    #[test]
    fn test_unknown_literal_without_block_or_names() {
        assert_eq!(resolve_command("${testName} ${fullTestName}", &request(None)), ".* .*");

        let unnamed = block(None, &[]);
        assert_eq!(
            resolve_command("${testName} ${fullTestName}", &request(Some(&unnamed))),
            ".* .*"
        );
    }

    #[test]
    fn test_unknown_literal_replaces_missing_names() {
        let unnamed = block(None, &[Some("describe"), Some("context")]);
        assert_eq!(
            resolve_command("${testName} ${fullTestName}", &request(Some(&unnamed))),
            ".* describe\\scontext\\s.*"
        );

        let gap = block(Some("test block"), &[Some("describe"), None, Some("context")]);
        assert_eq!(
            resolve_command("${testName} ${fullTestName}", &request(Some(&gap))),
            "test block describe\\s.*\\scontext\\stest block"
        );

        let both = block(None, &[Some("describe"), None, Some("context")]);
        assert_eq!(
            resolve_command("${testName} ${fullTestName}", &request(Some(&both))),
            ".* describe\\s.*\\scontext\\s.*"
        );
    }

    #[test]
    fn test_empty_names_count_as_unknown() {
        let empty = block(Some(""), &[Some("")]);
        assert_eq!(
            resolve_command("${testName} ${fullTestName}", &request(Some(&empty))),
            ".* .*\\s.*"
        );
    }

    #[test]
    fn test_escapes_block_names() {
        let block = block(
            Some("test[] ${name} block()^+?"),
            &[Some("describe(${name})[]"), Some("context?+")],
        );
        let result = resolve_command("${fullTestName}", &request(Some(&block)));
        assert_eq!(
            result,
            "describe\\(\\$\\{name\\}\\)\\[\\]\\scontext\\?\\+\\stest\\[\\] \\$\\{name\\} block\\(\\)\\^\\+\\?"
        );
    }

    #[test]
    fn test_escape_covers_every_metacharacter() {
        assert_eq!(
            escape_for_regex("|\\{}()[]^$+*?."),
            "\\|\\\\\\{\\}\\(\\)\\[\\]\\^\\$\\+\\*\\?\\."
        );
        assert_eq!(escape_for_regex("plain name - ok"), "plain name - ok");
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let mut req = request(None);
        req.workspace_root = "/ws/${testName}";
        req.test_file_path = "/ws/${testName}/a.test.ts";
        assert_eq!(
            resolve_command("${workspaceRoot} ${testName}", &req),
            "/ws/${testName} .*"
        );
    }

    #[test]
    fn test_unrecognized_placeholders_are_left_alone() {
        assert_eq!(
            resolve_command("${file} ${ testName } $testName ${testName", &request(None)),
            "${file} ${ testName } $testName ${testName"
        );
        assert_eq!(resolve_command("", &request(None)), "");
    }

    #[test]
    fn test_paths_are_not_escaped() {
        let mut req = request(None);
        req.workspace_root = "/home/a.b (c)";
        req.test_file_path = "/home/a.b (c)/x+y.test.js";
        assert_eq!(
            resolve_command("${workspaceRoot} ${relativeTestPath}", &req),
            "/home/a.b (c) x+y.test.js"
        );
    }

    #[test]
    fn test_windows_paths_with_and_without_unix_style() {
        let mut req = request(None);
        req.test_file_path = "C:\\home\\test\\src\\test.tsx";
        req.workspace_root = "C:\\home\\test";
        let template = "${workspaceRoot} ${testFilePath} ${relativeTestPath}";

        assert_eq!(
            resolve_command(template, &req),
            "C:\\home\\test C:\\home\\test\\src\\test.tsx src\\test.tsx"
        );

        req.unix_paths = true;
        assert_eq!(
            resolve_command(template, &req),
            "C:/home/test C:/home/test/src/test.tsx src/test.tsx"
        );
    }

    #[test]
    fn test_custom_separator() {
        let block = block(Some("b"), &[Some("a")]);
        let mut req = request(Some(&block));
        req.test_name_separator = " > ";
        assert_eq!(resolve_command("run ${fullTestName}", &req), "run a > b");
    }

    #[test]
    fn test_relative_path_cases() {
        assert_eq!(relative_path("/home/test", "/home/test/src/a.ts"), "src/a.ts");
        assert_eq!(relative_path("/home/test/", "/home/test/./src/../a.ts"), "a.ts");
        assert_eq!(relative_path("/home/test", "/home/other/a.ts"), "../other/a.ts");
        assert_eq!(relative_path("/home/test", "/home/test"), "");
        assert_eq!(relative_path("C:\\ws", "C:\\ws\\a\\b.ts"), "a\\b.ts");
        assert_eq!(relative_path("C:\\ws", "C:/ws/a/b.ts"), "a/b.ts");
    }

    #[test]
    fn test_relative_path_drive_letters() {
        assert_eq!(relative_path("c:\\ws", "C:\\ws\\a.ts"), "a.ts");
        assert_eq!(relative_path("C:\\Users\\Me\\ws", "c:\\users\\me\\ws\\src\\a.ts"), "src\\a.ts");
        assert_eq!(relative_path("C:\\ws", "D:\\x\\a.ts"), "D:\\x\\a.ts");
        // Without drive letters the comparison stays case-sensitive
        assert_eq!(relative_path("/home/Test", "/home/test/a.ts"), "../test/a.ts");
    }
}
