//
// runner.rs
//
// Resolution of the command for the test under the cursor
//

use anyhow::anyhow;

use crate::config::{CommandKind, RunnerConfig, SETTINGS_SECTION};
use crate::parser_pool::parse_source;
use crate::position::{offset_to_position, position_to_offset};
use crate::resolve_command::{resolve_command, ResolveRequest};
use crate::test_blocks::{extract_test_blocks, find_enclosing_block, TestBlock};

/// The document and cursor a command is resolved for
#[derive(Debug, Clone)]
pub struct CurrentTestRequest<'a> {
    pub workspace_root: &'a str,
    pub test_file_path: &'a str,
    /// Full text of the test file
    pub content: &'a str,
    /// Zero-based line of the cursor
    pub line: u32,
    /// Zero-based UTF-16 character of the cursor
    pub character: u32,
    pub command: CommandKind,
}

/// Parse `content` and return every test/suite block matched by `identifiers`.
pub fn list_test_blocks<S: AsRef<str>>(
    content: &str,
    identifiers: &[S],
) -> anyhow::Result<Vec<TestBlock>> {
    let tree = parse_source(content).ok_or_else(|| anyhow!("Error parsing test file"))?;
    Ok(extract_test_blocks(&tree, content, identifiers))
}

/// Resolve the configured command template for the block under the cursor.
///
/// When the cursor is outside every block the template is still resolved,
/// with the unknown-name literal standing in for the test names.
pub fn resolve_current_test(
    config: &RunnerConfig,
    request: &CurrentTestRequest,
) -> anyhow::Result<String> {
    let template = config.command_template(request.command).ok_or_else(|| {
        anyhow!(
            "Please set {}.{} to your test command first",
            SETTINGS_SECTION,
            request.command.settings_key()
        )
    })?;

    let blocks = list_test_blocks(request.content, config.test_block_identifiers.as_slice())?;
    let offset = position_to_offset(request.content, request.line, request.character)
        .ok_or_else(|| {
            anyhow!(
                "Position {}:{} is outside {}",
                request.line,
                request.character,
                request.test_file_path
            )
        })?;

    let block = find_enclosing_block(&blocks, offset);
    match block {
        Some(block) => {
            let (start_line, start_character) = offset_to_position(request.content, block.start);
            log::debug!(
                "Cursor at {}:{} is in block {:?} starting at {}:{} (parents: {:?})",
                request.line,
                request.character,
                block.name,
                start_line,
                start_character,
                block.parent_names
            )
        }
        None => log::debug!(
            "Cursor at {}:{} is outside every test block",
            request.line,
            request.character
        ),
    }

    Ok(resolve_command(
        template,
        &ResolveRequest {
            workspace_root: request.workspace_root,
            test_file_path: request.test_file_path,
            test_name_separator: &config.test_name_separator,
            unknown_test_name_literal: &config.unknown_test_name_literal,
            test_block: block,
            unix_paths: config.unix_paths,
        },
    ))
}
