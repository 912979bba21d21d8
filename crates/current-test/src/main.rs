//
// main.rs
//
// Resolve the test or suite under the cursor into a runnable command
//

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};

use current_test::config::{load_runner_config, CommandKind, RunnerConfig};
use current_test::runner::{list_test_blocks, resolve_current_test, CurrentTestRequest};

fn print_usage() {
    println!(
        "current-test {}, resolve the test under the cursor into a command.",
        env!("CARGO_PKG_VERSION")
    );
    print!(
        r#"
Usage: current-test [OPTIONS] <FILE> <LINE> <CHARACTER>

LINE and CHARACTER are zero-based; CHARACTER counts UTF-16 code units.

Available options:

--workspace <DIR>            Workspace root (default: current directory)
--config <FILE>              JSON settings file with a runCurrentTest section
--command <TEMPLATE>         Use TEMPLATE instead of the configured command
--update-snapshots           Resolve the runAndUpdateSnapshots command
--blocks                     Print the test blocks of FILE as JSON and exit
--version                    Print the version
--help                       Print this help message

"#
    );
}

#[derive(Debug, Default)]
struct Args {
    workspace: Option<PathBuf>,
    config: Option<PathBuf>,
    command: Option<String>,
    update_snapshots: bool,
    blocks: bool,
    positional: Vec<String>,
}

fn option_value(argv: &mut impl Iterator<Item = String>, flag: &str) -> anyhow::Result<String> {
    argv.next()
        .ok_or_else(|| anyhow!("Missing value for '{flag}'"))
}

fn parse_position(value: &str, what: &str) -> anyhow::Result<u32> {
    value
        .parse()
        .with_context(|| format!("Invalid {what} '{value}'"))
}

fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(path))
}

fn main() -> anyhow::Result<()> {
    let mut argv = env::args();
    argv.next(); // skip executable name

    let mut args = Args::default();

    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--workspace" => args.workspace = Some(option_value(&mut argv, &arg)?.into()),
            "--config" => args.config = Some(option_value(&mut argv, &arg)?.into()),
            "--command" => args.command = Some(option_value(&mut argv, &arg)?),
            "--update-snapshots" => args.update_snapshots = true,
            "--blocks" => args.blocks = true,
            "--version" => {
                println!("current-test {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_usage();
                return Ok(());
            }
            other if other.starts_with("--") => {
                return Err(anyhow!("Unknown argument: '{other}'"));
            }
            other => args.positional.push(other.to_string()),
        }
    }

    env_logger::init();

    let Some(file) = args.positional.first() else {
        print_usage();
        return Ok(());
    };
    let file = absolute(Path::new(file))?;
    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let mut config = match &args.config {
        Some(path) => load_runner_config(path)?,
        None => RunnerConfig::default(),
    };

    if args.blocks {
        let blocks = list_test_blocks(&content, config.test_block_identifiers.as_slice())?;
        println!("{}", serde_json::to_string_pretty(&blocks)?);
        return Ok(());
    }

    let [_, line, character] = args.positional.as_slice() else {
        return Err(anyhow!("Expected <FILE> <LINE> <CHARACTER>"));
    };
    let line = parse_position(line, "line")?;
    let character = parse_position(character, "character")?;

    let command = if args.update_snapshots {
        CommandKind::RunAndUpdateSnapshots
    } else {
        CommandKind::Run
    };
    if let Some(template) = args.command {
        config.set_command_template(command, template);
    }

    let workspace = match &args.workspace {
        Some(dir) => absolute(dir)?,
        None => env::current_dir().context("Failed to read current directory")?,
    };
    let workspace_root = workspace.to_string_lossy();
    let test_file_path = file.to_string_lossy();

    let resolved = resolve_current_test(
        &config,
        &CurrentTestRequest {
            workspace_root: &workspace_root,
            test_file_path: &test_file_path,
            content: &content,
            line,
            character,
            command,
        },
    )?;
    println!("{resolved}");
    Ok(())
}
