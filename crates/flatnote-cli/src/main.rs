use anyhow::{Context, Result, bail};
use flatnote_config::Config;
use flatnote_engine::io::{read_blocks, read_tree};
use flatnote_engine::models::{Block, BlockType};
use flatnote_engine::{ConvertOptions, blocks_to_tree, format_tree, tree_to_blocks};
use std::path::{Path, PathBuf};
use std::{env, process};

const USAGE: &str = "Usage: flatnote-cli <export|import|roundtrip|check> <file> [--outline]";

enum Command {
    /// Block JSON to tree JSON
    Export { outline: bool },
    /// Tree JSON to block JSON
    Import,
    /// Export, import and export again, comparing the two trees
    RoundTrip,
    /// Report stale mentions, stale formatting and other problems in a block file
    Check,
}

fn parse_args(args: &[String]) -> Option<(Command, PathBuf)> {
    let outline = args.iter().any(|a| a == "--outline");
    let positional: Vec<&String> = args.iter().skip(1).filter(|a| !a.starts_with("--")).collect();
    let [command, file] = positional.as_slice() else {
        return None;
    };
    let command = match command.as_str() {
        "export" => Command::Export { outline },
        "import" => Command::Import,
        "roundtrip" => Command::RoundTrip,
        "check" => Command::Check,
        _ => return None,
    };
    Some((command, PathBuf::from(file)))
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let Some((command, file)) = parse_args(&args) else {
        eprintln!("{USAGE}");
        process::exit(1);
    };

    let config_path = Config::config_path();
    let config = match Config::load() {
        Ok(Some(config)) => {
            log::info!("Config loaded from {}", config_path.display());
            config
        }
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };
    let options = config.editor.editor_options().convert;
    let file = config.resolve_document(&file);

    match command {
        Command::Export { outline } => export(&file, outline, &options),
        Command::Import => import(&file, &options),
        Command::RoundTrip => round_trip(&file, &options),
        Command::Check => check(&file),
    }
}

fn export(file: &Path, outline: bool, options: &ConvertOptions) -> Result<()> {
    let blocks = read_blocks(file)?;
    let tree = blocks_to_tree(&blocks, options);
    if outline {
        print!("{}", format_tree(&tree));
    } else {
        println!("{}", tree.to_json_pretty()?);
    }
    Ok(())
}

fn import(file: &Path, options: &ConvertOptions) -> Result<()> {
    let tree = read_tree(file)?;
    let blocks = tree_to_blocks(Some(&tree), options);
    println!("{}", serde_json::to_string_pretty(&blocks)?);
    Ok(())
}

fn round_trip(file: &Path, options: &ConvertOptions) -> Result<()> {
    let blocks = read_blocks(file)?;
    let first = blocks_to_tree(&blocks, options);
    let imported = tree_to_blocks(Some(&first), options);
    let second = blocks_to_tree(&imported, options);

    if first != second {
        println!("--- first export\n{}", format_tree(&first));
        println!("--- second export\n{}", format_tree(&second));
        bail!("{} does not survive a round trip", file.display());
    }
    println!(
        "{}: {} blocks round-trip unchanged ({} after import)",
        file.display(),
        blocks.len(),
        imported.len()
    );
    Ok(())
}

/// Problems found in one stored block
fn block_problems(block: &Block) -> Vec<String> {
    let mut problems = Vec::new();

    let dropped = block.clone().normalize_mentions();
    if dropped > 0 {
        problems.push(format!("{dropped} stale or overlapping mention(s)"));
    }
    let mut formatted = block.clone();
    formatted.normalize_mentions();
    let stale = formatted.normalize_formatting();
    if stale > 0 {
        problems.push(format!("{stale} stale mark, link or emoji range(s)"));
    }
    if !block.block_type.supports_mentions() && !block.mentions.is_empty() {
        problems.push(format!("mentions on a {} block are ignored", block.block_type));
    }
    if block.block_type == BlockType::Table && block.table.is_none() && !block.content.is_empty() {
        problems.push("table stored in the legacy string shape".to_string());
    }
    if block.checked.is_some() && block.block_type != BlockType::Todo {
        problems.push("checked set on a non-todo block".to_string());
    }
    problems
}

fn check(file: &Path) -> Result<()> {
    let blocks =
        read_blocks(file).with_context(|| format!("Failed to check {}", file.display()))?;

    let mut count = 0;
    for (index, block) in blocks.iter().enumerate() {
        for problem in block_problems(block) {
            println!("block {index} ({}): {problem}", block.id);
            count += 1;
        }
    }

    if count > 0 {
        bail!("{count} problem(s) in {}", file.display());
    }
    println!("{}: {} blocks, no problems", file.display(), blocks.len());
    Ok(())
}
