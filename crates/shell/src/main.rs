//! retrodesk CLI
//!
//! Pokes the desktop core from a terminal: filesystem commands against the
//! persisted tree and AI commands against the configured provider.
//!
//! Usage:
//!   retrodesk ls [path]        List a folder
//!   retrodesk summarize <path> Summarize a document
//!   retrodesk --help           Show help

use anyhow::Result;
use retrodesk_ai::CancellationToken;
use retrodesk_shell::{Config, Shell};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured logging (tracing)
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    match args[1].as_str() {
        "--version" | "-v" => {
            println!("retrodesk {VERSION}");
            Ok(())
        }
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        command => {
            Config::create_default_if_missing();
            let config = Config::load();
            let shell = Shell::init(&config)?;
            run_command(&shell, command, &args[2..]).await
        }
    }
}

fn print_usage() {
    println!("retrodesk - Windows 95 flavored desktop core");
    println!();
    println!("USAGE:");
    println!("    retrodesk <COMMAND> [ARGS]");
    println!();
    println!("FILESYSTEM COMMANDS:");
    println!("    ls [PATH]                List a folder (default: /)");
    println!("    cat PATH                 Print a file");
    println!("    write PATH CONTENT       Create or overwrite a file");
    println!("    mkdir PATH               Create a folder");
    println!("    rm PATH                  Delete a file or folder");
    println!("    mv SOURCE DEST_FOLDER    Move an item under another folder");
    println!("    rename PATH NEW_NAME     Rename an item in place");
    println!("    stat PATH                Show item metadata");
    println!();
    println!("AI COMMANDS (Ctrl+C cancels):");
    println!("    summarize PATH           Summarize a document");
    println!("    rewrite PATH [STYLE]     Rewrite a document (formal, casual, ...)");
    println!("    ask QUERY...             Interpret a natural-language command");
    println!("    explain [PATH]           Explain a folder's contents");
    println!("    usage                    Show AI usage statistics");
    println!();
    println!("GLOBAL OPTIONS:");
    println!("    -h, --help               Print help information");
    println!("    -v, --version            Print version");
    println!();
    println!("CONFIG:");
    println!("    ~/.config/retrodesk/config.toml");
}

async fn run_command(shell: &Shell, command: &str, args: &[String]) -> Result<()> {
    match command {
        "ls" => {
            let path = args.first().map_or("/", String::as_str);
            for entry in shell.vfs().read_folder(path)? {
                println!("{:<10} {:>8}  {}", format!("[{}]", entry.icon), entry.size, entry.name);
            }
        }
        "cat" => {
            let path = required(args, 0, "cat PATH")?;
            print!("{}", shell.vfs().read_file(path)?);
        }
        "write" => {
            let path = required(args, 0, "write PATH CONTENT")?;
            let content = required(args, 1, "write PATH CONTENT")?;
            shell.vfs().write_file(path, content)?;
            println!("wrote {path}");
        }
        "mkdir" => {
            let path = required(args, 0, "mkdir PATH")?;
            shell.vfs().create_folder(path)?;
            println!("created {path}");
        }
        "rm" => {
            let path = required(args, 0, "rm PATH")?;
            shell.vfs().delete_item(path)?;
            println!("deleted {path}");
        }
        "mv" => {
            let source = required(args, 0, "mv SOURCE DEST_FOLDER")?;
            let dest = required(args, 1, "mv SOURCE DEST_FOLDER")?;
            shell.vfs().move_item(source, dest)?;
            println!("moved {source} into {dest}");
        }
        "rename" => {
            let path = required(args, 0, "rename PATH NEW_NAME")?;
            let new_name = required(args, 1, "rename PATH NEW_NAME")?;
            shell.vfs().rename_item(path, new_name)?;
            println!("renamed {path} to {new_name}");
        }
        "stat" => {
            let path = required(args, 0, "stat PATH")?;
            let meta = shell.vfs().metadata(path)?;
            println!("name:     {}", meta.name);
            println!("path:     {}", meta.path);
            println!("kind:     {:?}", meta.kind);
            println!("size:     {}", meta.size);
            println!("created:  {}", meta.created_at.to_rfc3339());
            println!("modified: {}", meta.modified_at.to_rfc3339());
        }
        "summarize" => {
            let path = required(args, 0, "summarize PATH")?;
            let content = shell.vfs().read_file(path)?;
            let cancel = cancel_on_ctrl_c();
            println!("{}", shell.ai().summarize(&content, &cancel).await?);
        }
        "rewrite" => {
            let path = required(args, 0, "rewrite PATH [STYLE]")?;
            let style = args.get(1).map(String::as_str);
            let content = shell.vfs().read_file(path)?;
            let cancel = cancel_on_ctrl_c();
            println!("{}", shell.ai().rewrite(&content, style, &cancel).await?);
        }
        "ask" => {
            if args.is_empty() {
                anyhow::bail!("usage: retrodesk ask QUERY...");
            }
            let query = args.join(" ");
            let cancel = cancel_on_ctrl_c();
            let intent = shell.ai().interpret(&query, &cancel).await?;
            println!("action:     {}", intent.action);
            println!("confidence: {:.2}", intent.confidence);
            for (key, value) in &intent.parameters {
                println!("{key}: {value}");
            }
        }
        "explain" => {
            let path = args.first().map_or("/", String::as_str);
            let snapshot = shell.snapshot_folder(path)?;
            let cancel = cancel_on_ctrl_c();
            let explanation = shell.ai().explain_folder(&snapshot, &cancel).await?;
            println!("{}", explanation.description);
            for recommendation in &explanation.recommendations {
                println!("  - {recommendation}");
            }
        }
        "usage" => match shell.ai().usage_stats() {
            Some(stats) => {
                println!("operations: {}", stats.total_operations);
                println!("tokens:     {}", stats.total_tokens);
                for (operation, count) in &stats.operations_by_type {
                    println!("  {operation}: {count}");
                }
                println!("updated:    {}", stats.last_updated.to_rfc3339());
            }
            None => println!("usage tracking is disabled"),
        },
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
        }
    }
    Ok(())
}

/// Fetch a required positional argument or fail with a usage line.
fn required<'a>(args: &'a [String], index: usize, usage: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("usage: retrodesk {usage}"))
}

/// A token that cancels when the user hits Ctrl+C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let handle = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });
    token
}
