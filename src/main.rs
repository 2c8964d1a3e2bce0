//! Entry point: loads a manager from a dependency file and redirects lines
//! from standard input to its command queue. EOF on stdin is equivalent to
//! sending `EXIT`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use servisor::{Config, LogWriter, Manager};

#[derive(Parser)]
#[command(name = "servisor", version)]
#[command(about = "Dependency-aware service supervisor")]
struct Cli {
    /// Path to the dependency file (one service per line: "<id> [<dep-id> ...]")
    #[arg(default_value = "services.txt")]
    file: PathBuf,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let manager = Arc::new(
        Manager::load(&cli.file, Config::default(), vec![Arc::new(LogWriter) as _])
            .with_context(|| format!("loading {}", cli.file.display()))?,
    );

    let queue = manager.queue();
    let dispatcher = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.run().await }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let is_exit = line.trim() == "EXIT";
                if queue.push(line).await.is_err() || is_exit {
                    break;
                }
            }
            Ok(None) | Err(_) => {
                let _ = queue.push("EXIT").await;
                break;
            }
        }
    }

    dispatcher.await??;
    Ok(())
}
