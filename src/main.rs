use anyhow::Result;
use clap::Parser;
use recruit_admin::cli;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_non_tui = !args.is_interactive();

    cli::run(args).await?;
    // Explicitly exit on success in non-TUI modes so no blocking task keeps the process alive
    if is_non_tui {
        std::process::exit(0);
    }
    Ok(())
}
