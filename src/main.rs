mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let store = commands::open_store(cli.store_dir)?;

    match cli.command {
        Commands::Generate(args) => commands::generate::run_generate(store, args)?,
        Commands::Pubkey(args) => commands::pubkey::run_pubkey(store, args)?,
        Commands::Encrypt(args) => commands::encrypt::run_encrypt(store, args)?,
        Commands::Decrypt(args) => commands::decrypt::run_decrypt(store, args)?,
        Commands::Delete(args) => commands::delete::run_delete(store, args)?,
    }

    Ok(())
}
