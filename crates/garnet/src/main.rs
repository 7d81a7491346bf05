mod cli;
mod commands;
mod output;

use std::process;

use anyhow::Result;

use crate::cli::{Commands, GarnetCli};

fn main() -> Result<()> {
    let cli = GarnetCli::parse_args();

    match cli.command {
        Commands::Check {
            paths,
            threads,
            format,
            config,
            verbose,
        } => {
            logging::init(verbose);
            let clean = commands::check::run(&paths, threads, format, config.as_deref())?;
            if !clean {
                process::exit(1);
            }
            Ok(())
        }
        Commands::DumpAst { file } => commands::dump_ast::run(&file),
        Commands::Analyses => {
            commands::analyses::run();
            Ok(())
        }
    }
}
