use clap::Parser;
use miette::Result;
use tilex::cli::{Cli, Commands};
use tilex::output::Printer;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tilex::logging::init(cli.verbose);
    let printer = Printer::new(cli.verbose);

    match cli.command {
        Commands::Slice(args) => {
            tilex::cli::slice::run(args, &printer)?;
        }
        Commands::Analyze(args) => {
            tilex::cli::analyze::run(args, &printer).await?;
        }
        Commands::Compare(args) => {
            tilex::cli::compare::run(args, &printer)?;
        }
        Commands::Serve(args) => tilex::cli::serve::run(args, &printer).await?,
        Commands::Init(args) => {
            tilex::cli::init::run(args, &printer)?;
        }
        Commands::Completions(args) => tilex::cli::completions::run(args)?,
    }

    Ok(())
}
