use clap::Parser;
use tminus::cli::commands::Cli;
use tminus::cli::handlers;
use tminus::logging;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        // No subcommand → launch TUI
        None => tminus::tui::run(cli.data_dir.as_deref()),
        Some(_) => {
            logging::init_stderr();
            handlers::dispatch(cli)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
