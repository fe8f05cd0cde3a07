use ecocount::commands::command_argument_builder;
use ecocount::handlers::{banner_to_stderr, handle_fetch, handle_info, print_banner};

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner(banner_to_stderr(&chosen_command));
    }

    match chosen_command.subcommand() {
        Some(("fetch", primary_command)) => handle_fetch(primary_command, quiet).await,
        Some(("info", primary_command)) => handle_info(primary_command).await,
        None => {
            // No subcommand provided, just show the banner
        }
        _ => unreachable!("clap should ensure we don't get here"),
    }
}
