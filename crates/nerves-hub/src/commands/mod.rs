//! Command dispatch: bridges CLI args to client calls and output formatting.

pub mod certs;
pub mod devices;
pub mod util;

use clap::CommandFactory;
use clap_complete::generate;

use nerves_hub_api::{ClientConfig, NervesHubClient};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a parsed command.
///
/// Settings are only loaded for commands that talk to NervesHub.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Completions(args) => {
            let mut cli = Cli::command();
            generate(args.shell, &mut cli, "nerves-hub", &mut std::io::stdout());
            Ok(())
        }
        Command::Devices(args) => devices::handle(&connect(global)?, args, global).await,
        Command::Certs(args) => certs::handle(&connect(global)?, args, global).await,
    }
}

/// Build a client from the config file, environment, and CLI overrides.
fn connect(global: &GlobalOpts) -> Result<NervesHubClient, CliError> {
    let client = NervesHubClient::new(client_config(global)?)?;
    tracing::debug!(
        base_url = %client.base_url(),
        org = client.organization(),
        product = client.product(),
        "dispatching command"
    );
    Ok(client)
}

fn client_config(global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let mut settings = nerves_hub_config::load_settings(global.config.as_deref())?;

    if let Some(org) = &global.org {
        settings.org = Some(org.clone());
    }
    if let Some(product) = &global.product {
        settings.product = Some(product.clone());
    }
    if let Some(base_url) = &global.base_url {
        settings.base_url = Some(base_url.clone());
    }

    Ok(settings.into_client_config()?)
}
