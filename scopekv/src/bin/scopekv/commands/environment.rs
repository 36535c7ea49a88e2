use anyhow::Result;
use clap::Subcommand;
use scopekv::{Environment, Store, TenancyContext};

use crate::commands::report;
use crate::context::CliBackend;
use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Manage Environments",
        commands: &[
            "scopekv environment create prod --org acme",
            "scopekv environment list --org acme",
            "scopekv environment delete staging --org acme",
        ],
    },
];

#[derive(Subcommand)]
pub enum EnvironmentCommands {
    /// Create an environment inside an existing organization
    Create {
        name: String,
        #[arg(long)]
        org: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Create or replace an environment
    Update {
        name: String,
        #[arg(long)]
        org: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Delete an environment; later writes beneath it are rejected
    Delete {
        name: String,
        #[arg(long)]
        org: String,
    },

    /// List environments of an organization
    List {
        #[arg(long)]
        org: String,
    },
}

impl TableDisplay for Environment {
    const HEADERS: &'static [&'static str] = &["Organization", "Name", "Description"];

    fn cells(&self) -> Vec<String> {
        vec![self.organization.clone(), self.name.clone(), self.description.clone()]
    }

    fn to_compact(&self) -> String {
        format!("{}/{}", self.organization, self.name)
    }
}

pub async fn handle_environment_commands(
    command: EnvironmentCommands,
    store: &Store<CliBackend>,
    output: &OutputManager,
) -> Result<()> {
    let environments = store.kind::<Environment>();

    match command {
        EnvironmentCommands::Create { name, org, description } => {
            let environment = Environment::new(&org, &name).with_description(description);
            environments.create(&environment).await.map_err(|err| report(output, err))?;
            output.success(&format!("Created environment '{org}/{name}'"));
        }
        EnvironmentCommands::Update { name, org, description } => {
            let environment = Environment::new(&org, &name).with_description(description);
            environments.update(&environment).await.map_err(|err| report(output, err))?;
            output.success(&format!("Updated environment '{org}/{name}'"));
        }
        EnvironmentCommands::Delete { name, org } => {
            environments
                .delete(&TenancyContext::organization(&org), &name)
                .await
                .map_err(|err| report(output, err))?;
            output.success(&format!("Deleted environment '{org}/{name}'"));
        }
        EnvironmentCommands::List { org } => {
            let listed = environments
                .list(&TenancyContext::organization(&org))
                .await
                .map_err(|err| report(output, err))?;
            output.display_list(&listed)?;
        }
    }

    Ok(())
}
