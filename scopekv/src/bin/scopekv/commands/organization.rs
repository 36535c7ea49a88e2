use anyhow::Result;
use clap::Subcommand;
use scopekv::{Organization, Store, TenancyContext};

use crate::commands::report;
use crate::context::CliBackend;
use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Manage Organizations",
        commands: &[
            "scopekv organization create acme --description \"Acme Corp\"",
            "scopekv organization list --output json",
            "scopekv organization delete acme",
        ],
    },
];

#[derive(Subcommand)]
pub enum OrganizationCommands {
    /// Create a new organization
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Create or replace an organization
    Update {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Delete an organization (resources beneath it are left in place)
    Delete { name: String },

    /// List all organizations
    List,
}

impl TableDisplay for Organization {
    const HEADERS: &'static [&'static str] = &["Name", "Description"];

    fn cells(&self) -> Vec<String> {
        vec![self.name.clone(), self.description.clone()]
    }

    fn to_compact(&self) -> String {
        self.name.clone()
    }
}

pub async fn handle_organization_commands(
    command: OrganizationCommands,
    store: &Store<CliBackend>,
    output: &OutputManager,
) -> Result<()> {
    let organizations = store.kind::<Organization>();

    match command {
        OrganizationCommands::Create { name, description } => {
            let organization = Organization::new(&name).with_description(description);
            organizations.create(&organization).await.map_err(|err| report(output, err))?;
            output.success(&format!("Created organization '{name}'"));
        }
        OrganizationCommands::Update { name, description } => {
            let organization = Organization::new(&name).with_description(description);
            organizations.update(&organization).await.map_err(|err| report(output, err))?;
            output.success(&format!("Updated organization '{name}'"));
        }
        OrganizationCommands::Delete { name } => {
            organizations
                .delete(&TenancyContext::default(), &name)
                .await
                .map_err(|err| report(output, err))?;
            output.success(&format!("Deleted organization '{name}'"));
            output.warning("Environments under it are kept; updating them fails until the organization is recreated.");
        }
        OrganizationCommands::List => {
            let all = organizations.list_all().await.map_err(|err| report(output, err))?;
            output.display_list(&all)?;
        }
    }

    Ok(())
}
