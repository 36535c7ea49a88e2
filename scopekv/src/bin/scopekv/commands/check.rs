use anyhow::Result;
use clap::{Args, Subcommand};
use scopekv::{CheckConfig, Store, TenancyContext};

use crate::commands::report;
use crate::context::CliBackend;
use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Define Checks",
        commands: &[
            "scopekv check create disk-check --org acme --env prod --command \"check-disk -w 80\" --interval 60",
            "scopekv check update disk-check --org acme --env prod --command \"check-disk -w 90\" --interval 30 --subscriptions linux,db",
        ],
    },
    ExampleGroup {
        title: "Inspect Checks",
        commands: &[
            "scopekv check get disk-check --org acme --env prod",
            "scopekv check list --org acme --env prod --output compact",
        ],
    },
];

#[derive(Args, Clone)]
pub struct ScopeArgs {
    /// Owning organization
    #[arg(long)]
    pub org: String,
    /// Owning environment
    #[arg(long)]
    pub env: String,
}

impl ScopeArgs {
    fn context(&self) -> TenancyContext {
        TenancyContext::new(&self.org, &self.env)
    }
}

#[derive(Args)]
pub struct CheckArgs {
    pub name: String,
    #[command(flatten)]
    pub scope: ScopeArgs,
    /// Command executed by subscribed agents
    #[arg(long)]
    pub command: String,
    /// Seconds between executions
    #[arg(long)]
    pub interval: u32,
    #[arg(long, value_delimiter = ',')]
    pub subscriptions: Vec<String>,
    #[arg(long, value_delimiter = ',')]
    pub handlers: Vec<String>,
    #[arg(long, value_delimiter = ',')]
    pub runtime_assets: Vec<String>,
    /// Seconds before an execution is killed (0 disables)
    #[arg(long, default_value_t = 0)]
    pub timeout: u32,
    /// Schedule the check without publishing requests
    #[arg(long)]
    pub unpublished: bool,
    #[arg(long)]
    pub stdin: bool,
    #[arg(long, requires = "low_flap_threshold")]
    pub high_flap_threshold: Option<u32>,
    #[arg(long, requires = "high_flap_threshold")]
    pub low_flap_threshold: Option<u32>,
}

impl From<CheckArgs> for CheckConfig {
    fn from(args: CheckArgs) -> Self {
        let mut check = CheckConfig::new(args.scope.org, args.scope.env, args.name, args.command, args.interval)
            .with_subscriptions(args.subscriptions)
            .with_handlers(args.handlers);
        check.runtime_assets = args.runtime_assets;
        check.timeout = args.timeout;
        check.publish = !args.unpublished;
        check.stdin = args.stdin;
        check.high_flap_threshold = args.high_flap_threshold;
        check.low_flap_threshold = args.low_flap_threshold;
        check
    }
}

#[derive(Subcommand)]
pub enum CheckCommands {
    /// Create a check inside an existing environment
    Create(CheckArgs),

    /// Create or replace a check
    Update(CheckArgs),

    /// Delete a check
    Delete {
        name: String,
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Show a single check
    Get {
        name: String,
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// List checks of an environment
    List {
        #[command(flatten)]
        scope: ScopeArgs,
    },
}

impl TableDisplay for CheckConfig {
    const HEADERS: &'static [&'static str] = &["Name", "Command", "Interval", "Subscriptions", "Handlers", "Publish"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.command.clone(),
            format!("{}s", self.interval),
            self.subscriptions.join(","),
            self.handlers.join(","),
            self.publish.to_string(),
        ]
    }

    fn to_compact(&self) -> String {
        format!("{} every {}s: {}", self.name, self.interval, self.command)
    }
}

pub async fn handle_check_commands(
    command: CheckCommands,
    store: &Store<CliBackend>,
    output: &OutputManager,
) -> Result<()> {
    let checks = store.kind::<CheckConfig>();

    match command {
        CheckCommands::Create(args) => {
            let check = CheckConfig::from(args);
            checks.create(&check).await.map_err(|err| report(output, err))?;
            output.success(&format!("Created check '{}'", check.name));
        }
        CheckCommands::Update(args) => {
            let check = CheckConfig::from(args);
            checks.update(&check).await.map_err(|err| report(output, err))?;
            output.success(&format!("Updated check '{}'", check.name));
        }
        CheckCommands::Delete { name, scope } => {
            checks
                .delete(&scope.context(), &name)
                .await
                .map_err(|err| report(output, err))?;
            output.success(&format!("Deleted check '{name}'"));
        }
        CheckCommands::Get { name, scope } => {
            match checks.get_by_name(&scope.context(), &name).await.map_err(|err| report(output, err))? {
                Some(check) => output.display_one(&check)?,
                None => anyhow::bail!("check '{name}' not found in {}", scope.context()),
            }
        }
        CheckCommands::List { scope } => {
            let listed = checks.list(&scope.context()).await.map_err(|err| report(output, err))?;
            output.display_list(&listed)?;
        }
    }

    Ok(())
}
