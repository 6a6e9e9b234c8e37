mod output;
mod request;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use everoute_cloudtower::EverouteProvider;
use everoute_config::ProviderSettings;
use everoute_provider::{Kind, OperationKind, Registry, ResourceResponse};
use request::RequestDocument;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "everoute")]
#[command(about = "Manage Everoute services on Cloudtower", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    provider: ProviderArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Provider settings. Flags win over the request's `provider` block,
/// which wins over the CLOUDTOWER_* environment variables.
#[derive(clap::Args)]
struct ProviderArgs {
    /// Cloudtower user name
    #[arg(long, global = true)]
    username: Option<String>,
    /// Cloudtower password
    #[arg(long, global = true)]
    password: Option<String>,
    /// Cloudtower server address, optionally with an http(s):// scheme
    #[arg(long, global = true)]
    cloudtower_server: Option<String>,
    /// Pre-issued Cloudtower token, skips the login
    #[arg(long, global = true)]
    token: Option<String>,
}

impl From<ProviderArgs> for ProviderSettings {
    fn from(args: ProviderArgs) -> Self {
        Self {
            username: args.username,
            password: args.password,
            cloudtower_server: args.cloudtower_server,
            token: args.token,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List resource and data source types
    Kinds,
    /// Run a resource lifecycle operation
    Resource {
        /// Type name, e.g. everoute_service
        type_name: String,
        /// Operation, overrides the request's `operation` field
        #[arg(short, long)]
        operation: Option<OperationKind>,
        /// Id to adopt, overrides the request's `import_id` field
        #[arg(long)]
        import_id: Option<String>,
        /// Request document (JSON). Reads stdin when omitted or `-`
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Read a data source
    DataSource {
        /// Type name, e.g. everoute_package
        type_name: String,
        /// Request document (JSON). Reads stdin when omitted or `-`
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Validate a configuration without contacting Cloudtower
    Validate {
        /// Type name, e.g. everoute_service
        type_name: String,
        /// Validate against the data source of that name
        #[arg(long)]
        data_source: bool,
        /// Request document (JSON). Reads stdin when omitted or `-`
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // stdout carries the JSON response, logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let provider = EverouteProvider::new(env!("CARGO_PKG_VERSION"));
    let flags = ProviderSettings::from(cli.provider);

    match cli.command {
        Commands::Version => {
            println!("everoute {}", provider.version());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Kinds => {
            output::print_kinds(&provider.detached_registry().entries());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate {
            type_name,
            data_source,
            input,
        } => {
            let doc = RequestDocument::load(input.as_deref())?;
            let kind = if data_source {
                Kind::DataSource
            } else {
                Kind::Resource
            };
            let diagnostics = provider
                .detached_registry()
                .validate(kind, &type_name, doc.config())?;
            output::print_diagnostics(&diagnostics);
            if diagnostics.has_error() {
                return Ok(ExitCode::FAILURE);
            }
            println!("{} {} {}", "✓".green(), type_name, "configuration is valid".green());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Resource {
            type_name,
            operation,
            import_id,
            input,
        } => {
            let mut doc = RequestDocument::load(input.as_deref())?;
            if operation.is_some() {
                doc.request.operation = operation;
            }
            if import_id.is_some() {
                doc.request.import_id = import_id;
            }
            let registry = match configure(&provider, flags, &doc).await? {
                Ok(registry) => registry,
                Err(code) => return Ok(code),
            };
            let response = registry
                .handle_resource(&type_name, doc.request)
                .await
                .with_context(|| format!("{type_name} request failed"))?;
            finish(&response)
        }
        Commands::DataSource { type_name, input } => {
            let doc = RequestDocument::load(input.as_deref())?;
            let registry = match configure(&provider, flags, &doc).await? {
                Ok(registry) => registry,
                Err(code) => return Ok(code),
            };
            let response = registry
                .read_data_source(&type_name, doc.config())
                .await
                .with_context(|| format!("{type_name} request failed"))?;
            finish(&response)
        }
    }
}

/// Connect with the merged settings. Configuration problems are printed as a
/// failed response.
async fn configure(
    provider: &EverouteProvider,
    flags: ProviderSettings,
    doc: &RequestDocument,
) -> anyhow::Result<Result<Registry, ExitCode>> {
    let settings = flags.or(doc.provider.clone());
    tracing::debug!(
        "Configuring provider (server from {})",
        if settings.cloudtower_server.is_some() {
            "settings"
        } else {
            "environment"
        }
    );
    match provider.configure(&settings).await {
        Ok(registry) => Ok(Ok(registry)),
        Err(diagnostics) => {
            let response = ResourceResponse {
                state: None,
                diagnostics,
            };
            Ok(Err(finish(&response)?))
        }
    }
}

fn finish(response: &ResourceResponse) -> anyhow::Result<ExitCode> {
    output::print_response(response)?;
    if response.diagnostics.has_error() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
