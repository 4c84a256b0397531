//! `sf-data`: export records as composite tree files and import them back.
//!
//! ```sh
//! export SF_INSTANCE_URL='https://myorg.my.salesforce.com'
//! export SF_ACCESS_TOKEN='00D...'
//! sf-data export --query "SELECT Name, (SELECT LastName FROM Contacts) FROM Account" --plan -d data
//! sf-data import --plan data/Account-Contact-plan.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use busbar_sf_data::client::{RetryConfig, DEFAULT_API_VERSION};
use busbar_sf_data::{
    ClientConfig, ExportConfig, ImportConfig, SalesforceRestClient, TreeContentType, TreeExporter,
    TreeImporter,
};

/// Export and import Salesforce record trees.
#[derive(Parser)]
#[command(name = "sf-data")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Org instance URL.
    #[arg(long, env = "SF_INSTANCE_URL", global = true)]
    instance_url: Option<String>,

    /// OAuth access token.
    #[arg(long, env = "SF_ACCESS_TOKEN", global = true, hide_env_values = true)]
    access_token: Option<String>,

    /// REST API version.
    #[arg(long, env = "SF_API_VERSION", global = true, default_value = DEFAULT_API_VERSION)]
    api_version: String,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, default_value_t = 120)]
    timeout: u64,

    /// Retries for rate-limited or failed requests.
    #[arg(long, global = true, default_value_t = 3)]
    max_retries: u32,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export query results as composite tree files.
    Export {
        /// SOQL query; subqueries become nested child records.
        #[arg(short, long)]
        query: String,

        /// Write one file per object type plus a plan manifest.
        #[arg(short, long)]
        plan: bool,

        /// Prefix for every file name.
        #[arg(short = 'x', long)]
        prefix: Option<String>,

        /// Directory to write files to.
        #[arg(short = 'd', long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Import tree files or a plan.
    Import {
        /// Tree files to import, in order (comma-separated).
        #[arg(short = 'f', long, value_delimiter = ',', conflicts_with = "plan")]
        sobject_tree_files: Option<Vec<PathBuf>>,

        /// Plan manifest written by `export --plan`.
        #[arg(short, long)]
        plan: Option<PathBuf>,

        /// Content type of every file, overriding the file extension.
        #[arg(short, long, value_enum)]
        content_type: Option<ContentType>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ContentType {
    Json,
    Xml,
}

impl From<ContentType> for TreeContentType {
    fn from(value: ContentType) -> Self {
        match value {
            ContentType::Json => TreeContentType::Json,
            ContentType::Xml => TreeContentType::Xml,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn connect(cli: &Cli) -> Result<SalesforceRestClient> {
    let instance_url = cli
        .instance_url
        .as_deref()
        .ok_or_else(|| anyhow!("missing --instance-url (or SF_INSTANCE_URL)"))?;
    let access_token = cli
        .access_token
        .as_deref()
        .ok_or_else(|| anyhow!("missing --access-token (or SF_ACCESS_TOKEN)"))?;

    let config = ClientConfig::builder()
        .with_timeout(Duration::from_secs(cli.timeout))
        .with_retry(RetryConfig::default().with_max_attempts(cli.max_retries))
        .build();

    Ok(
        SalesforceRestClient::with_config(instance_url, access_token, config)?
            .with_api_version(&cli.api_version),
    )
}

async fn run(cli: Cli) -> Result<()> {
    let client = connect(&cli)?;
    let json = cli.json;

    match cli.command {
        Commands::Export {
            query,
            plan,
            prefix,
            output_dir,
        } => {
            let mut config = ExportConfig::new(query)
                .with_plan(plan)
                .with_output_dir(output_dir);
            if let Some(prefix) = prefix {
                config = config.with_prefix(prefix);
            }

            let result = TreeExporter::new(client).export(&config).await?;

            if json {
                let files: Vec<String> = result
                    .files
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                let output = serde_json::json!({
                    "files": files,
                    "records": result.tree.record_count(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else if result.files.is_empty() {
                println!("Query returned no records.");
            } else {
                for path in &result.files {
                    println!("Wrote {}", path.display());
                }
                println!("Exported {} records.", result.tree.record_count());
            }
        }

        Commands::Import {
            sobject_tree_files,
            plan,
            content_type,
        } => {
            let config =
                ImportConfig::from_options(sobject_tree_files, plan, content_type.map(Into::into))?;

            let result = TreeImporter::new(client).import(&config).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{:<24} {:<24} ID", "REFERENCE ID", "TYPE");
                for r in &result.response_refs {
                    let sobject = result
                        .sobject_types
                        .get(&r.reference_id)
                        .map(String::as_str)
                        .unwrap_or("");
                    println!("{:<24} {:<24} {}", r.reference_id, sobject, r.id);
                }
                for warning in &result.errors {
                    eprintln!("Warning: {warning}");
                }
            }
        }
    }

    Ok(())
}
