use clap::{Parser, Subcommand};
use nautil_admin::api::{run_api_server, ApiConfig, AppState};
use nautil_admin::cli;
use nautil_admin::config::AdminConfig;
use nautil_admin::mail::{EmailRequest, SmtpMailer};
use nautil_admin::pipeline::Step;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "nautil-admin")]
#[command(about = "Daily NAUTIL verification workbook maintenance")]
#[command(long_about = "NAUTIL Admin - daily verification workbook maintenance

PIPELINE:
  1. rename           - Stamp today's date into the verification file name
  2. vue-globale      - Append a date row to the global view sheet
  3. clear-tx         - Blank B4:G on TX1, TX2, TX3
  4. clear-after-tx3  - Empty every sheet after TX3
  5. clear-template   - Blank A4:F on the template's first sheet

Steps 2 and 3 stop the run when they fail; the others only warn.

EXAMPLES:
  nautil-admin serve --port 8080
  nautil-admin run-all
  nautil-admin step clear-tx
  nautil-admin run-complete --email-to team@example.com")]
#[command(version)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, global = true, default_value = "nautil.yaml", env = "NAUTIL_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP control surface
    Serve {
        /// Host address to bind to (use 0.0.0.0 for all interfaces)
        #[arg(short = 'H', long, default_value = "127.0.0.1", env = "NAUTIL_HOST")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8080", env = "NAUTIL_PORT")]
        port: u16,
    },

    /// Run the five pipeline steps in order
    RunAll,

    /// Run a single pipeline step
    Step {
        #[arg(value_enum)]
        step: Step,
    },

    /// Email the verification file
    SendEmail {
        /// Recipient (defaults to email.default_to)
        #[arg(long)]
        to: Option<String>,

        /// Subject (defaults to "Daily Verification NAUTIL - <date>")
        #[arg(long)]
        subject: Option<String>,

        /// HTML body (defaults to the built-in template)
        #[arg(long)]
        body: Option<String>,
    },

    /// Run the pipeline, then email the file if it succeeded
    RunComplete {
        #[arg(long)]
        email_to: Option<String>,

        #[arg(long)]
        email_subject: Option<String>,
    },

    /// Print the loaded configuration
    ShowConfig,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nautil_admin=info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let success = match cli.command {
        Commands::Serve { host, port } => {
            let config = AdminConfig::load(&cli.config)?;
            let mailer = Arc::new(SmtpMailer::new(&config.smtp)?);
            let state = Arc::new(AppState::new(config, mailer));
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_api_server(ApiConfig { host, port }, state))?;
            true
        }
        Commands::RunAll => cli::run_all(&cli.config)?,
        Commands::Step { step } => cli::step(&cli.config, step)?,
        Commands::SendEmail { to, subject, body } => cli::send_email(
            &cli.config,
            EmailRequest {
                to,
                from: None,
                subject,
                body,
            },
        )?,
        Commands::RunComplete {
            email_to,
            email_subject,
        } => cli::run_complete(&cli.config, email_to, email_subject)?,
        Commands::ShowConfig => {
            cli::show_config(&cli.config)?;
            true
        }
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}
