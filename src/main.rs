use clap::{Parser, Subcommand};
use identity_graph_viz::feed::LogLevel;
use identity_graph_viz::{Result, api, app, config, contact, dashboard, form, graph};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "identity-graph-viz")]
#[command(about = "Identity reconciliation dashboard", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the contact graph from a snapshot file and print it as JSON.
    Derive {
        #[arg(long)]
        contacts: String,
    },

    /// Render a dashboard from a snapshot file.
    Report {
        #[arg(long)]
        contacts: String,

        #[arg(short = 'o', long)]
        out: String,

        /// Print the session log, optionally only one level.
        #[arg(long, value_enum, value_name = "LEVEL", num_args = 0..=1)]
        logs: Option<Option<LogLevel>>,
    },

    /// Fetch the current snapshot from the backend and render a dashboard.
    Fetch {
        #[command(flatten)]
        conn: config::ConnectionArgs,

        #[arg(short = 'o', long)]
        out: String,

        /// Print the session log, optionally only one level.
        #[arg(long, value_enum, value_name = "LEVEL", num_args = 0..=1)]
        logs: Option<Option<LogLevel>>,
    },

    /// Submit an identify probe, then refresh the snapshot.
    Identify {
        #[command(flatten)]
        conn: config::ConnectionArgs,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        /// Also write the refreshed dashboard here.
        #[arg(short = 'o', long)]
        out: Option<String>,

        /// Print the session log, optionally only one level.
        #[arg(long, value_enum, value_name = "LEVEL", num_args = 0..=1)]
        logs: Option<Option<LogLevel>>,
    },

    /// Check backend health.
    Health {
        #[command(flatten)]
        conn: config::ConnectionArgs,
    },

    /// Follow the push channel and keep a dashboard file current.
    Watch {
        #[command(flatten)]
        conn: config::ConnectionArgs,

        #[arg(short = 'o', long)]
        out: String,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_logs(board: &dashboard::Dashboard, logs: Option<Option<LogLevel>>) {
    if let Some(level) = logs {
        print!("{}", app::format_logs(board, level));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.cmd {
        Commands::Derive { contacts } => {
            let snapshot = contact::read_snapshot_file(&contacts)?;
            let graph = graph::derive(&snapshot);
            println!("{}", serde_json::to_string_pretty(&graph)?);
        }
        Commands::Report {
            contacts,
            out,
            logs,
        } => {
            let mut board = dashboard::Dashboard::new();
            board.contacts_loaded(contact::read_snapshot_file(&contacts)?);
            app::write_dashboard(&board, &out)?;
            println!("Wrote {}", out);
            print_logs(&board, logs);
        }
        Commands::Fetch { conn, out, logs } => {
            let config = config::ClientConfig::from(conn);
            let (api, mut timings) = app::api_client_with_timings(&config)?;
            let mut board = dashboard::Dashboard::new();
            app::refresh(&api, &mut board).await;
            app::drain_timings(&mut timings, &mut board);
            app::write_dashboard(&board, &out)?;
            println!("Wrote {}", out);
            print_logs(&board, logs);
        }
        Commands::Identify {
            conn,
            email,
            phone,
            out,
            logs,
        } => {
            let config = config::ClientConfig::from(conn);
            let (api, mut timings) = app::api_client_with_timings(&config)?;
            let mut board = dashboard::Dashboard::new();

            let form = form::IdentifyForm::new(email, phone);
            let result = app::identify(&api, &mut board, &form).await?;
            app::drain_timings(&mut timings, &mut board);
            println!("{}", serde_json::to_string_pretty(&result)?);

            if let Some(out) = out {
                app::write_dashboard(&board, &out)?;
                println!("Wrote {}", out);
            }
            print_logs(&board, logs);
            if !result.success {
                anyhow::bail!(
                    "identify failed: {}",
                    result.error.unwrap_or_else(|| "Unknown error".to_string())
                );
            }
        }
        Commands::Health { conn } => {
            let config = config::ClientConfig::from(conn);
            let api = api::ApiClient::new(&config)?;
            let health = api.health().await?;
            println!("{} ({})", health.status, health.timestamp);
        }
        Commands::Watch { conn, out } => {
            let config = config::ClientConfig::from(conn);
            app::watch(&config, &out).await?;
        }
    }

    Ok(())
}
