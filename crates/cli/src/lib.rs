use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use codedesk_chat::{DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT};
use codedesk_protocol::{TreeResponse, ROOT_NOT_FOUND_MESSAGE};
use codedesk_workspace::{LocalWorkspace, ScanOptions, WorkspaceError, DEFAULT_MAX_DEPTH};
use std::io;
use std::path::PathBuf;

mod config;
mod http_api;
mod routes;
mod server_security;

pub use config::AppConfig;
pub use routes::build_router;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "codedesk")]
#[command(about = "Browse, edit and discuss a local code folder over HTTP", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the file API, chat proxy and pages over HTTP
    Serve(ServeArgs),

    /// Print the directory tree of the root as JSON
    Tree(TreeArgs),
}

#[derive(Args)]
struct RootArgs {
    /// Root directory exposed to clients (env: CODEDESK_ROOT, default: current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Maximum number of directory levels listed in the tree
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

#[derive(Args)]
struct ServeArgs {
    #[command(flatten)]
    root: RootArgs,

    /// Bind address, e.g. 127.0.0.1:8000
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: String,

    /// Allow binding to non-loopback addresses
    #[arg(long)]
    public: bool,

    /// Directory holding index.html and explorer.html (env: CODEDESK_PAGES_DIR)
    #[arg(long)]
    pages_dir: Option<PathBuf>,

    /// System instruction file, re-read on every chat request (env: CODEDESK_PROMPT_FILE)
    #[arg(long)]
    prompt_file: Option<PathBuf>,

    /// Gemini model id (env: CODEDESK_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Generative API base URL (env: CODEDESK_API_BASE)
    #[arg(long)]
    api_base: Option<String>,

    /// Timeout for one chat request, in seconds (1-600)
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Sampling temperature sent with every chat request
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f32,
}

#[derive(Args)]
struct TreeArgs {
    #[command(flatten)]
    root: RootArgs,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

pub async fn main_entry() -> Result<()> {
    // `.env` values never override variables already set in the environment.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
    if let Ok(path) = dotenv {
        log::debug!("Loaded environment from {}", path.display());
    }

    match cli.command {
        Commands::Serve(args) => serve_http(args).await?,
        Commands::Tree(args) => run_tree(args).await?,
    }

    Ok(())
}

async fn serve_http(args: ServeArgs) -> Result<()> {
    let addrs = server_security::resolve_guarded_bind_addrs(&args.bind, args.public).await?;
    let config = AppConfig::from_serve_args(&args)?;

    if config.chat.api_key.is_none() {
        log::warn!("No GOOGLE_API_KEY or GEMINI_API_KEY set; /api/chat will return errors");
    }
    if !config.root.is_dir() {
        log::warn!("Root directory {} does not exist", config.root.display());
    }
    let root_display = config.root.display().to_string();
    let app = build_router(config)?;

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    let local_addr = listener.local_addr()?;
    let base_url = format!("http://{local_addr}");

    print_stdout(&format!("Serving {root_display} at {base_url}"))?;
    print_stdout(&format!("File tree: {base_url}/api/local/files"))?;
    if args.public {
        let addrs = addrs
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        print_stdout(&format!(
            "Public bind enabled (--public). Resolved addresses: {addrs}"
        ))?;
    }
    print_stdout(&format!("Try: curl {base_url}/health"))?;

    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_tree(args: TreeArgs) -> Result<()> {
    let root = config::resolve_root(args.root.root)?;
    let scan = ScanOptions {
        max_depth: config::validate_max_depth(args.root.max_depth)?,
    };
    let workspace = LocalWorkspace::new(&root, scan);
    let root_display = workspace.root().display().to_string();

    let scanned = tokio::task::spawn_blocking(move || workspace.tree()).await?;
    let (ok, response) = match scanned {
        Ok(tree) => (true, TreeResponse::ok(tree, root_display)),
        Err(WorkspaceError::RootNotFound) => (false, TreeResponse::failed(ROOT_NOT_FOUND_MESSAGE)),
        Err(err) => (false, TreeResponse::failed(err.to_string())),
    };

    let text = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        codedesk_protocol::serialize_json(&response)?
    };
    print_stdout(&text)?;

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
