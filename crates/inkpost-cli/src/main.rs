use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod app;
mod commands;

#[derive(Parser)]
#[command(name = "inkpost")]
#[command(about = "Inkpost - community blogging from the terminal", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.config/inkpost/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, sign up or sign out
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Read and write blog posts
    Blogs {
        #[command(subcommand)]
        action: BlogAction,
    },
    /// Comment on blog posts
    Comments {
        #[command(subcommand)]
        action: CommentAction,
    },
}

#[derive(Subcommand)]
pub enum AuthAction {
    /// Sign in with e-mail and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Name shown on your posts
        #[arg(long)]
        full_name: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show who is signed in
    Whoami,
}

#[derive(Subcommand)]
pub enum BlogAction {
    /// List blogs, newest first
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Show a blog and its comments
    Show { id: i64 },
    /// Publish a new blog
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// Image file to attach
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Edit one of your blogs
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        /// Replace the image with this file
        #[arg(long, conflicts_with = "remove_image")]
        image: Option<PathBuf>,
        /// Remove the current image
        #[arg(long)]
        remove_image: bool,
    },
    /// Delete one of your blogs
    Delete {
        id: i64,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum CommentAction {
    /// Comment on a blog
    Add {
        blog_id: i64,
        #[arg(long)]
        content: String,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Edit one of your comments
    Edit {
        id: i64,
        /// Blog the comment belongs to
        #[arg(long = "blog")]
        blog_id: i64,
        #[arg(long)]
        content: Option<String>,
        #[arg(long, conflicts_with = "remove_image")]
        image: Option<PathBuf>,
        #[arg(long)]
        remove_image: bool,
    },
    /// Delete one of your comments
    Delete {
        id: i64,
        #[arg(long = "blog")]
        blog_id: i64,
        #[arg(long)]
        yes: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let state = app::AppBootstrap::initialize(cli.config).await?.app_state;

    let result = match cli.command {
        Commands::Auth { action } => commands::auth::run(&state, action).await,
        Commands::Blogs { action } => commands::blogs::run(&state, action).await,
        Commands::Comments { action } => commands::comments::run(&state, action).await,
    };

    state.observer.shutdown();
    result
}
