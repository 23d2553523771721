// ethos - search, pick, listen. All from one input line.

use anyhow::Result;
use clap::Parser;
use ethos::{ui::App, Config, Library};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ethos")]
#[command(about = "A terminal music player: search the catalog, pick a number, stream the audio")]
struct Args {
    /// Keep stderr attached (debugging)
    #[arg(long)]
    dev: bool,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding playlists/ and recents.json
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn init_logging(dev: bool) -> Result<WorkerGuard> {
    let log_dir = PathBuf::from("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "ethos.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,ethos=debug"));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if dev {
        eprintln!("🔧 Dev mode: stderr stays attached, logs in logs/ethos.log");
    }
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Credentials may live in a .env next to the binary
    dotenvy::dotenv().ok();

    let _log_guard = init_logging(args.dev)?;
    info!("🎵 ethos starting up");

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(data_dir) = args.data_dir {
        config.library.data_dir = data_dir;
    }

    println!("🎵 ethos - music-cli for cool folks");
    println!("===================================");
    if !config.spotify.has_credentials() {
        warn!("No Spotify credentials configured");
        println!("⚠️  SPOTIFY_CLIENT_ID / SPOTIFY_CLIENT_SECRET not set, search will be empty");
    }
    println!("📁 Loading library from {}", config.library.data_dir.display());
    let library = Library::load(&config.library.playlists_dir(), &config.library.recents_path());

    // ALSA writes straight to stderr and would tear the TUI apart
    if !args.dev {
        debug!("Redirecting stderr to suppress ALSA errors");
        if let Err(e) = redirect_stderr_to_null() {
            warn!("Could not redirect stderr: {}", e);
        }
    }

    // stderr may be gone by now, so say it on stdout too
    let mut app = match App::new(&config, &library) {
        Ok(app) => app,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            println!("❌ {:#}", e);
            return Err(e);
        }
    };
    app.run().await?;

    info!("👋 ethos shut down cleanly");
    Ok(())
}

#[cfg(unix)]
fn redirect_stderr_to_null() -> Result<()> {
    // SAFETY: plain fd juggling on our own process; every fd opened here is closed or installed.
    unsafe {
        let null_fd = libc::open(b"/dev/null\0".as_ptr() as *const libc::c_char, libc::O_WRONLY);
        if null_fd == -1 {
            return Err(anyhow::anyhow!("Failed to open /dev/null"));
        }

        if libc::dup2(null_fd, libc::STDERR_FILENO) == -1 {
            libc::close(null_fd);
            return Err(anyhow::anyhow!("Failed to redirect stderr"));
        }

        libc::close(null_fd);
    }
    Ok(())
}

#[cfg(not(unix))]
fn redirect_stderr_to_null() -> Result<()> {
    Ok(())
}
