use clap::Parser;
use ethos::audio::{AudioPlayer, AudioResolve, PlaybackSession, YtDlpResolver};
use ethos::config::Config;
use std::time::Duration;
use tokio::time::sleep;

/// Resolve one query and put the real audio device through its paces.
#[derive(Parser)]
#[command(name = "stream_check")]
struct Args {
    /// Track description, e.g. "After Hours by The Weeknd"
    #[arg(default_value = "After Hours by The Weeknd")]
    query: String,

    /// Seconds to play before pausing
    #[arg(long, default_value_t = 10)]
    seconds: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("🎵 ethos stream check");
    println!("=====================");

    let config = Config::load(None)?;
    let timeout = config.network.timeout();

    println!("🔍 Resolving '{}'...", args.query);
    let resolver = YtDlpResolver::new(&config.tools.yt_dlp, timeout);
    let url = match resolver.resolve(&args.query).await {
        Ok(url) => url,
        Err(e) => {
            println!("❌ {}", e);
            return Ok(());
        }
    };
    println!("   Stream: {}...", url.chars().take(60).collect::<String>());

    let engine = AudioPlayer::new(
        config.audio.initial_volume,
        Duration::from_millis(config.audio.fade_in_ms),
        timeout,
    )?;
    let mut session =
        PlaybackSession::new(engine, config.audio.initial_volume, config.audio.volume_step);

    println!("\n▶️  Starting playback...");
    session.play(&url, &args.query).await?;

    println!("🎶 Playing for {} seconds...", args.seconds);
    sleep(Duration::from_secs(args.seconds)).await;

    println!("⏸️  Pausing...");
    session.pause();
    sleep(Duration::from_secs(2)).await;

    println!("▶️  Resuming...");
    session.resume();
    sleep(Duration::from_secs(5)).await;

    println!("🔊 Testing volume control...");
    for level in [30, 80] {
        let applied = session.set_volume(level);
        println!("   Volume set to {}%", applied);
        sleep(Duration::from_secs(3)).await;
    }

    println!("⏹️  Stopping playback...");
    session.stop();

    println!("✅ Stream check completed: {:?}", session.state());
    Ok(())
}
