use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use duet_studio::audio::{CapturePipeline, FRAME_SAMPLES};
use duet_studio::config::CAPTURE_SAMPLE_RATE;
use duet_studio::podcast::{self, Language};
use duet_studio::{Config, GeminiClient, LiveSession, SessionEvent, Speaker};

/// Duet - two-speaker podcast generation and live voice conversation
#[derive(Parser)]
#[command(name = "duet", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a two-speaker podcast from a lecture transcript
    Podcast {
        /// Path to the transcript text file
        transcript: PathBuf,

        /// Podcast language
        #[arg(short, long, default_value = "english")]
        language: Language,

        /// Where to write the WAV file
        #[arg(short, long, default_value = "podcast.wav")]
        output: PathBuf,
    },
    /// Hold a real-time voice conversation with the model
    Live,
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,duet_studio=info",
        1 => "info,duet_studio=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Podcast {
            transcript,
            language,
            output,
        } => {
            let config = Config::load()?;
            let client = GeminiClient::new(config.api_key.clone())?;
            let text = std::fs::read_to_string(&transcript)?;

            let (script, artifact) = podcast::generate(&client, &config, &text, language).await?;

            println!("# {}", script.title);
            for line in &script.script {
                println!("{}: {}", line.speaker, line.line);
            }

            std::fs::write(&output, &artifact.bytes)?;
            println!(
                "\nwrote {} ({} bytes, {})",
                output.display(),
                artifact.bytes.len(),
                artifact.content_type
            );
        }

        Command::Live => {
            let config = Config::load()?;
            let client = GeminiClient::new(config.api_key.clone())?;

            let (event_tx, mut event_rx) = mpsc::unbounded_channel();
            let printer = tokio::spawn(async move {
                while let Some(event) = event_rx.recv().await {
                    match event {
                        SessionEvent::Connected => println!("listening... (Ctrl-C to stop)"),
                        SessionEvent::Entry(entry) => {
                            let tag = match entry.speaker {
                                Speaker::User => "you",
                                Speaker::Model => "model",
                            };
                            println!("{tag}: {}", entry.text);
                        }
                        SessionEvent::Error(e) => {
                            eprintln!("session error: {e}");
                        }
                        SessionEvent::Closed => println!("session closed"),
                    }
                }
            });

            let mut session = LiveSession::new(event_tx);
            session.start(&client, &config.live_model).await?;
            println!("connecting...");

            let outcome = tokio::select! {
                result = session.run() => Some(result),
                _ = tokio::signal::ctrl_c() => None,
            };
            match outcome {
                Some(result) => result?,
                None => {
                    println!();
                    session.stop().await;
                }
            }

            drop(session);
            printer.await.ok();
        }

        Command::TestMic { duration } => {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let mut capture = CapturePipeline::new()?;
            capture.start(tx)?;
            println!("capturing for {duration}s...");

            let deadline = tokio::time::sleep(Duration::from_secs(duration));
            tokio::pin!(deadline);

            let mut frames = 0usize;
            loop {
                tokio::select! {
                    _ = &mut deadline => break,
                    frame = rx.recv() => {
                        if frame.is_some() {
                            frames += 1;
                        }
                    }
                }
            }
            capture.stop();

            #[allow(clippy::cast_precision_loss)]
            let seconds = (frames * FRAME_SAMPLES) as f64 / f64::from(CAPTURE_SAMPLE_RATE);
            println!("captured {frames} frames (~{seconds:.1}s of audio)");
        }
    }

    Ok(())
}
