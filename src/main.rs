use std::{path::PathBuf, sync::mpsc, thread, time::Duration};

use clap::{Parser, Subcommand, ValueEnum};
use compact_str::CompactString;
use tracing::{info, warn};
use twine::{
    app_init::{AppComponents, initialize_app},
    client::{FilterParametersBuilder, Service, StreamRequest},
    config::{TwineConfig, default_config_path, load_config, save_config},
    event::{Timeline, TwineEvent},
    id::UserId,
    result::TwineError,
};

#[derive(Parser)]
#[command(version, about = "Read and post to Twitter or Yammer from the terminal")]
struct Cli {
    /// Config file, defaults to twine.toml in the user config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose output and raw response dumps
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show a timeline
    Timeline {
        #[arg(value_enum, default_value_t = TimelineKind::Home)]
        kind: TimelineKind,
        /// Screen name for the user timeline
        name: Option<String>,
        #[arg(long)]
        count: Option<u32>,
    },
    Search {
        query: String,
    },
    /// Post a status
    Post {
        text: String,
    },
    /// Print statuses from the Streaming API until interrupted
    Stream {
        #[arg(value_enum, default_value_t = StreamKind::Sample)]
        kind: StreamKind,
        /// Keywords for the filter stream
        #[arg(long, value_delimiter = ',')]
        track: Vec<String>,
        /// User ids for the filter stream
        #[arg(long, value_delimiter = ',')]
        follow: Vec<u64>,
        /// Stop after this many seconds
        #[arg(long)]
        duration: Option<u64>,
        /// Records per batch
        #[arg(long, default_value_t = 1)]
        batch: usize,
    },
    /// Store credentials and service settings
    Configure {
        #[arg(long, value_enum)]
        service: Option<ServiceArg>,
        #[arg(long)]
        consumer_key: Option<String>,
        #[arg(long)]
        consumer_secret: Option<String>,
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        token_secret: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TimelineKind {
    Home,
    Mentions,
    User,
}

#[derive(Clone, Copy, ValueEnum)]
enum StreamKind {
    Sample,
    Filter,
}

#[derive(Clone, Copy, ValueEnum)]
enum ServiceArg {
    Twitter,
    Yammer,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(default_config_path);

    let (mut config, missing) = match load_config(&config_path) {
        Ok(config) => (config, false),
        Err(TwineError::ConfigFileNotFound { .. }) => (TwineConfig::default(), true),
        Err(e) => return Err(e.into()),
    };

    if let Command::Configure {
        service,
        consumer_key,
        consumer_secret,
        token,
        token_secret,
    } = cli.command
    {
        if let Some(service) = service {
            config.service = match service {
                ServiceArg::Twitter => Service::Twitter,
                ServiceArg::Yammer => Service::Yammer,
            };
        }
        let updates = [
            (&mut config.consumer_key, consumer_key),
            (&mut config.consumer_secret, consumer_secret),
            (&mut config.token, token),
            (&mut config.token_secret, token_secret),
        ];
        for (field, value) in updates {
            if let Some(value) = value {
                *field = value.into();
            }
        }

        save_config(&config_path, &config)?;
        println!("Saved {}", config_path.display());
        return Ok(());
    }

    if let Command::Timeline { count: Some(count), .. } = &cli.command {
        config.count = *count;
    }

    let AppComponents { service, receiver, _log_guard } = initialize_app(config, cli.debug)?;
    if missing {
        warn!(path = %config_path.display(), "No config file, requests are unsigned");
    }

    let outcome = match cli.command {
        Command::Timeline { kind, name, .. } => {
            let timeline = match (kind, name) {
                (TimelineKind::Home, _) => Timeline::Home,
                (TimelineKind::Mentions, _) => Timeline::Mentions,
                (TimelineKind::User, Some(name)) => Timeline::User(name.into()),
                (TimelineKind::User, None) => {
                    return Err(color_eyre::eyre::eyre!("user timeline needs a screen name"));
                },
            };
            service.fetch_timeline(timeline, None).await
        },
        Command::Search { query } => service.fetch_search(&query).await,
        Command::Post { text } => service.post_status(&text, None).await,
        Command::Stream { kind, track, follow, duration, batch } => {
            let request = match kind {
                StreamKind::Sample => StreamRequest::sample(),
                StreamKind::Filter => StreamRequest::filter(
                    FilterParametersBuilder::default()
                        .track(track.into_iter().map(CompactString::from).collect::<Vec<_>>())
                        .follow(follow.into_iter().map(UserId::new).collect::<Vec<_>>())
                        .build()?,
                ),
            };

            let options = service
                .config()
                .stream
                .with_duration(duration.map(Duration::from_secs))
                .with_results_per_callback(batch);

            let handle = service.start_stream(request, Some(options))?;
            let shutdown = handle.shutdown_sender();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupted, closing stream");
                    let _ = shutdown.send(());
                }
            });

            let printer = thread::spawn(move || print_events(receiver));
            let summary = handle.wait().await;
            drop(service);
            let _ = printer.join();

            let summary = summary?;
            println!(
                "-- {} statuses from {} records ({:?})",
                summary.statuses, summary.records, summary.reason
            );
            return Ok(());
        },
        // saved before initialization
        Command::Configure { .. } => Ok(()),
    };

    drop(service);
    print_events(receiver);
    outcome?;
    Ok(())
}

/// Print events until every sender is gone
fn print_events(receiver: mpsc::Receiver<TwineEvent>) {
    for event in receiver {
        match event {
            TwineEvent::StatusesLoaded(_, statuses) | TwineEvent::StreamStatuses(statuses) => {
                for status in statuses {
                    println!("{status}");
                }
            },
            TwineEvent::StatusPosted(status) => println!("Posted {}", status.id),
            TwineEvent::SearchLoaded(results) => {
                for result in results.results {
                    println!("@{}: {}", result.from_user, result.text);
                }
            },
            TwineEvent::DirectMessagesLoaded(messages) => {
                for message in messages {
                    println!("@{} -> @{}: {}", message.sender_screen_name, message.recipient_screen_name, message.text);
                }
            },
            TwineEvent::YammerMessagesLoaded(listing) => {
                for message in &listing.messages {
                    let sender = listing.sender_name(message).unwrap_or("unknown");
                    println!("{sender}: {}", message.body.plain);
                }
            },
            TwineEvent::StreamStatusDeleted(_) | TwineEvent::StreamEnded(_) => {},
            TwineEvent::AppError(e) => eprintln!("error: {e}"),
        }
    }
}
