//! Two simulated racers in one process, talking to the coordinator through
//! the gateway. Run with `RUST_LOG=debug` to watch the room actor.

use std::time::Duration;

use typerace::prelude::*;
use typerace::room::text_length;

/// A simulated typist.
struct Racer {
    name: &'static str,
    chars_per_second: u32,
    /// One mistake every this many characters.
    error_every: u32,
}

const TYPING_STEP: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<(), TyperaceError> {
    init_tracing("info")?;

    let registry = RoomRegistry::builder()
        .config(CoordinatorConfig {
            countdown: CountdownConfig::new(3, Duration::from_millis(500)),
            ..CoordinatorConfig::default()
        })
        .build();
    let gateway = Gateway::json(registry);
    let room = RoomId::new("DEMO");

    let racers = [
        Racer { name: "ada", chars_per_second: 7, error_every: 25 },
        Racer { name: "bob", chars_per_second: 5, error_every: 12 },
    ];

    let mut clients = Vec::new();
    for racer in racers {
        let client = gateway.connect();
        client
            .handle_event(ClientEvent::Join {
                room: room.clone(),
                name: racer.name.to_string(),
                config: Some(RaceConfig::Words { word_count: 12 }),
            })
            .await?;
        clients.push((client, racer));
    }

    // First joiner is host.
    if let Some((host, _)) = clients.first() {
        host.handle_event(ClientEvent::StartRace).await?;
    }

    let tasks: Vec<_> = clients
        .into_iter()
        .map(|(client, racer)| tokio::spawn(run_racer(client, racer)))
        .collect();

    let mut printed = false;
    for task in tasks {
        match task.await {
            Ok(Ok(Some(ranking))) if !printed => {
                print_ranking(&ranking);
                printed = true;
            }
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "racer failed"),
            Err(e) => tracing::error!(error = %e, "racer task panicked"),
        }
    }
    Ok(())
}

/// Types through the race text at the racer's pace. Returns the final
/// ranking as this racer saw it.
async fn run_racer(
    mut client: ClientConnection,
    racer: Racer,
) -> Result<Option<Vec<RankingEntry>>, TyperaceError> {
    let mut total = 0;
    loop {
        match client.next_event().await {
            Some(ServerEvent::RaceText { words }) => total = text_length(&words),
            Some(ServerEvent::Snapshot(s)) if s.status == RoomStatus::Racing => break,
            Some(_) => {}
            None => return Ok(None),
        }
    }

    let per_step = (racer.chars_per_second / 4).max(1);
    let mut typed = 0;
    let mut ticker = tokio::time::interval(TYPING_STEP);
    while typed < total {
        ticker.tick().await;
        typed = (typed + per_step).min(total);
        let mistakes = typed / racer.error_every.max(1);
        client
            .handle_event(ClientEvent::ProgressUpdate {
                typed_length: typed,
                correct_chars: typed,
                typed_chars: typed + mistakes,
            })
            .await?;
    }
    tracing::info!(racer = racer.name, "done typing");

    loop {
        match client.next_event().await {
            Some(ServerEvent::RaceFinished { ranking }) => {
                client.disconnect().await;
                return Ok(Some(ranking));
            }
            Some(_) => {}
            None => return Ok(None),
        }
    }
}

fn print_ranking(ranking: &[RankingEntry]) {
    println!("{:<6}{:<10}{:>8}{:>10}", "rank", "name", "wpm", "accuracy");
    for entry in ranking {
        println!(
            "{:<6}{:<10}{:>8.1}{:>9.0}%",
            entry.rank, entry.display_name, entry.wpm, entry.accuracy
        );
    }
}
