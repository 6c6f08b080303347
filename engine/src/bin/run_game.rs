use std::{
    io::{self, Write},
    path::PathBuf,
};

use clap::Parser;
use engine::{GameEngine, OracleKind, Settings};
use types::{Club, GameStatus};

#[derive(Parser, Debug)]
struct Params {
    /// YAML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Club id or name to start with
    #[arg(long)]
    club: Option<String>,

    #[arg(long)]
    database_url: Option<String>,

    #[arg(long, value_enum)]
    oracle: Option<OracleKind>,

    /// Fixtures for the scripted oracle
    #[arg(long)]
    fixtures: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Params::parse();
    log::info!("args: {args:?}");

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(kind) = args.oracle {
        settings.oracle = kind;
    }
    if let Some(fixtures) = args.fixtures {
        settings.fixtures = Some(fixtures);
    }

    let cache = settings.build_cache(args.database_url).await?;
    let oracle = settings.build_oracle()?;
    let engine = GameEngine::new(cache, oracle);

    let mut club_query = args.club;
    loop {
        let preselected = club_query.take().and_then(|query| {
            let club = settings.find_club(&query).cloned();
            if club.is_none() {
                log::warn!("No club matching {query:?}");
            }
            club
        });
        let club = match preselected {
            Some(club) => club,
            None => match choose_club(&settings.clubs).await? {
                Some(club) => club,
                None => return Ok(()),
            },
        };
        engine.select_club(club)?;

        if !play_game(&engine).await? {
            return Ok(());
        }
        engine.reset();
    }
}

/// Runs one game. Returns false when the user wants to stop altogether.
async fn play_game(engine: &GameEngine) -> Result<bool, Box<dyn std::error::Error>> {
    loop {
        let state = engine.state();
        if state.status == GameStatus::Finished {
            println!("{state}");
            let answer = read_line("Play again? [y/N] >> ".to_string()).await?;
            return Ok(matches!(answer.as_deref().map(str::trim), Some("y" | "Y" | "yes")));
        }

        println!("{state}");
        let prompt = format!("{}, name a player >> ", state.current_player);
        let Some(line) = read_line(prompt).await? else {
            return Ok(false);
        };
        match line.trim() {
            ":quit" => return Ok(false),
            ":reset" => return Ok(true),
            ":state" => {
                println!("{:#?}", engine.snapshot());
                continue;
            }
            _ => {}
        }

        match engine.submit_name(&line).await {
            Ok(turn) => log::debug!("Turn result: {turn:?}"),
            Err(err) if err.is_recoverable() => println!("!! {err}"),
            Err(err) => return Err(err.into()),
        }
    }
}

async fn choose_club(clubs: &[Club]) -> Result<Option<Club>, Box<dyn std::error::Error>> {
    for (idx, club) in clubs.iter().enumerate() {
        println!("{:>2}. {club}", idx + 1);
    }
    loop {
        let Some(line) = read_line("Choose a club >> ".to_string()).await? else {
            return Ok(None);
        };
        let choice = line.trim();
        if choice == ":quit" {
            return Ok(None);
        }
        let by_number = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| clubs.get(idx));
        let by_name = clubs
            .iter()
            .find(|club| club.name.eq_ignore_ascii_case(choice) || club.id.eq_ignore_ascii_case(choice));
        match by_number.or(by_name) {
            Some(club) => return Ok(Some(club.clone())),
            None => println!("!! No club matching {choice:?}"),
        }
    }
}

/// Reads one line from stdin off the async runtime. `None` at end of input.
async fn read_line(prompt: String) -> io::Result<Option<String>> {
    tokio::task::spawn_blocking(move || -> io::Result<Option<String>> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut buf = String::new();
        match io::stdin().read_line(&mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(buf)),
        }
    })
    .await
    .map_err(io::Error::other)?
}
