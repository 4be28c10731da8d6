use clap::{Parser, Subcommand};
use tracing::{error, info};

use esports_bracket::{
    api::{models::TournamentId, RestApi},
    bracket::{build_bracket, MatchId, Participant, ParticipantId, Seeding},
    config::Config,
    log::setup_tracing,
    render::{bracket_table, synced_bracket_table},
    store::TournamentStore,
    sync::SyncOutcome,
    tournament::TournamentService,
    AppError,
};

/// Single-elimination brackets for esports tournaments.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a bracket locally and print it
    Build {
        /// Comma separated participants, each either `id` or `id:name`
        #[arg(long, value_delimiter = ',', required = true)]
        participants: Vec<String>,

        /// Shuffle the participants with a fixed seed instead of keeping their order
        #[arg(long)]
        seed: Option<u64>,

        /// Register the participants as teams
        #[arg(long)]
        teams: bool,
    },
    /// Generate the bracket of an open tournament and start it
    Start { tournament: TournamentId },
    /// Report the winner of a match
    Report {
        tournament: TournamentId,

        /// Match identifier in the form `round.position`
        match_id: MatchId,

        winner: String,
    },
    /// Print the current bracket of a tournament
    Show { tournament: TournamentId },
}

fn parse_participant(raw: &str, teams: bool) -> Participant {
    let (id, name) = raw.split_once(':').unwrap_or((raw, raw));
    if teams {
        Participant::team(id.trim(), name.trim())
    } else {
        Participant::new(id.trim(), name.trim())
    }
}

/// Connects to the backend configured in the environment.
fn connect() -> Result<TournamentService<RestApi>, AppError> {
    let config = Config::from_env()?;
    let api = RestApi::new(&config.api_url, config.api_token.clone());
    let store = TournamentStore::new(api, &config.cache);
    Ok(TournamentService::new(store, config.seeding()))
}

#[tokio::main]
async fn main() {
    if let Err(e) = setup_tracing() {
        eprintln!("Error setting up tracing: {}", e);
    }
    if let Err(e) = run(Args::parse()).await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Runs the requested command.
async fn run(args: Args) -> Result<(), AppError> {
    match args.command {
        Command::Build {
            participants,
            seed,
            teams,
        } => {
            let seeding = seed.map_or(Seeding::AsGiven, Seeding::Seeded);
            let participants = participants
                .iter()
                .map(|p| parse_participant(p, teams))
                .collect();
            let matches = build_bracket(participants, &seeding)?;
            bracket_table(&matches).printstd();
        }
        Command::Start { tournament } => {
            let mut service = connect()?;
            let bracket = service.start_tournament(tournament).await?;
            synced_bracket_table(bracket).printstd();
        }
        Command::Report {
            tournament,
            match_id,
            winner,
        } => {
            let mut service = connect()?;
            let outcome = service
                .report_result(tournament, match_id, ParticipantId::new(winner))
                .await?;
            match &outcome {
                SyncOutcome::Confirmed => info!("Result of match {} confirmed", match_id),
                SyncOutcome::RolledBack { reason } => {
                    println!("The backend rejected the result: {}", reason)
                }
            }
            if let Some(bracket) = service.bracket(tournament) {
                synced_bracket_table(bracket).printstd();
            }
        }
        Command::Show { tournament } => {
            let mut service = connect()?;
            let bracket = service.load_bracket(tournament).await?;
            synced_bracket_table(bracket).printstd();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use esports_bracket::bracket::ParticipantKind;

    #[test]
    fn parses_report_arguments() {
        let args = Args::try_parse_from(["esports-bracket", "report", "7", "2.0", "alpha"]).unwrap();
        match args.command {
            Command::Report {
                tournament,
                match_id,
                winner,
            } => {
                assert_eq!(tournament, 7);
                assert_eq!(match_id, MatchId::new(2, 0));
                assert_eq!(winner, "alpha");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn rejects_malformed_match_ids() {
        assert!(Args::try_parse_from(["esports-bracket", "report", "7", "0.1", "alpha"]).is_err());
    }

    #[test]
    fn participants_take_optional_names() {
        let named = parse_participant("t1: Team One", true);
        assert_eq!(named.id.as_str(), "t1");
        assert_eq!(named.name, "Team One");
        assert_eq!(named.kind, ParticipantKind::Team);

        let plain = parse_participant("solo", false);
        assert_eq!(plain.name, "solo");
        assert_eq!(plain.kind, ParticipantKind::User);
    }
}
