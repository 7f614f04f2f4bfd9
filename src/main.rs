use std::process::ExitCode;
use std::sync::Arc;

use serde::Serialize;

use battlezone_engine::config::Config;
use battlezone_engine::db::Database;
use battlezone_engine::engine::{parse_count, ResultSubmission};
use battlezone_engine::metrics;
use battlezone_engine::model::Group;
use battlezone_engine::service::TournamentService;

const USAGE: &str = "usage: battlezone [--db URL] [--setup PATH] <command>

commands:
  init                                      create the tournament if absent
  submit <match> <home> <away> [hy hr ay ar] record a result
  standings <A|B>                           group table
  bracket                                   playoff bracket
  state                                     full tournament snapshot
  reset                                     discard all results
  metrics                                   prometheus metrics";

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn submission(args: &[String]) -> Result<ResultSubmission, Box<dyn std::error::Error>> {
    let [match_id, home, away, cards @ ..] = args else {
        return Err(USAGE.into());
    };
    let mut sub = ResultSubmission::new(
        match_id.clone(),
        parse_count("home goals", home)?,
        parse_count("away goals", away)?,
    );
    match cards {
        [] => {}
        [hy, hr, ay, ar] => {
            sub = sub.with_cards(
                parse_count("home yellow cards", hy)?,
                parse_count("home red cards", hr)?,
                parse_count("away yellow cards", ay)?,
                parse_count("away red cards", ar)?,
            );
        }
        _ => return Err(USAGE.into()),
    }
    Ok(sub)
}

async fn run(config: Config, args: &[String]) -> CliResult {
    let Some((command, rest)) = args.split_first() else {
        return Err(USAGE.into());
    };

    metrics::register_metrics();

    let setup = config.tournament_setup()?;
    let db = Arc::new(Database::new(&config.database_url).await?);
    let service = TournamentService::new(db, setup);

    match command.as_str() {
        "init" => print_json(&service.init().await?),
        "submit" => {
            let sub = submission(rest)?;
            print_json(&service.submit_result(&sub).await?)
        }
        "standings" => {
            let group = rest
                .first()
                .and_then(|g| Group::from_str_name(g))
                .ok_or("standings needs a group: A or B")?;
            print_json(&service.standings(group).await?)
        }
        "bracket" => print_json(&service.bracket().await?),
        "state" => print_json(&service.snapshot().await?),
        "reset" => print_json(&service.reset().await?),
        "metrics" => {
            print!("{}", metrics::gather_metrics());
            Ok(())
        }
        _ => Err(USAGE.into()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args: Vec<String> = std::env::args().collect();
    let config = Config::from_args(&args);
    let positional = Config::positional(&args);

    match run(config, positional.get(1..).unwrap_or_default()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
