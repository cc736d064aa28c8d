//! Demo: seed one biceps training, adjust it, and print what is left.
//!
//! Usage: `workout-log [DATABASE_PATH]` (defaults to `database.db`).
//! Log verbosity follows `RUST_LOG`.

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use workout_log::workout::{self, ExerciseStatus, NewExercise, NewTraining, EXERCISES};
use workout_log::{Changes, Constraints, SqliteConfig, Store, UpdateOutcome};

const DEFAULT_DB_PATH: &str = "database.db";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
    let config = SqliteConfig::new(db_path, workout::schema());

    // Dropping the connection closes it on every early return below.
    let conn = config
        .open()
        .with_context(|| format!("opening {}", config.db_path))?;
    config.schema.initialize(&conn).context("creating tables")?;

    {
        let store = Store::new(&conn, &config.schema);
        run(&store)?;
    }

    conn.close()
        .map_err(|(_, err)| err)
        .context("closing database")?;
    Ok(())
}

fn run(store: &Store<'_>) -> Result<()> {
    let training = NewTraining::new("biceps").between("2024-09-20 10:00:00", "2024-09-20 12:00:00");
    let training_id = workout::add_training(store, &training).context("adding training")?;
    info!(training_id, "added training");

    let seed = [
        ("cable curls", 4, 12, ExerciseStatus::Finished, "2024-09-20 10:00:00", "2024-09-20 10:30:00"),
        ("hammer curls", 4, 12, ExerciseStatus::Finished, "2024-09-20 10:35:00", "2024-09-20 11:00:00"),
        ("EZ-Bar Curl", 4, 12, ExerciseStatus::Finished, "2024-09-20 11:05:00", "2024-09-20 11:30:00"),
        ("chin up", 3, 15, ExerciseStatus::Ongoing, "2024-09-20 11:35:00", "2024-09-20 12:00:00"),
    ];
    for (name, series, reps, status, start, end) in seed {
        let exercise = NewExercise {
            training_id,
            name: name.to_string(),
            number_of_series: series,
            number_of_rep: reps,
            status,
            start_date: start.to_string(),
            end_date: end.to_string(),
        };
        let id = workout::add_exercise(store, &exercise)
            .with_context(|| format!("adding exercise {name:?}"))?;
        info!(id, name, "added exercise");
    }

    let outcome = store.update(
        EXERCISES,
        "name",
        "EZ-Bar Curl",
        &Changes::new().with_value("number_of_rep", 15),
    );
    if let UpdateOutcome::Updated(rows) = outcome {
        info!(rows, "raised EZ-Bar Curl to 15 repetitions");
    }

    let removed = store
        .remove(EXERCISES, &Constraints::new().with_value("name", "chin up"))
        .context("removing chin up")?;
    info!(removed, "removed chin up");

    println!("All exercises:");
    for record in store.find(EXERCISES, &Constraints::new())? {
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(())
}
