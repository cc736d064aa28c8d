use rusqlite::Connection;
use tempfile::NamedTempFile;
use workout_log::workout::{
    self, Exercise, ExerciseStatus, NewExercise, NewTraining, Training, EXERCISES, TRAININGS,
};
use workout_log::{Changes, Constraints, Error, Result, Schema, SqliteConfig, Store, UpdateOutcome, Value};

// Column positions in an `exercises` record.
const NAME: usize = 2;
const NUMBER_OF_REP: usize = 4;

// Helper function to create an in-memory database for testing
fn create_test_db() -> Result<Connection> {
    let conn = SqliteConfig::in_memory(workout::schema()).open()?;
    workout::create_tables(&conn)?;
    Ok(conn)
}

// Helper function to create a temporary file-based database
fn create_temp_db() -> Result<(SqliteConfig, NamedTempFile)> {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().to_str().unwrap().to_string();
    let config = SqliteConfig::new(path, workout::schema());
    let conn = config.open()?;
    workout::create_tables(&conn)?;
    Ok((config, temp_file))
}

fn exercise(training_id: i64, name: &str, series: i64, reps: i64, status: ExerciseStatus) -> NewExercise {
    NewExercise {
        training_id,
        name: name.to_string(),
        number_of_series: series,
        number_of_rep: reps,
        status,
        start_date: "2024-09-20 10:00:00".to_string(),
        end_date: "2024-09-20 10:30:00".to_string(),
    }
}

// Seeds the biceps training with the four exercises used throughout.
fn seed(store: &Store<'_>) -> Result<i64> {
    let training = NewTraining::new("biceps").between("2024-09-20 10:00:00", "2024-09-20 12:00:00");
    let training_id = workout::add_training(store, &training)?;
    for (name, series, reps, status) in [
        ("cable curls", 4, 12, ExerciseStatus::Finished),
        ("hammer curls", 4, 12, ExerciseStatus::Finished),
        ("EZ-Bar Curl", 4, 12, ExerciseStatus::Finished),
        ("chin up", 3, 15, ExerciseStatus::Ongoing),
    ] {
        workout::add_exercise(store, &exercise(training_id, name, series, reps, status))?;
    }
    Ok(training_id)
}

fn names(records: &[Vec<Value>]) -> Vec<String> {
    let mut names: Vec<String> = records
        .iter()
        .map(|r| r[NAME].as_str().unwrap().to_string())
        .collect();
    names.sort();
    names
}

fn count(store: &Store<'_>, table: &str) -> usize {
    store.find(table, &Constraints::new()).unwrap().len()
}

#[test]
fn test_workout_scenario() -> Result<()> {
    let conn = create_test_db()?;
    let schema = workout::schema();
    let store = Store::new(&conn, &schema);
    seed(&store)?;

    let outcome = store.update(
        EXERCISES,
        "name",
        "EZ-Bar Curl",
        &Changes::new().with_value("number_of_rep", 15),
    );
    assert_eq!(outcome.rows(), 1);

    let curls = store.find(EXERCISES, &Constraints::new().with_value("name", "EZ-Bar Curl"))?;
    assert_eq!(curls.len(), 1);
    assert_eq!(curls[0][NUMBER_OF_REP], Value::Integer(15));

    let removed = store.remove(EXERCISES, &Constraints::new().with_value("name", "chin up"))?;
    assert_eq!(removed, 1);

    let all = store.find(EXERCISES, &Constraints::new())?;
    assert_eq!(all.len(), 3);
    assert_eq!(names(&all), vec!["EZ-Bar Curl", "cable curls", "hammer curls"]);
    Ok(())
}

#[test]
fn test_find_is_a_conjunction() -> Result<()> {
    let conn = create_test_db()?;
    let schema = workout::schema();
    let store = Store::new(&conn, &schema);
    seed(&store)?;

    // number_of_rep = 12 matches three rows, series = 3 matches one, and no
    // row has both.
    let twelve = store.find(EXERCISES, &Constraints::new().with_value("number_of_rep", 12))?;
    assert_eq!(names(&twelve), vec!["EZ-Bar Curl", "cable curls", "hammer curls"]);

    let both = store.find(
        EXERCISES,
        &Constraints::new()
            .with_value("number_of_rep", 12)
            .with_value("number_of_series", 3),
    )?;
    assert!(both.is_empty());

    let ongoing = store.find(
        EXERCISES,
        &Constraints::new()
            .with_value("number_of_rep", 15)
            .with_value("status", ExerciseStatus::Ongoing),
    )?;
    assert_eq!(names(&ongoing), vec!["chin up"]);
    Ok(())
}

#[test]
fn test_find_without_constraints_returns_everything() -> Result<()> {
    let conn = create_test_db()?;
    let schema = workout::schema();
    let store = Store::new(&conn, &schema);
    seed(&store)?;

    assert_eq!(count(&store, EXERCISES), 4);
    assert_eq!(count(&store, TRAININGS), 1);
    Ok(())
}

#[test]
fn test_remove_without_constraints_is_rejected() -> Result<()> {
    let conn = create_test_db()?;
    let schema = workout::schema();
    let store = Store::new(&conn, &schema);
    seed(&store)?;

    let err = store.remove(EXERCISES, &Constraints::new()).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(count(&store, EXERCISES), 4);
    Ok(())
}

#[test]
fn test_remove_deletes_only_matching_rows() -> Result<()> {
    let conn = create_test_db()?;
    let schema = workout::schema();
    let store = Store::new(&conn, &schema);
    seed(&store)?;

    let removed = store.remove(EXERCISES, &Constraints::new().with_value("number_of_rep", 12))?;
    assert_eq!(removed, 3);
    assert_eq!(names(&store.find(EXERCISES, &Constraints::new())?), vec!["chin up"]);

    let removed = store.remove(EXERCISES, &Constraints::new().with_value("name", "deadlift"))?;
    assert_eq!(removed, 0);
    assert_eq!(count(&store, EXERCISES), 1);
    Ok(())
}

#[test]
fn test_update_touches_only_the_keyed_row() -> Result<()> {
    let conn = create_test_db()?;
    let schema = workout::schema();
    let store = Store::new(&conn, &schema);
    seed(&store)?;

    // "cable curls" and "hammer curls" share every non-key attribute with
    // "EZ-Bar Curl".
    let outcome = store.update(
        EXERCISES,
        "name",
        "EZ-Bar Curl",
        &Changes::new()
            .with_value("number_of_rep", 10)
            .with_value("status", ExerciseStatus::Ongoing),
    );
    assert!(outcome.is_updated());

    let untouched = store.find(
        EXERCISES,
        &Constraints::new()
            .with_value("number_of_rep", 12)
            .with_value("status", ExerciseStatus::Finished),
    )?;
    assert_eq!(names(&untouched), vec!["cable curls", "hammer curls"]);

    let changed: Vec<Exercise> =
        store.find_as(EXERCISES, &Constraints::new().with_value("name", "EZ-Bar Curl"))?;
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].number_of_rep, 10);
    assert_eq!(changed[0].status, ExerciseStatus::Ongoing);
    Ok(())
}

#[test]
fn test_update_outcomes() -> Result<()> {
    let conn = create_test_db()?;
    let schema = workout::schema();
    let store = Store::new(&conn, &schema);
    seed(&store)?;

    let changes = Changes::new().with_value("number_of_rep", 20);
    let outcome = store.update(EXERCISES, "name", "deadlift", &changes);
    assert!(matches!(outcome, UpdateOutcome::NotFound));

    let outcome = store.update(EXERCISES, "weight", "deadlift", &changes);
    assert!(outcome.is_failed());
    assert!(outcome.into_result().unwrap_err().is_query());

    let outcome = store.update("sessions", "name", "deadlift", &changes);
    assert!(matches!(outcome, UpdateOutcome::Failed(Error::UnknownTable(_))));

    let outcome = store.update(EXERCISES, "name", "chin up", &Changes::new());
    assert!(matches!(outcome, UpdateOutcome::Failed(Error::Validation(_))));

    // NOT NULL violation comes from SQLite itself and is rolled back.
    let outcome = store.update(
        EXERCISES,
        "name",
        "chin up",
        &Changes::new().with_value("status", Value::Null),
    );
    assert!(matches!(outcome, UpdateOutcome::Failed(Error::Query(_))));
    let chin_up: Vec<Exercise> =
        store.find_as(EXERCISES, &Constraints::new().with_value("name", "chin up"))?;
    assert_eq!(chin_up[0].status, ExerciseStatus::Ongoing);
    Ok(())
}

#[test]
fn test_training_id_round_trip() -> Result<()> {
    let conn = create_test_db()?;
    let schema = workout::schema();
    let store = Store::new(&conn, &schema);

    let first = workout::add_training(&store, &NewTraining::new("legs"))?;
    let second = workout::add_training(&store, &NewTraining::new("back"))?;
    assert_ne!(first, second);

    workout::add_exercise(&store, &exercise(second, "pull-ups", 4, 8, ExerciseStatus::Finished))?;

    let records = store.find(EXERCISES, &Constraints::new().with_value("training_id", second))?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0][1], Value::Integer(second));

    let exercises = workout::exercises_of(&store, second)?;
    assert_eq!(exercises[0].name, "pull-ups");
    assert!(workout::exercises_of(&store, first)?.is_empty());

    let trainings: Vec<Training> =
        store.find_as(TRAININGS, &Constraints::new().with_value("id", first))?;
    assert_eq!(trainings[0].body_part, "legs");
    assert_eq!(trainings[0].start_date, None);
    Ok(())
}

#[test]
fn test_foreign_key_is_enforced() -> Result<()> {
    let conn = create_test_db()?;
    let schema = workout::schema();
    let store = Store::new(&conn, &schema);

    let err = workout::add_exercise(&store, &exercise(42, "squat", 5, 5, ExerciseStatus::Finished))
        .unwrap_err();
    assert!(matches!(err, Error::Query(_)));
    assert_eq!(count(&store, EXERCISES), 0);
    Ok(())
}

#[test]
fn test_unknown_identifiers_are_query_errors() -> Result<()> {
    let conn = create_test_db()?;
    let schema = workout::schema();
    let store = Store::new(&conn, &schema);
    seed(&store)?;

    let err = store
        .find(EXERCISES, &Constraints::new().with_value("weight", 20))
        .unwrap_err();
    assert!(matches!(err, Error::UnknownColumn { .. }));
    assert!(err.is_query());

    let err = store.find("sessions", &Constraints::new()).unwrap_err();
    assert!(matches!(err, Error::UnknownTable(_)));

    let err = store
        .remove(EXERCISES, &Constraints::new().with_value("name; DROP TABLE exercises", 1))
        .unwrap_err();
    assert!(err.is_query());
    assert_eq!(count(&store, EXERCISES), 4);
    Ok(())
}

#[test]
fn test_table_missing_from_database_surfaces_from_sqlite() -> Result<()> {
    // Schema declares the tables but they were never created.
    let conn = Connection::open_in_memory()?;
    let schema = workout::schema();
    let store = Store::new(&conn, &schema);

    let err = store.find(TRAININGS, &Constraints::new()).unwrap_err();
    assert!(matches!(err, Error::Query(_)));
    let err = store
        .remove(TRAININGS, &Constraints::new().with_value("id", 1))
        .unwrap_err();
    assert!(matches!(err, Error::Query(_)));
    Ok(())
}

#[test]
fn test_injection_attempt_in_value_is_inert() -> Result<()> {
    let conn = create_test_db()?;
    let schema = workout::schema();
    let store = Store::new(&conn, &schema);
    seed(&store)?;

    let hostile = Constraints::new().with_value("name", "x' OR '1'='1");
    assert!(store.find(EXERCISES, &hostile)?.is_empty());
    assert_eq!(store.remove(EXERCISES, &hostile)?, 0);
    assert_eq!(count(&store, EXERCISES), 4);
    Ok(())
}

#[test]
fn test_introspected_schema_matches_contract() -> Result<()> {
    let conn = create_test_db()?;
    let introspected = Schema::introspect(&conn)?;
    let declared = workout::schema();

    for table in &declared.tables {
        let found = introspected.require_table(&table.name)?;
        assert_eq!(found.column_names(), table.column_names());
        assert_eq!(found.primary_key, table.primary_key);
        assert_eq!(found.foreign_keys, table.foreign_keys);
    }

    // An introspected schema works as the allowlist too.
    let store = Store::new(&conn, &introspected);
    seed(&store)?;
    assert_eq!(count(&store, EXERCISES), 4);
    Ok(())
}

#[test]
fn test_file_database_persists_across_connections() -> Result<()> {
    let (config, _temp_file) = create_temp_db()?;
    {
        let conn = config.open()?;
        let store = Store::new(&conn, &config.schema);
        seed(&store)?;
        store.remove(EXERCISES, &Constraints::new().with_value("name", "chin up"))?;
    }

    let conn = config.open()?;
    let store = Store::new(&conn, &config.schema);
    let all = store.find(EXERCISES, &Constraints::new())?;
    assert_eq!(names(&all), vec!["EZ-Bar Curl", "cable curls", "hammer curls"]);
    Ok(())
}

#[test]
fn test_foreign_keys_can_be_disabled() -> Result<()> {
    let config = SqliteConfig::in_memory(workout::schema()).with_foreign_keys(false);
    let conn = config.open()?;
    workout::create_tables(&conn)?;
    let store = Store::new(&conn, &config.schema);

    // No training 42 exists; accepted because enforcement is off.
    let id = workout::add_exercise(&store, &exercise(42, "squat", 5, 5, ExerciseStatus::Finished))?;
    let records = store.find(EXERCISES, &Constraints::new().with_value("id", id))?;
    assert_eq!(records[0][1], Value::Integer(42));
    Ok(())
}

#[test]
fn test_writes_join_an_open_transaction() -> Result<()> {
    let conn = create_test_db()?;
    let schema = workout::schema();
    seed(&Store::new(&conn, &schema))?;

    // Rolled back by the caller: neither write survives.
    {
        let tx = conn.unchecked_transaction()?;
        let store = Store::new(&conn, &schema);
        let outcome = store.update(
            EXERCISES,
            "name",
            "chin up",
            &Changes::new().with_value("number_of_rep", 20),
        );
        assert_eq!(outcome.rows(), 1);
        assert_eq!(
            store.remove(EXERCISES, &Constraints::new().with_value("name", "cable curls"))?,
            1
        );
        assert_eq!(count(&store, EXERCISES), 3);
        tx.rollback()?;
    }
    let store = Store::new(&conn, &schema);
    assert_eq!(count(&store, EXERCISES), 4);
    let chin_up: Vec<Exercise> =
        store.find_as(EXERCISES, &Constraints::new().with_value("name", "chin up"))?;
    assert_eq!(chin_up[0].number_of_rep, 15);

    // Committed by the caller: the write is kept.
    {
        let tx = conn.unchecked_transaction()?;
        let store = Store::new(&conn, &schema);
        assert_eq!(
            store.remove(EXERCISES, &Constraints::new().with_value("name", "cable curls"))?,
            1
        );
        tx.commit()?;
    }
    assert!(conn.is_autocommit());
    assert_eq!(count(&store, EXERCISES), 3);
    Ok(())
}
