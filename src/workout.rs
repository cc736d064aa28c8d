//! The two-table workout log: `trainings` and the `exercises` done in them.

use std::fmt;
use std::str::FromStr;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::{ColumnDefinition, DataType, ForeignKey, Schema, TableDefinition};
use crate::sqlite::{ColumnValues, Constraints, Record, Value};
use crate::store::Store;

pub const TRAININGS: &str = "trainings";
pub const EXERCISES: &str = "exercises";

/// The fixed workout schema. `exercises.training_id` references
/// `trainings.id`.
pub fn schema() -> Schema {
    let trainings = TableDefinition::new(TRAININGS)
        .column(ColumnDefinition::new("id", DataType::Integer).primary_key())
        .column(ColumnDefinition::new("body_part", DataType::Text).not_null())
        .column(ColumnDefinition::new("start_date", DataType::Text))
        .column(ColumnDefinition::new("end_date", DataType::Text));

    let exercises = TableDefinition::new(EXERCISES)
        .column(ColumnDefinition::new("id", DataType::Integer).primary_key())
        .column(ColumnDefinition::new("training_id", DataType::Integer).not_null())
        .column(ColumnDefinition::new("name", DataType::Text).not_null())
        .column(ColumnDefinition::new("number_of_series", DataType::Numeric).not_null())
        .column(ColumnDefinition::new("number_of_rep", DataType::Numeric).not_null())
        .column(ColumnDefinition::new("status", DataType::Text).not_null())
        .column(ColumnDefinition::new("start_date", DataType::Text).not_null())
        .column(ColumnDefinition::new("end_date", DataType::Text).not_null())
        .foreign_key(ForeignKey::new("training_id", TRAININGS, "id"));

    Schema::new().add_table(trainings).add_table(exercises)
}

/// Create both tables of the fixed [`schema`] if they are missing.
///
/// Always uses the fixed contract; to initialize from a configured schema,
/// call [`Schema::initialize`] on it instead.
pub fn create_tables(conn: &Connection) -> Result<()> {
    schema().initialize(conn)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseStatus {
    Finished,
    Ongoing,
}

impl ExerciseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseStatus::Finished => "finished",
            ExerciseStatus::Ongoing => "ongoing",
        }
    }
}

impl fmt::Display for ExerciseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "finished" => Ok(ExerciseStatus::Finished),
            "ongoing" => Ok(ExerciseStatus::Ongoing),
            other => Err(Error::decode("status", format!("unknown status {other:?}"))),
        }
    }
}

impl From<ExerciseStatus> for Value {
    fn from(status: ExerciseStatus) -> Self {
        Value::from(status.as_str())
    }
}

/// A training session to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTraining {
    pub body_part: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl NewTraining {
    pub fn new(body_part: &str) -> Self {
        Self {
            body_part: body_part.to_string(),
            start_date: None,
            end_date: None,
        }
    }

    pub fn between(mut self, start_date: &str, end_date: &str) -> Self {
        self.start_date = Some(start_date.to_string());
        self.end_date = Some(end_date.to_string());
        self
    }
}

/// An exercise to insert into an existing training.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExercise {
    pub training_id: i64,
    pub name: String,
    pub number_of_series: i64,
    pub number_of_rep: i64,
    pub status: ExerciseStatus,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Training {
    pub id: i64,
    pub body_part: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,
    pub training_id: i64,
    pub name: String,
    pub number_of_series: i64,
    pub number_of_rep: i64,
    pub status: ExerciseStatus,
    pub start_date: String,
    pub end_date: String,
}

/// Insert a training and return its generated id.
pub fn add_training(store: &Store<'_>, training: &NewTraining) -> Result<i64> {
    let values = ColumnValues::new()
        .with_value("body_part", training.body_part.as_str())
        .with_value("start_date", training.start_date.clone())
        .with_value("end_date", training.end_date.clone());
    store.insert(TRAININGS, &values)
}

/// Insert an exercise and return its generated id.
pub fn add_exercise(store: &Store<'_>, exercise: &NewExercise) -> Result<i64> {
    let values = ColumnValues::new()
        .with_value("training_id", exercise.training_id)
        .with_value("name", exercise.name.as_str())
        .with_value("number_of_series", exercise.number_of_series)
        .with_value("number_of_rep", exercise.number_of_rep)
        .with_value("status", exercise.status)
        .with_value("start_date", exercise.start_date.as_str())
        .with_value("end_date", exercise.end_date.as_str());
    store.insert(EXERCISES, &values)
}

/// All exercises recorded for one training.
pub fn exercises_of(store: &Store<'_>, training_id: i64) -> Result<Vec<Exercise>> {
    store.find_as(EXERCISES, &Constraints::new().with_value("training_id", training_id))
}

impl TryFrom<&Record> for Training {
    type Error = Error;

    fn try_from(record: &Record) -> Result<Self> {
        Ok(Self {
            id: integer(record, 0, "id")?,
            body_part: text(record, 1, "body_part")?,
            start_date: optional_text(record, 2, "start_date")?,
            end_date: optional_text(record, 3, "end_date")?,
        })
    }
}

impl TryFrom<&Record> for Exercise {
    type Error = Error;

    fn try_from(record: &Record) -> Result<Self> {
        Ok(Self {
            id: integer(record, 0, "id")?,
            training_id: integer(record, 1, "training_id")?,
            name: text(record, 2, "name")?,
            number_of_series: integer(record, 3, "number_of_series")?,
            number_of_rep: integer(record, 4, "number_of_rep")?,
            status: text(record, 5, "status")?.parse()?,
            start_date: text(record, 6, "start_date")?,
            end_date: text(record, 7, "end_date")?,
        })
    }
}

fn column<'r>(record: &'r Record, index: usize, name: &str) -> Result<&'r Value> {
    record
        .get(index)
        .ok_or_else(|| Error::decode(name, format!("record has only {} columns", record.len())))
}

// NUMERIC columns hand back whole reals as integers, but accept both.
fn integer(record: &Record, index: usize, name: &str) -> Result<i64> {
    let value = column(record, index, name)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
        .ok_or_else(|| Error::decode(name, format!("expected integer, got {value:?}")))
}

fn text(record: &Record, index: usize, name: &str) -> Result<String> {
    let value = column(record, index, name)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::decode(name, format!("expected text, got {value:?}")))
}

fn optional_text(record: &Record, index: usize, name: &str) -> Result<Option<String>> {
    match column(record, index, name)? {
        Value::Null => Ok(None),
        _ => text(record, index, name).map(Some),
    }
}
