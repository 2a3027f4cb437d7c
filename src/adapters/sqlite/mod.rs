//! SQLite adapter: Implementation of Storage.
//!
//! Provides local persistence for respondents and scored records. The table
//! layout keeps one REAL column per construct plus both composites, so the
//! data stays directly queryable alongside the serialized raw-answer payload.
//!
//! # Mutex Behavior
//!
//! Database connection is protected by `Mutex`. A poisoned mutex (from panic
//! in another thread) will cause panic. This fail-fast behavior is intentional
//! for data integrity.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, Row};

use crate::domain::{
    ConstructScore, DomainScores, RawAnswerSet, Respondent, ScoredRecord, SurveyScores,
};
use crate::ports::Storage;

/// Stress construct columns in schema traversal order.
const STRESS_COLUMNS: [(&str, &str); 8] = [
    ("workload", "Workload"),
    ("role_ambiguity", "Role Ambiguity"),
    ("job_security", "Job Security"),
    ("gender_discrim", "Gender Discrimination"),
    ("interpersonal", "Interpersonal Relationships"),
    ("resources", "Resource Constraints"),
    ("satisfaction", "Job Satisfaction"),
    ("support", "Organizational Support"),
];

/// Productivity construct columns in schema traversal order.
const PRODUCTIVITY_COLUMNS: [(&str, &str); 4] = [
    ("timings", "Timings"),
    ("supervisor", "Supervisor Competence"),
    ("compensation", "Compensation"),
    ("systems", "Systems & Procedures"),
];

/// Username prefix marking bulk-imported respondents.
const IMPORT_USERNAME_PREFIX: &str = "csv_user_";

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// SQLite storage adapter.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Create a new SQLite storage with the given database path.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS respondents (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                gender TEXT,
                department TEXT,
                position TEXT NOT NULL DEFAULT 'Staff',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS responses (
                id TEXT PRIMARY KEY,
                respondent_id TEXT NOT NULL REFERENCES respondents(id),
                stress_composite REAL NOT NULL,
                productivity_composite REAL NOT NULL,
                workload REAL NOT NULL,
                role_ambiguity REAL NOT NULL,
                job_security REAL NOT NULL,
                gender_discrim REAL NOT NULL,
                interpersonal REAL NOT NULL,
                resources REAL NOT NULL,
                satisfaction REAL NOT NULL,
                support REAL NOT NULL,
                timings REAL NOT NULL,
                supervisor REAL NOT NULL,
                compensation REAL NOT NULL,
                systems REAL NOT NULL,
                raw_answers TEXT NOT NULL,
                submitted_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_responses_submitted
                ON responses(submitted_at DESC);
            ",
        )?;

        Ok(())
    }

    /// Pull one construct score out of a record by column key.
    fn construct_value(scores: &SurveyScores, key: &str) -> Result<f64, StorageError> {
        scores
            .construct(key)
            .ok_or_else(|| StorageError::Serialization(format!("record missing construct '{key}'")))
    }

    fn respondent_from_row(row: &Row<'_>) -> rusqlite::Result<Respondent> {
        let created_at_str: String = row.get(5)?;
        Ok(Respondent {
            id: row.get(0)?,
            username: row.get(1)?,
            gender: row.get(2)?,
            department: row.get(3)?,
            position: row.get(4)?,
            created_at: parse_timestamp(&created_at_str),
        })
    }

    /// Build a record from a row selected with [`RECORD_COLUMNS`].
    fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ScoredRecord> {
        let id: String = row.get(0)?;
        let respondent_id: String = row.get(1)?;
        let stress_composite: f64 = row.get(2)?;
        let productivity_composite: f64 = row.get(3)?;

        let mut stress = Vec::with_capacity(STRESS_COLUMNS.len());
        for (i, (key, name)) in STRESS_COLUMNS.iter().enumerate() {
            stress.push(ConstructScore::new(*key, *name, row.get::<_, f64>(4 + i)?));
        }
        let mut productivity = Vec::with_capacity(PRODUCTIVITY_COLUMNS.len());
        for (i, (key, name)) in PRODUCTIVITY_COLUMNS.iter().enumerate() {
            productivity.push(ConstructScore::new(*key, *name, row.get::<_, f64>(12 + i)?));
        }

        let raw_answers_json: String = row.get(16)?;
        let raw_answers =
            serde_json::from_str(&raw_answers_json).unwrap_or_else(|_| RawAnswerSet::empty());

        let submitted_at_str: String = row.get(17)?;

        Ok(ScoredRecord {
            id,
            respondent_id,
            scores: SurveyScores {
                stress: DomainScores {
                    constructs: stress,
                    composite: stress_composite,
                },
                productivity: DomainScores {
                    constructs: productivity,
                    composite: productivity_composite,
                },
            },
            raw_answers,
            submitted_at: parse_timestamp(&submitted_at_str),
        })
    }
}

/// Column list matching [`SqliteStorage::record_from_row`] index order.
const RECORD_COLUMNS: &str = "id, respondent_id, stress_composite, productivity_composite, \
     workload, role_ambiguity, job_security, gender_discrim, interpersonal, \
     resources, satisfaction, support, timings, supervisor, compensation, \
     systems, raw_answers, submitted_at";

fn parse_timestamp(value: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or_else(|_| chrono::Utc::now())
}

impl Storage for SqliteStorage {
    type Error = StorageError;

    fn find_respondent(&self, username: &str) -> Result<Option<Respondent>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let mut stmt = conn.prepare(
            "SELECT id, username, gender, department, position, created_at
             FROM respondents WHERE username = ?1",
        )?;

        match stmt.query_row(params![username], Self::respondent_from_row) {
            Ok(respondent) => Ok(Some(respondent)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn insert_respondent(&self, respondent: &Respondent) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute(
            r"
            INSERT INTO respondents (id, username, gender, department, position, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                respondent.id,
                respondent.username,
                respondent.gender,
                respondent.department,
                respondent.position,
                respondent.created_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!("Inserted respondent {}", respondent.username);
        Ok(())
    }

    fn count_respondents(&self) -> Result<usize, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM respondents", [], |row| row.get(0))?;

        Ok(count as usize)
    }

    fn save_record(&self, record: &ScoredRecord) -> Result<(), Self::Error> {
        let raw_answers = serde_json::to_string(&record.raw_answers)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let conn = self.conn.lock().expect("Lock failed");

        conn.execute(
            r"
            INSERT INTO responses (
                id, respondent_id, stress_composite, productivity_composite,
                workload, role_ambiguity, job_security, gender_discrim,
                interpersonal, resources, satisfaction, support,
                timings, supervisor, compensation, systems,
                raw_answers, submitted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            ",
            params![
                record.id,
                record.respondent_id,
                record.scores.stress.composite,
                record.scores.productivity.composite,
                Self::construct_value(&record.scores, "workload")?,
                Self::construct_value(&record.scores, "role_ambiguity")?,
                Self::construct_value(&record.scores, "job_security")?,
                Self::construct_value(&record.scores, "gender_discrim")?,
                Self::construct_value(&record.scores, "interpersonal")?,
                Self::construct_value(&record.scores, "resources")?,
                Self::construct_value(&record.scores, "satisfaction")?,
                Self::construct_value(&record.scores, "support")?,
                Self::construct_value(&record.scores, "timings")?,
                Self::construct_value(&record.scores, "supervisor")?,
                Self::construct_value(&record.scores, "compensation")?,
                Self::construct_value(&record.scores, "systems")?,
                raw_answers,
                record.submitted_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!("Saved record {} to storage", record.id);
        Ok(())
    }

    fn latest_record_for(&self, respondent_id: &str) -> Result<Option<ScoredRecord>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM responses
             WHERE respondent_id = ?1
             ORDER BY submitted_at DESC
             LIMIT 1"
        ))?;

        match stmt.query_row(params![respondent_id], Self::record_from_row) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn recent_records(&self, limit: usize) -> Result<Vec<ScoredRecord>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM responses
             ORDER BY submitted_at DESC
             LIMIT ?1"
        ))?;

        let records = stmt
            .query_map(params![limit as i64], Self::record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn count_records(&self) -> Result<usize, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;

        Ok(count as usize)
    }

    fn records_with_respondents(&self) -> Result<Vec<(Respondent, ScoredRecord)>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let mut stmt = conn.prepare(
            "SELECT u.id, u.username, u.gender, u.department, u.position, u.created_at,
                    r.id, r.respondent_id, r.stress_composite, r.productivity_composite,
                    r.workload, r.role_ambiguity, r.job_security, r.gender_discrim,
                    r.interpersonal, r.resources, r.satisfaction, r.support,
                    r.timings, r.supervisor, r.compensation, r.systems,
                    r.raw_answers, r.submitted_at
             FROM responses r
             JOIN respondents u ON r.respondent_id = u.id
             ORDER BY r.submitted_at DESC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                let created_at_str: String = row.get(5)?;
                let respondent = Respondent {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    gender: row.get(2)?,
                    department: row.get(3)?,
                    position: row.get(4)?,
                    created_at: parse_timestamp(&created_at_str),
                };

                let mut stress = Vec::with_capacity(STRESS_COLUMNS.len());
                for (i, (key, name)) in STRESS_COLUMNS.iter().enumerate() {
                    stress.push(ConstructScore::new(*key, *name, row.get::<_, f64>(10 + i)?));
                }
                let mut productivity = Vec::with_capacity(PRODUCTIVITY_COLUMNS.len());
                for (i, (key, name)) in PRODUCTIVITY_COLUMNS.iter().enumerate() {
                    productivity.push(ConstructScore::new(*key, *name, row.get::<_, f64>(18 + i)?));
                }

                let raw_answers_json: String = row.get(22)?;
                let raw_answers = serde_json::from_str(&raw_answers_json)
                    .unwrap_or_else(|_| RawAnswerSet::empty());
                let submitted_at_str: String = row.get(23)?;

                let record = ScoredRecord {
                    id: row.get(6)?,
                    respondent_id: row.get(7)?,
                    scores: SurveyScores {
                        stress: DomainScores {
                            constructs: stress,
                            composite: row.get(8)?,
                        },
                        productivity: DomainScores {
                            constructs: productivity,
                            composite: row.get(9)?,
                        },
                    },
                    raw_answers,
                    submitted_at: parse_timestamp(&submitted_at_str),
                };

                Ok((respondent, record))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn delete_imported(&self) -> Result<usize, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let pattern = format!("{IMPORT_USERNAME_PREFIX}%");

        conn.execute(
            "DELETE FROM responses WHERE respondent_id IN
                 (SELECT id FROM respondents WHERE username LIKE ?1)",
            params![pattern],
        )?;
        let removed = conn.execute(
            "DELETE FROM respondents WHERE username LIKE ?1",
            params![pattern],
        )?;

        tracing::info!("Deleted {removed} imported respondents and their records");
        Ok(removed)
    }
}
