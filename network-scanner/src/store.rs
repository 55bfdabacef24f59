use polinet_core::{Category, CoreError, NetworkResultTable, ScoreVector, StoreError, UserScoreRow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// CSV row shape for both result files. Header order matches the
/// tables the visualization step consumes.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    user: String,
    #[serde(rename = "Conservative")]
    conservative: f64,
    #[serde(rename = "Green")]
    green: f64,
    #[serde(rename = "Liberal")]
    liberal: f64,
    #[serde(rename = "Libertarian")]
    libertarian: f64,
}

impl From<&UserScoreRow> for CsvRow {
    fn from(row: &UserScoreRow) -> Self {
        Self {
            user: row.user.clone(),
            conservative: row.scores.get(Category::Conservative),
            green: row.scores.get(Category::Green),
            liberal: row.scores.get(Category::Liberal),
            libertarian: row.scores.get(Category::Libertarian),
        }
    }
}

impl From<CsvRow> for UserScoreRow {
    fn from(row: CsvRow) -> Self {
        let scores = ScoreVector::new(BTreeMap::from([
            (Category::Conservative, row.conservative),
            (Category::Green, row.green),
            (Category::Liberal, row.liberal),
            (Category::Libertarian, row.libertarian),
        ]));
        Self {
            user: row.user,
            scores,
        }
    }
}

/// Durable per-seed results: a `{user}_self_agg.csv` and
/// `{user}_friends_agg.csv` pair under the data directory. Presence of
/// both files marks a seed as already scanned.
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn self_path(&self, user: &str) -> PathBuf {
        self.dir.join(format!("{user}_self_agg.csv"))
    }

    fn friends_path(&self, user: &str) -> PathBuf {
        self.dir.join(format!("{user}_friends_agg.csv"))
    }

    pub fn has_result(&self, user: &str) -> bool {
        self.self_path(user).exists() && self.friends_path(user).exists()
    }

    /// Loads a prior scan's outputs. Absent or corrupt files error so
    /// the caller can fall back to a fresh scan.
    pub fn load(&self, user: &str) -> Result<(UserScoreRow, NetworkResultTable), CoreError> {
        if !self.has_result(user) {
            return Err(StoreError::NotFound {
                user: user.to_string(),
            }
            .into());
        }

        let self_path = self.self_path(user);
        let mut self_rows = read_rows(&self_path)?;
        if self_rows.len() != 1 {
            return Err(StoreError::Corrupt {
                path: self_path.display().to_string(),
                details: format!("expected exactly one row, found {}", self_rows.len()),
            }
            .into());
        }
        let self_row = self_rows.remove(0);

        let rows = read_rows(&self.friends_path(user))?;
        debug!(user, rows = rows.len(), "Loaded stored results");
        Ok((self_row, NetworkResultTable::from_rows(rows)))
    }

    pub fn save(
        &self,
        user: &str,
        self_row: &UserScoreRow,
        table: &NetworkResultTable,
    ) -> Result<(), CoreError> {
        fs::create_dir_all(&self.dir).map_err(StoreError::Io)?;
        write_rows(&self.self_path(user), std::slice::from_ref(self_row))?;
        write_rows(&self.friends_path(user), table.rows())?;
        info!(user, rows = table.len(), "Persisted scan results");
        Ok(())
    }
}

fn read_rows(path: &Path) -> Result<Vec<UserScoreRow>, StoreError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize::<CsvRow>() {
        let record = record.map_err(|e| StoreError::Corrupt {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        rows.push(record.into());
    }
    Ok(rows)
}

fn write_rows(path: &Path, rows: &[UserScoreRow]) -> Result<(), StoreError> {
    // Write to a tmp sibling first so a partial write never looks like
    // a finished result file.
    let tmp = path.with_extension("tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp)?;
        for row in rows {
            writer.serialize(CsvRow::from(row))?;
        }
        writer.flush().map_err(StoreError::Io)?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
