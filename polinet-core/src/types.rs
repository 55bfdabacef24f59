use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The four affiliation labels reported by the classification API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Conservative,
    Green,
    Liberal,
    Libertarian,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Conservative,
        Category::Green,
        Category::Liberal,
        Category::Libertarian,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Conservative => "Conservative",
            Category::Green => "Green",
            Category::Liberal => "Liberal",
            Category::Libertarian => "Libertarian",
        }
    }

    pub fn from_label(label: &str) -> Option<Category> {
        match label {
            "Conservative" => Some(Category::Conservative),
            "Green" => Some(Category::Green),
            "Liberal" => Some(Category::Liberal),
            "Libertarian" => Some(Category::Libertarian),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-category confidence scores in [0, 1]. Categories are
/// independent confidences, not a distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreVector(BTreeMap<Category, f64>);

impl ScoreVector {
    pub fn new(scores: BTreeMap<Category, f64>) -> Self {
        Self(scores)
    }

    pub fn get(&self, category: Category) -> f64 {
        self.0.get(&category).copied().unwrap_or(0.0)
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.keys().copied()
    }

    /// Per-category arithmetic mean. Returns `None` for an empty slice;
    /// the caller decides whether that drops a row or fails a scan.
    pub fn mean_of(vectors: &[ScoreVector]) -> Option<ScoreVector> {
        if vectors.is_empty() {
            return None;
        }
        let n = vectors.len() as f64;
        let scores = Category::ALL
            .iter()
            .map(|&category| {
                let total: f64 = vectors.iter().map(|v| v.get(category)).sum();
                (category, total / n)
            })
            .collect();
        Some(ScoreVector(scores))
    }
}

/// A single unit of user-generated text, immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub text: String,
}

/// One aggregate score row, keyed by user identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserScoreRow {
    pub user: String,
    pub scores: ScoreVector,
}

/// One network scan's outcome: ordered rows, unique per user.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NetworkResultTable {
    rows: Vec<UserScoreRow>,
}

impl NetworkResultTable {
    /// Builds a table from rows, averaging duplicate user identifiers.
    /// Platforms occasionally return the same connection twice; first-seen
    /// order is preserved.
    pub fn from_rows(rows: Vec<UserScoreRow>) -> Self {
        let mut order: Vec<String> = Vec::new();
        let mut grouped: BTreeMap<String, Vec<ScoreVector>> = BTreeMap::new();
        for row in rows {
            if !grouped.contains_key(&row.user) {
                order.push(row.user.clone());
            }
            grouped.entry(row.user).or_default().push(row.scores);
        }

        let rows = order
            .into_iter()
            .filter_map(|user| {
                let vectors = grouped.remove(&user)?;
                let scores = ScoreVector::mean_of(&vectors)?;
                Some(UserScoreRow { user, scores })
            })
            .collect();

        Self { rows }
    }

    pub fn rows(&self) -> &[UserScoreRow] {
        &self.rows
    }

    pub fn get(&self, user: &str) -> Option<&UserScoreRow> {
        self.rows.iter().find(|row| row.user == user)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Aggregation strategy for one scan: score every post and average,
/// or concatenate the corpus and score it once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregationMode {
    PerPostMean,
    #[default]
    Corpus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(c: f64, g: f64, li: f64, lb: f64) -> ScoreVector {
        ScoreVector::new(BTreeMap::from([
            (Category::Conservative, c),
            (Category::Green, g),
            (Category::Liberal, li),
            (Category::Libertarian, lb),
        ]))
    }

    #[test]
    fn category_labels_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.as_str()), Some(category));
        }
        assert_eq!(Category::from_label("Anarchist"), None);
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(ScoreVector::mean_of(&[]), None);
    }

    #[test]
    fn mean_of_averages_per_category() {
        let mean = ScoreVector::mean_of(&[
            vector(0.2, 0.4, 0.6, 0.8),
            vector(0.4, 0.6, 0.8, 1.0),
        ])
        .unwrap();

        assert!((mean.get(Category::Conservative) - 0.3).abs() < 1e-9);
        assert!((mean.get(Category::Green) - 0.5).abs() < 1e-9);
        assert!((mean.get(Category::Liberal) - 0.7).abs() < 1e-9);
        assert!((mean.get(Category::Libertarian) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn table_averages_duplicate_users_preserving_order() {
        let table = NetworkResultTable::from_rows(vec![
            UserScoreRow {
                user: "bob".to_string(),
                scores: vector(0.2, 0.2, 0.2, 0.2),
            },
            UserScoreRow {
                user: "carol".to_string(),
                scores: vector(0.5, 0.5, 0.5, 0.5),
            },
            UserScoreRow {
                user: "bob".to_string(),
                scores: vector(0.4, 0.4, 0.4, 0.4),
            },
        ]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].user, "bob");
        assert_eq!(table.rows()[1].user, "carol");
        let bob = table.get("bob").unwrap();
        assert!((bob.scores.get(Category::Green) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn table_schema_is_stable_across_rows() {
        let table = NetworkResultTable::from_rows(vec![
            UserScoreRow {
                user: "bob".to_string(),
                scores: vector(0.1, 0.2, 0.3, 0.4),
            },
            UserScoreRow {
                user: "carol".to_string(),
                scores: vector(0.9, 0.8, 0.7, 0.6),
            },
        ]);

        for row in table.rows() {
            let categories: Vec<Category> = row.scores.categories().collect();
            assert_eq!(categories, Category::ALL.to_vec());
        }
    }
}
