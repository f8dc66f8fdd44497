use serde::{Deserialize, Serialize};

use crate::model::mongodb::{serde_id_hex, Id};

/// One line of an election's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    #[serde(with = "serde_id_hex")]
    pub candidate_id: Id,
    pub candidate_name: String,
    /// Committed votes in this election.
    pub votes: u64,
}

/// Order results by descending votes, breaking ties by name.
pub fn rank(entries: &mut [ResultEntry]) {
    entries.sort_by(|a, b| {
        b.votes
            .cmp(&a.votes)
            .then_with(|| a.candidate_name.cmp(&b.candidate_name))
    });
}

/// Results in the shape charting libraries expect.
/// Only candidates with at least one vote are included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsFeed {
    pub labels: Vec<String>,
    pub votes: Vec<u64>,
}

impl From<&[ResultEntry]> for ResultsFeed {
    fn from(entries: &[ResultEntry]) -> Self {
        let (labels, votes) = entries
            .iter()
            .filter(|entry| entry.votes > 0)
            .map(|entry| (entry.candidate_name.clone(), entry.votes))
            .unzip();
        Self { labels, votes }
    }
}

/// Results as CSV with a `Candidate,Votes` header.
pub fn to_csv(entries: &[ResultEntry]) -> String {
    let mut csv = String::from("Candidate,Votes\r\n");
    for entry in entries {
        csv.push_str(&csv_field(&entry.candidate_name));
        csv.push(',');
        csv.push_str(&entry.votes.to_string());
        csv.push_str("\r\n");
    }
    csv
}

/// Quote a field if it contains a separator, a quote or a line break.
fn csv_field(field: &str) -> String {
    if field.contains(|c| matches!(c, ',' | '"' | '\r' | '\n')) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Download name for an election's results, in plain ASCII so it can go in
/// a `Content-Disposition` header as is.
pub fn csv_filename(title: &str) -> String {
    let stem = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>();
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "election_results.csv".to_string()
    } else {
        format!("{stem}_results.csv")
    }
}
