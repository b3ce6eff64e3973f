use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::stats::RepositoryStats;

const APPROVAL_PREFIX: &str = "pr.review.approval.";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to read stats file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse stats file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Read every stats document produced by `collect`, in the given order.
pub fn load(paths: &[PathBuf]) -> Result<Vec<RepositoryStats>, ReportError> {
    paths
        .iter()
        .map(|path| {
            let contents = std::fs::read_to_string(path).map_err(|source| ReportError::FileRead {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str::<RepositoryStats>(&contents).map_err(|source| ReportError::Parse {
                path: path.clone(),
                source,
            })
        })
        .collect()
}

/// Render the approval summary as markdown.
///
/// Repositories without merged pull requests are left out. For the rest:
///
/// ```text
/// # org/repo
/// - Pull requests: 12
/// - Approvals total: 9
/// - Approvals alice: 6
/// - Approvals bob: 3
/// ```
pub fn render(documents: &[RepositoryStats]) -> String {
    let mut md = String::new();

    for doc in documents {
        let pulls = doc.data.get("pr").unwrap_or(0);
        if pulls < 1 {
            continue;
        }

        let _ = writeln!(md, "# {}", doc.repository);
        let _ = writeln!(md, "- Pull requests: {pulls}");
        let _ = writeln!(
            md,
            "- Approvals total: {}",
            doc.data.get("pr.review.approval").unwrap_or(0)
        );
        for (user, count) in approvals(doc) {
            let _ = writeln!(md, "- Approvals {user}: {count}");
        }
        md.push('\n');
    }

    md
}

/// Per-user approval counts, highest first; ties keep key order.
fn approvals(doc: &RepositoryStats) -> Vec<(&str, u64)> {
    let mut approvals: Vec<(&str, u64)> = doc
        .data
        .iter()
        .filter_map(|(key, count)| key.strip_prefix(APPROVAL_PREFIX).map(|user| (user, count)))
        .collect();
    approvals.sort_by(|a, b| b.1.cmp(&a.1));
    approvals
}

/// Write the rendered report to stdout (default) or to a file.
#[instrument(skip(markdown))]
pub fn output(markdown: &str, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing report to stdout");
            print!("{markdown}");
            Ok(())
        }
        Some(path) => {
            debug!(path = %path.display(), "writing report to file");
            std::fs::write(path, markdown)?;
            Ok(())
        }
    }
}
