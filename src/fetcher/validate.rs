//! Completeness validation for cached role CSVs.
//!
//! Freshness alone is not enough to trust a role file; the row count is
//! checked against the team's known member list. The thresholds are
//! heuristics carried over unchanged: up to 5% of rows may be missing
//! before a re-fetch is forced, and a file whose rows are all
//! `access_denied` counts as a complete failure cache so known-forbidden
//! endpoints are not hammered on every run.

use std::path::Path;
use tracing::debug;

use super::roles::ROLE_CSV_HEADER;
use super::state::{classify_roles_file, TeamCacheState};

/// Fraction of expected members that must be present.
const COMPLETENESS_THRESHOLD: f64 = 0.95;

/// Whether a cached role CSV is complete enough to reuse.
#[must_use]
pub fn validate_roles_file(roles_csv: &Path, member_txt: &Path) -> bool {
    if !roles_csv.exists() {
        return false;
    }

    if !member_txt.exists() {
        // No member list means an empty team; the CSV must be exactly the
        // header line.
        return is_header_only(roles_csv);
    }

    let Ok(expected) = count_nonempty_lines(member_txt) else {
        return false;
    };
    if expected == 0 {
        return true;
    }

    match classify_roles_file(roles_csv) {
        TeamCacheState::Unfetched => false,
        TeamCacheState::DeniedCached => {
            debug!(
                "Roles file {} contains cached access_denied entries - valid cache",
                roles_csv.display()
            );
            true
        }
        TeamCacheState::EmptyCached => false,
        TeamCacheState::Populated(rows) => {
            #[allow(clippy::cast_precision_loss)]
            let complete = rows.len() as f64 >= expected as f64 * COMPLETENESS_THRESHOLD;
            if !complete {
                debug!(
                    "Roles file {} appears incomplete: {}/{} entries",
                    roles_csv.display(),
                    rows.len(),
                    expected
                );
            }
            complete
        }
    }
}

fn is_header_only(roles_csv: &Path) -> bool {
    let Ok(content) = std::fs::read_to_string(roles_csv) else {
        return false;
    };
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    lines.len() == 1 && lines[0] == ROLE_CSV_HEADER
}

fn count_nonempty_lines(path: &Path) -> std::io::Result<usize> {
    let content = std::fs::read_to_string(path)?;
    Ok(content.lines().filter(|l| !l.trim().is_empty()).count())
}
