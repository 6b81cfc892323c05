//! Orphan reconciliation.
//!
//! After a team-list refresh, per-team files may remain for teams that no
//! longer exist. Three namespaces are scanned (member txt, member JSON, role
//! CSV); any file whose stem is not a current team is deleted. Deletion
//! failures are logged, never fatal.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::layout::OrgLayout;

/// Remove per-team files for teams absent from `current_teams`.
/// Returns the number of files removed.
pub async fn clean_orphaned_files(layout: &OrgLayout, current_teams: &HashSet<String>) -> usize {
    let mut orphans: Vec<PathBuf> = Vec::new();
    collect_orphans(&layout.members_txt_dir(), "txt", current_teams, &mut orphans);
    collect_orphans(
        &layout.members_json_dir(),
        "json",
        current_teams,
        &mut orphans,
    );
    collect_orphans(&layout.roles_dir(), "csv", current_teams, &mut orphans);

    if orphans.is_empty() {
        return 0;
    }

    info!("Found {} orphaned files from deleted teams", orphans.len());
    let mut removed = 0;
    for path in orphans {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Removed orphaned file: {}", path.display());
                removed += 1;
            }
            Err(e) => warn!("Error removing {}: {e}", path.display()),
        }
    }
    removed
}

fn collect_orphans(
    dir: &Path,
    extension: &str,
    current_teams: &HashSet<String>,
    orphans: &mut Vec<PathBuf>,
) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !current_teams.contains(stem) {
            orphans.push(path);
        }
    }
}
