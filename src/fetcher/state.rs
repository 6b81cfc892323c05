//! Explicit per-team cache state.
//!
//! The on-disk artifacts encode a small state machine: no CSV at all, a
//! header-only CSV (empty team or a cached access-denied marker), or a
//! populated CSV. Classifying the files into a tagged state keeps the
//! validity rules readable instead of scattering file-existence checks.

use std::path::Path;

use super::roles::{parse_roles_csv, RoleRow, TeamRole};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamCacheState {
    /// No role CSV exists for the team.
    Unfetched,
    /// Header-only CSV: team fetched and known to have zero members, or the
    /// header-only marker written after a wholly failed fetch.
    EmptyCached,
    /// Every row carries `access_denied`: a complete failure cache.
    DeniedCached,
    /// One row per classified member.
    Populated(Vec<RoleRow>),
}

/// Classify a team's role CSV into its cache state.
#[must_use]
pub fn classify_roles_file(roles_csv: &Path) -> TeamCacheState {
    let Ok(content) = std::fs::read_to_string(roles_csv) else {
        return TeamCacheState::Unfetched;
    };

    let rows = parse_roles_csv(&content);
    if rows.is_empty() {
        return TeamCacheState::EmptyCached;
    }
    if rows.iter().all(|r| r.role == TeamRole::AccessDenied) {
        return TeamCacheState::DeniedCached;
    }
    TeamCacheState::Populated(rows)
}
