//! Per-organization storage layout.
//!
//! All fetched artifacts live as flat files under `<root>/<org>/`:
//!
//! ```text
//! teams/all_teams.json          raw team list payload
//! teams/team_names.txt          sorted, newline-delimited team names
//! organization/all_members.json raw org member payload
//! organization/member_names.txt sorted, newline-delimited logins
//! members/json/<team>.json      raw per-team member payload
//! members/txt/<team>.txt        sorted per-team logins
//! members-with-roles/<team>.csv team_name,user_login,role rows
//! metadata/*.yaml               timestamps, checksums, API usage
//! cache/                        scratch artifacts, age-swept
//! ```

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone)]
pub struct OrgLayout {
    root: PathBuf,
}

impl OrgLayout {
    #[must_use]
    pub fn new(storage_root: &Path, organization: &str) -> Self {
        Self {
            root: storage_root.join(organization),
        }
    }

    #[must_use]
    pub fn org_root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn teams_dir(&self) -> PathBuf {
        self.root.join("teams")
    }

    #[must_use]
    pub fn teams_json(&self) -> PathBuf {
        self.teams_dir().join("all_teams.json")
    }

    #[must_use]
    pub fn team_names_txt(&self) -> PathBuf {
        self.teams_dir().join("team_names.txt")
    }

    #[must_use]
    pub fn organization_dir(&self) -> PathBuf {
        self.root.join("organization")
    }

    #[must_use]
    pub fn org_members_json(&self) -> PathBuf {
        self.organization_dir().join("all_members.json")
    }

    #[must_use]
    pub fn org_member_names_txt(&self) -> PathBuf {
        self.organization_dir().join("member_names.txt")
    }

    #[must_use]
    pub fn members_json_dir(&self) -> PathBuf {
        self.root.join("members").join("json")
    }

    #[must_use]
    pub fn members_txt_dir(&self) -> PathBuf {
        self.root.join("members").join("txt")
    }

    #[must_use]
    pub fn member_json(&self, team: &str) -> PathBuf {
        self.members_json_dir().join(format!("{team}.json"))
    }

    #[must_use]
    pub fn member_txt(&self, team: &str) -> PathBuf {
        self.members_txt_dir().join(format!("{team}.txt"))
    }

    #[must_use]
    pub fn roles_dir(&self) -> PathBuf {
        self.root.join("members-with-roles")
    }

    #[must_use]
    pub fn roles_csv(&self, team: &str) -> PathBuf {
        self.roles_dir().join(format!("{team}.csv"))
    }

    /// Create every directory the fetch cycle writes into.
    pub async fn ensure_dirs(&self) -> io::Result<()> {
        for dir in [
            self.teams_dir(),
            self.organization_dir(),
            self.members_json_dir(),
            self.members_txt_dir(),
            self.roles_dir(),
        ] {
            fs::create_dir_all(&dir).await?;
        }
        Ok(())
    }
}
