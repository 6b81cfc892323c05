//! Team roles and the role CSV format.
//!
//! The CSV is deliberately naive: `team_name,user_login,role` with no
//! quoting, assuming logins and team names never contain commas.

use std::fmt;
use std::str::FromStr;

/// Header line of every role CSV.
pub const ROLE_CSV_HEADER: &str = "team_name,user_login,role";

/// A member's standing within a specific team. Closed enumeration;
/// unrecognized stored strings parse to `Unknown` rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamRole {
    Member,
    Maintainer,
    AccessDenied,
    Unknown,
}

impl TeamRole {
    /// Map a stored role string to its variant; anything unrecognized is
    /// `Unknown` (the report layer has a display path for it).
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "member" => Self::Member,
            "maintainer" => Self::Maintainer,
            "access_denied" => Self::AccessDenied,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Maintainer => "maintainer",
            Self::AccessDenied => "access_denied",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeamRole {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

/// One user's relationship to one team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRow {
    pub team_name: String,
    pub user_login: String,
    pub role: TeamRole,
}

impl RoleRow {
    #[must_use]
    pub fn new(team_name: impl Into<String>, user_login: impl Into<String>, role: TeamRole) -> Self {
        Self {
            team_name: team_name.into(),
            user_login: user_login.into(),
            role,
        }
    }
}

/// Render rows to CSV text, header first. Header-only output models an
/// empty team or a cached access-denied marker.
#[must_use]
pub fn render_roles_csv(rows: &[RoleRow]) -> String {
    let mut out = String::from(ROLE_CSV_HEADER);
    out.push('\n');
    for row in rows {
        out.push_str(&row.team_name);
        out.push(',');
        out.push_str(&row.user_login);
        out.push(',');
        out.push_str(row.role.as_str());
        out.push('\n');
    }
    out
}

/// Parse role CSV content. Blank lines and the header are skipped; rows with
/// fewer than three fields are ignored.
#[must_use]
pub fn parse_roles_csv(content: &str) -> Vec<RoleRow> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != ROLE_CSV_HEADER)
        .filter_map(|line| {
            let mut fields = line.splitn(3, ',');
            let team = fields.next()?;
            let login = fields.next()?;
            let role = fields.next()?;
            Some(RoleRow::new(team, login, TeamRole::from_name(role)))
        })
        .collect()
}
