//! The fetch controller.
//!
//! Orchestrates the three resource kinds under the caching discipline: team
//! list, organization members, and per-team membership with roles. The
//! freshness oracle gates each network-bound step; results are written
//! atomically so a run can be interrupted at any point without corrupting
//! the cache. Canonical files are produced even for empty or failed results,
//! letting later runs tell "fetched, empty" apart from "not yet fetched".

use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::freshness::{FreshnessOracle, DEFAULT_CACHE_HOURS};
use super::layout::OrgLayout;
use super::orphan::clean_orphaned_files;
use super::roles::{render_roles_csv, RoleRow, TeamRole};
use super::validate::validate_roles_file;
use super::FetchError;
use crate::config::AppConfig;
use crate::metadata::MetadataStore;
use crate::source::{CommandError, CommandRunner, Invoker};
use crate::utils::atomic_write;

#[derive(Deserialize)]
struct TeamRecord {
    name: String,
}

#[derive(Deserialize)]
struct MemberRecord {
    login: String,
}

/// Run-scoped options from the CLI.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub force_refresh: bool,
    pub cache_hours: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            force_refresh: false,
            cache_hours: DEFAULT_CACHE_HOURS,
        }
    }
}

impl FetchOptions {
    #[must_use]
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.cache_hours * 3600)
    }
}

/// Outcome of a multi-organization run.
#[derive(Debug, Default)]
pub struct FetchSummary {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl FetchSummary {
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Single-organization fetch controller.
pub struct Fetcher<I: Invoker> {
    org: String,
    layout: OrgLayout,
    runner: CommandRunner<I>,
    metadata: MetadataStore,
    oracle: FreshnessOracle,
}

impl<I: Invoker> Fetcher<I> {
    pub async fn new(
        config: &AppConfig,
        organization: &str,
        invoker: I,
        options: FetchOptions,
    ) -> Result<Self, FetchError> {
        let layout = OrgLayout::new(config.storage_root(), organization);
        layout.ensure_dirs().await?;
        let metadata = MetadataStore::open(layout.org_root()).await?;
        let runner = CommandRunner::new(invoker, config.api.command.clone(), config.api.max_retries);
        let oracle = FreshnessOracle::new(options.force_refresh, options.max_age());
        Ok(Self {
            org: organization.to_string(),
            layout,
            runner,
            metadata,
            oracle,
        })
    }

    #[must_use]
    pub fn layout(&self) -> &OrgLayout {
        &self.layout
    }

    #[must_use]
    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    /// Invoke the data-source command against an API endpoint, tracking the
    /// call in the usage counters regardless of outcome.
    async fn run_api(&self, endpoint: &str, extra_args: &[&str]) -> Result<String, CommandError> {
        let mut args = vec![
            "api".to_string(),
            endpoint.to_string(),
            "--paginate".to_string(),
        ];
        args.extend(extra_args.iter().map(ToString::to_string));

        let result = self.runner.run(&args).await;
        if let Err(e) = self.metadata.track_api_call(endpoint).await {
            warn!("Could not track API call for {endpoint}: {e}");
        }
        result
    }

    async fn record_success(&self, resource_type: &str, raw: &str) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
            if self.metadata.has_checksum_changed(resource_type, &value).await {
                debug!("Content changed for resource: {resource_type}");
            }
            if let Err(e) = self.metadata.update_checksum(resource_type, &value).await {
                warn!("Could not update checksum for {resource_type}: {e}");
            }
        }
        if let Err(e) = self.metadata.update_timestamp(resource_type).await {
            warn!("Could not update timestamp for {resource_type}: {e}");
        }
    }

    /// Fetch the team list with caching.
    pub async fn fetch_teams(&self) -> Result<(), FetchError> {
        let teams_json = self.layout.teams_json();
        let teams_txt = self.layout.team_names_txt();

        if self.oracle.is_fresh(&teams_json) && self.oracle.is_fresh(&teams_txt) {
            info!("Using cached team data (fresh)");
            return Ok(());
        }

        info!("Fetching team list for organization: {}", self.org);
        let output = self
            .run_api(&format!("orgs/{}/teams", self.org), &[])
            .await?;

        // Raw payload is persisted before parsing; a parse failure fails the
        // step but leaves the response on disk for inspection.
        atomic_write(&teams_json, &output).await?;

        let records: Vec<TeamRecord> =
            serde_json::from_str(&output).map_err(|source| FetchError::Parse {
                resource: "team list".to_string(),
                source,
            })?;

        let mut names: Vec<String> = records.into_iter().map(|t| t.name).collect();
        names.sort();
        atomic_write(&teams_txt, &to_name_lines(&names)).await?;

        self.record_success("teams", &output).await;
        info!("Fetched {} teams", names.len());
        Ok(())
    }

    /// Fetch organization members with caching.
    pub async fn fetch_organization_members(&self) -> Result<(), FetchError> {
        let org_json = self.layout.org_members_json();
        let org_txt = self.layout.org_member_names_txt();

        if self.oracle.is_fresh(&org_json) && self.oracle.is_fresh(&org_txt) {
            info!("Using cached organization member data (fresh)");
            return Ok(());
        }

        info!("Fetching organization members for: {}", self.org);
        let output = self
            .run_api(&format!("orgs/{}/members", self.org), &[])
            .await?;

        atomic_write(&org_json, &output).await?;

        let records: Vec<MemberRecord> =
            serde_json::from_str(&output).map_err(|source| FetchError::Parse {
                resource: "organization members".to_string(),
                source,
            })?;

        let mut logins: Vec<String> = records.into_iter().map(|m| m.login).collect();
        logins.sort();
        atomic_write(&org_txt, &to_name_lines(&logins)).await?;

        self.record_success("organization_members", &output).await;
        info!("Fetched {} organization members", logins.len());
        Ok(())
    }

    /// Fetch plain membership for one team with caching.
    ///
    /// Empty teams have no txt file, so a fresh JSON parsing to an empty
    /// array also counts as a cache hit.
    pub async fn fetch_team_members(&self, team: &str) -> Result<(), FetchError> {
        let member_json = self.layout.member_json(team);
        let member_txt = self.layout.member_txt(team);

        if self.oracle.is_fresh(&member_json) {
            if member_txt.exists() {
                if self.oracle.is_fresh(&member_txt) {
                    return Ok(());
                }
            } else if is_cached_empty_team(&member_json) {
                debug!("Using cached empty team data for: {team}");
                return Ok(());
            }
        }

        info!("Fetching members for team: {team}");
        let output = self
            .run_api(&format!("orgs/{}/teams/{team}/members", self.org), &[])
            .await?;

        atomic_write(&member_json, &output).await?;

        let records: Vec<MemberRecord> =
            serde_json::from_str(&output).map_err(|source| FetchError::Parse {
                resource: format!("members of team '{team}'"),
                source,
            })?;

        if records.is_empty() {
            debug!("Team {team} has 0 members");
            if member_txt.exists() {
                tokio::fs::remove_file(&member_txt).await?;
            }
        } else {
            let mut logins: Vec<String> = records.into_iter().map(|m| m.login).collect();
            logins.sort();
            debug!("Team {team} has {} members", logins.len());
            atomic_write(&member_txt, &to_name_lines(&logins)).await?;
        }

        Ok(())
    }

    /// Fetch one team's membership with roles, under the combined
    /// freshness-and-completeness cache discipline.
    ///
    /// Total fetch failure is converted into a cached header-only CSV so
    /// later runs short-circuit instead of re-querying a denied endpoint.
    pub async fn fetch_team_members_with_roles(&self, team: &str) -> Result<(), FetchError> {
        let roles_csv = self.layout.roles_csv(team);
        let member_txt = self.layout.member_txt(team);

        if self.oracle.is_fresh(&roles_csv) && validate_roles_file(&roles_csv, &member_txt) {
            return Ok(());
        }

        if !member_txt.exists() {
            // No member list means an empty team: cache that fact
            info!("No member file for team: {team} (empty team)");
            atomic_write(&roles_csv, &render_roles_csv(&[])).await?;
            return Ok(());
        }

        info!("Fetching roles for team: {team}");
        let endpoint = format!("orgs/{}/teams/{team}/members", self.org);
        let members_output = match self.run_api(&endpoint, &[]).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to fetch team members for {team}: {e}");
                atomic_write(&roles_csv, &render_roles_csv(&[])).await?;
                debug!("Created empty cache file for inaccessible team {team}");
                return Ok(());
            }
        };

        let members_data: Vec<serde_json::Value> =
            serde_json::from_str(&members_output).map_err(|source| FetchError::Parse {
                resource: format!("team members for '{team}'"),
                source,
            })?;

        if members_data.is_empty() {
            info!("No members found for team: {team}");
            atomic_write(&roles_csv, &render_roles_csv(&[])).await?;
            return Ok(());
        }

        debug!("Processing {} members via bulk API", members_data.len());
        let maintainers = self.fetch_maintainer_set(&endpoint, team).await;

        let mut rows: Vec<RoleRow> = Vec::new();
        let mut member_names: Vec<String> = Vec::new();
        for member in &members_data {
            let Some(login) = member
                .get("login")
                .and_then(serde_json::Value::as_str)
                .filter(|l| !l.is_empty())
            else {
                continue;
            };
            let role = if maintainers.contains(login) {
                TeamRole::Maintainer
            } else {
                TeamRole::Member
            };
            rows.push(RoleRow::new(team, login, role));
            member_names.push(login.to_string());
        }

        // Reuse the same payload for the plain member files so no duplicate
        // API round-trip is needed
        self.update_member_files(team, &members_output, &member_names)
            .await;

        atomic_write(&roles_csv, &render_roles_csv(&rows)).await?;
        info!("Successfully processed {} members for team {team}", rows.len());
        Ok(())
    }

    /// Second, maintainer-scoped query used to classify roles. A failed or
    /// unparsable response degrades every member to role `member`; the
    /// stored strings drive downstream reports, so this fallback is kept
    /// exactly as-is.
    async fn fetch_maintainer_set(&self, endpoint: &str, team: &str) -> HashSet<String> {
        match self.run_api(endpoint, &["-f", "role=maintainer"]).await {
            Ok(output) => match serde_json::from_str::<Vec<MemberRecord>>(&output) {
                Ok(records) => records.into_iter().map(|m| m.login).collect(),
                Err(e) => {
                    warn!("Could not parse maintainers data for {team}: {e}");
                    HashSet::new()
                }
            },
            Err(e) => {
                warn!("Could not fetch maintainers for {team}: {e}");
                HashSet::new()
            }
        }
    }

    /// Regenerate the plain member JSON/txt files from a roles-path payload.
    /// Failures here are warnings; the role CSV is the canonical output.
    async fn update_member_files(&self, team: &str, raw_json: &str, member_names: &[String]) {
        let member_json = self.layout.member_json(team);
        if let Err(e) = atomic_write(&member_json, raw_json).await {
            warn!("Could not update member JSON for {team}: {e}");
        }

        let member_txt = self.layout.member_txt(team);
        if member_names.is_empty() {
            if member_txt.exists() {
                if let Err(e) = tokio::fs::remove_file(&member_txt).await {
                    warn!("Could not remove member txt for empty team {team}: {e}");
                }
            }
        } else {
            let mut sorted = member_names.to_vec();
            sorted.sort();
            if let Err(e) = atomic_write(&member_txt, &to_name_lines(&sorted)).await {
                warn!("Could not update member txt for {team}: {e}");
            }
        }
    }

    /// Current team names from the persisted name list.
    pub fn read_team_names(&self) -> Result<Vec<String>, FetchError> {
        let path = self.layout.team_names_txt();
        if !path.exists() {
            return Err(FetchError::MissingTeamList(self.org.clone()));
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(ToString::to_string)
            .collect())
    }

    /// Full fetch cycle for this organization.
    ///
    /// Whole-resource failures (team list, org members) abort the run;
    /// per-team failures log a warning, fall back to a plain membership
    /// fetch, and continue.
    pub async fn fetch_all(&self) -> Result<(), FetchError> {
        info!("Starting smart data fetch for organization: {}", self.org);

        self.fetch_teams().await?;

        let teams = self.read_team_names()?;
        let team_set: HashSet<String> = teams.iter().cloned().collect();
        clean_orphaned_files(&self.layout, &team_set).await;

        self.fetch_organization_members().await?;

        info!("Processing {} teams", teams.len());
        for team in &teams {
            if let Err(e) = self.fetch_team_members_with_roles(team).await {
                warn!("Failed to fetch roles for team {team}: {e}");
                if let Err(e) = self.fetch_team_members(team).await {
                    warn!("Failed to fetch basic members for team {team}: {e}");
                }
            }
        }

        info!("Smart data fetch completed for organization: {}", self.org);
        Ok(())
    }
}

/// Run the full fetch cycle for every configured organization.
/// Per-organization failures are captured in the summary, never propagated.
pub async fn fetch_all_organizations<I>(
    config: &AppConfig,
    options: FetchOptions,
    invoker: I,
) -> FetchSummary
where
    I: Invoker + Clone,
{
    let organizations = config.organizations();
    info!(
        "Starting multi-organization data fetch for {} organizations",
        organizations.len()
    );

    let mut summary = FetchSummary::default();
    for org in organizations {
        info!("Processing organization: {org}");
        let outcome = match Fetcher::new(config, org, invoker.clone(), options).await {
            Ok(fetcher) => fetcher.fetch_all().await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(()) => {
                info!("Successfully processed organization: {org}");
                summary.succeeded.push(org.clone());
            }
            Err(e) => {
                error!("Failed to process organization {org}: {e}");
                summary.failed.push(org.clone());
            }
        }
    }

    info!(
        "Multi-organization fetch completed: {}/{} organizations succeeded",
        summary.succeeded.len(),
        organizations.len()
    );
    summary
}

fn to_name_lines(names: &[String]) -> String {
    names.iter().map(|n| format!("{n}\n")).collect()
}

fn is_cached_empty_team(member_json: &std::path::Path) -> bool {
    let Ok(content) = std::fs::read_to_string(member_json) else {
        return false;
    };
    matches!(
        serde_json::from_str::<serde_json::Value>(&content),
        Ok(serde_json::Value::Array(items)) if items.is_empty()
    )
}
