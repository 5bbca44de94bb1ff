//! Probe harness: login, then the fixed suite list, then a report.
//!
//! ```text
//! Unauthenticated --login ok--> Authenticated --suites--> Reported
//!        |                                                   ^
//!        +-------------------login failed--------------------+
//! ```
//!
//! No endpoint probe runs without a session token. Probes that need an
//! identifier from an earlier list response are recorded as skipped when
//! that list is empty.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::client::{extract_token, ProbeClient};
use crate::config::ProbeConfig;
use crate::error::ProbeError;
use crate::model::{Probe, ProbeCase, ProbeStatus, ProbeSuite};

const LOGIN_PATH: &str = "/api/v1/auth/login";
const ADMIN: &str = "/api/v1/admin";
const PAGE: &str = "page=1&page_size=10";

const INVALID_TOKEN: &str = "invalid_token_12345";
const DENIED: &[u16] = &[401, 403];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarnessState {
    Unauthenticated,
    Authenticated { token: String },
    Reported,
}

/// Everything a finished harness run produced.
#[derive(Debug, Clone)]
pub struct ProbeRun {
    pub base_url: String,
    pub username: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// The login probe, absent only if it was never attempted.
    pub login: Option<ProbeCase>,
    pub authenticated: bool,
    pub suites: Vec<ProbeSuite>,
}

impl ProbeRun {
    pub fn count(&self, status: ProbeStatus) -> usize {
        self.suites.iter().map(|s| s.count(status)).sum()
    }

    pub fn total(&self) -> usize {
        self.suites.iter().map(ProbeSuite::total).sum()
    }

    pub fn pass_rate(&self) -> f64 {
        crate::model::pass_rate(
            self.count(ProbeStatus::Passed),
            self.total() - self.count(ProbeStatus::Skipped),
        )
    }

    /// Login succeeded and no case failed.
    pub fn success(&self) -> bool {
        self.authenticated && self.count(ProbeStatus::Failed) == 0
    }
}

pub struct Harness {
    config: ProbeConfig,
    client: ProbeClient,
    state: HarnessState,
    started_at: DateTime<Utc>,
    login: Option<ProbeCase>,
    suites: Vec<ProbeSuite>,
}

impl Harness {
    pub fn new(config: ProbeConfig) -> Result<Self, ProbeError> {
        let client = ProbeClient::new(config.base_url.clone())?;
        Ok(Self {
            config,
            client,
            state: HarnessState::Unauthenticated,
            started_at: Utc::now(),
            login: None,
            suites: Vec::new(),
        })
    }

    pub fn state(&self) -> &HarnessState {
        &self.state
    }

    /// Log in and, on success, run every suite in order.
    pub async fn run(mut self) -> ProbeRun {
        tracing::info!(url = %self.config.base_url, username = %self.config.username, "Starting API probe");
        if self.login().await {
            self.run_suites().await;
        } else {
            tracing::error!("Login failed, no endpoint probes run");
        }
        self.report()
    }

    /// `Unauthenticated` -> `Authenticated` when the login response carries
    /// a session token.
    pub async fn login(&mut self) -> bool {
        let probe = Probe::post(
            LOGIN_PATH,
            "login",
            json!({ "identifier": self.config.username, "password": self.config.password }),
        )
        .anonymous();
        let mut case = self.client.send(&probe, None).await;
        log_case(&case);

        let token = if case.passed() {
            case.response.as_ref().and_then(extract_token)
        } else {
            None
        };
        let authenticated = match token {
            Some(token) => {
                let prefix: String = token.chars().take(12).collect();
                tracing::info!(token_prefix = %prefix, "Logged in");
                self.state = HarnessState::Authenticated { token };
                true
            }
            None => {
                if case.passed() {
                    tracing::warn!(response = ?case.response, "Login response carried no token");
                    case.status = ProbeStatus::Failed;
                    case.error_message = "login response carried no token".to_string();
                }
                false
            }
        };
        self.login = Some(case);
        authenticated
    }

    /// Freeze the results; the harness is `Reported` afterwards.
    fn report(mut self) -> ProbeRun {
        let authenticated = matches!(self.state, HarnessState::Authenticated { .. });
        self.state = HarnessState::Reported;
        ProbeRun {
            base_url: self.config.base_url,
            username: self.config.username,
            started_at: self.started_at,
            finished_at: Utc::now(),
            login: self.login,
            authenticated,
            suites: self.suites,
        }
    }

    fn session(&self) -> Option<&str> {
        match &self.state {
            HarnessState::Authenticated { token } => Some(token),
            _ => None,
        }
    }

    async fn probe(&self, suite: &mut ProbeSuite, probe: Probe) -> ProbeCase {
        let case = self.client.send(&probe, self.session()).await;
        log_case(&case);
        suite.cases.push(case.clone());
        case
    }

    fn skip(&self, suite: &mut ProbeSuite, path: &str, name: &str, reason: &str) {
        tracing::info!(suite = suite.name, probe = name, reason, "Probe skipped");
        suite
            .cases
            .push(ProbeCase::new(name, ProbeStatus::Skipped, self.config.url(path)).with_error(reason));
    }

    // -----------------------------------------------------------------------
    // Suites
    // -----------------------------------------------------------------------

    async fn run_suites(&mut self) {
        let suites = vec![
            self.system_health().await,
            self.authentication().await,
            self.user_management().await,
            self.rbac().await,
            self.basic_game_config().await,
            self.metadata_definitions().await,
            self.skill_system().await,
            self.effect_system().await,
            self.action_system().await,
            self.error_handling().await,
        ];
        self.suites = suites;
    }

    async fn system_health(&self) -> ProbeSuite {
        let mut suite = ProbeSuite::new("system health");
        self.probe(&mut suite, Probe::get("/health", "health check").anonymous())
            .await;
        self.probe(
            &mut suite,
            Probe::get("/swagger/index.html", "swagger docs reachable")
                .anonymous()
                .expecting(&[200, 301, 302]),
        )
        .await;
        suite
    }

    async fn authentication(&self) -> ProbeSuite {
        let mut suite = ProbeSuite::new("authentication");
        self.probe(&mut suite, Probe::get(format!("{ADMIN}/users/me"), "current user"))
            .await;
        suite
    }

    async fn user_management(&self) -> ProbeSuite {
        let mut suite = ProbeSuite::new("user management");
        let list = self
            .probe(&mut suite, Probe::get(format!("{ADMIN}/users?{PAGE}"), "list users"))
            .await;
        match list.first_item_id() {
            Some(id) => {
                self.probe(
                    &mut suite,
                    Probe::get(format!("{ADMIN}/users/{id}"), format!("user detail (id {id})")),
                )
                .await;
            }
            None => self.skip(&mut suite, &format!("{ADMIN}/users/{{id}}"), "user detail", "no users"),
        }
        suite
    }

    async fn rbac(&self) -> ProbeSuite {
        let mut suite = ProbeSuite::new("rbac");
        self.probe(&mut suite, Probe::get(format!("{ADMIN}/roles?{PAGE}"), "list roles"))
            .await;
        self.probe(
            &mut suite,
            Probe::get(format!("{ADMIN}/permissions?{PAGE}"), "list permissions"),
        )
        .await;
        self.probe(
            &mut suite,
            Probe::get(format!("{ADMIN}/permission-groups"), "list permission groups"),
        )
        .await;
        let users = self
            .probe(
                &mut suite,
                Probe::get(format!("{ADMIN}/users?page=1&page_size=1"), "first user for rbac"),
            )
            .await;
        match users.first_item_id() {
            Some(id) => {
                for (segment, label) in [("roles", "user roles"), ("permissions", "user permissions")] {
                    self.probe(
                        &mut suite,
                        Probe::get(format!("{ADMIN}/users/{id}/{segment}"), format!("{label} (id {id})")),
                    )
                    .await;
                }
            }
            None => {
                for (segment, label) in [("roles", "user roles"), ("permissions", "user permissions")] {
                    self.skip(&mut suite, &format!("{ADMIN}/users/{{id}}/{segment}"), label, "no users");
                }
            }
        }
        suite
    }

    async fn basic_game_config(&self) -> ProbeSuite {
        const LISTS: [(&str, &str); 7] = [
            ("classes", "list classes"),
            ("skill-categories", "list skill categories"),
            ("action-categories", "list action categories"),
            ("damage-types", "list damage types"),
            ("hero-attribute-types", "list hero attribute types"),
            ("tags", "list tags"),
            ("action-flags", "list action flags"),
        ];

        let mut suite = ProbeSuite::new("basic game config");
        for (segment, name) in LISTS {
            self.probe(&mut suite, Probe::get(format!("{ADMIN}/{segment}?{PAGE}"), name))
                .await;
        }
        let tags = self
            .probe(
                &mut suite,
                Probe::get(format!("{ADMIN}/tags?page=1&page_size=1"), "first tag for relations"),
            )
            .await;
        match tags.first_item_id() {
            Some(id) => {
                self.probe(
                    &mut suite,
                    Probe::get(format!("{ADMIN}/tags/{id}/entities"), format!("tag entities (tag {id})")),
                )
                .await;
            }
            None => self.skip(&mut suite, &format!("{ADMIN}/tags/{{id}}/entities"), "tag entities", "no tags"),
        }
        suite
    }

    async fn metadata_definitions(&self) -> ProbeSuite {
        const DEFINITIONS: [(&str, &str); 4] = [
            ("effect-type-definitions", "effect type definitions"),
            ("formula-variables", "formula variables"),
            ("range-config-rules", "range config rules"),
            ("action-type-definitions", "action type definitions"),
        ];

        let mut suite = ProbeSuite::new("metadata definitions");
        for (segment, label) in DEFINITIONS {
            self.probe(
                &mut suite,
                Probe::get(format!("{ADMIN}/metadata/{segment}?{PAGE}"), format!("{label} (paged)")),
            )
            .await;
            self.probe(
                &mut suite,
                Probe::get(format!("{ADMIN}/metadata/{segment}/all"), format!("{label} (all)")),
            )
            .await;
        }
        suite
    }

    async fn skill_system(&self) -> ProbeSuite {
        let mut suite = ProbeSuite::new("skill system");
        let list = self
            .probe(&mut suite, Probe::get(format!("{ADMIN}/skills?{PAGE}"), "list skills"))
            .await;
        self.detail_probes(
            &mut suite,
            list.first_item_id(),
            "skills",
            &[("", "skill detail"), ("/level-configs", "skill level configs"), ("/unlock-actions", "skill unlock actions")],
        )
        .await;
        suite
    }

    async fn effect_system(&self) -> ProbeSuite {
        let mut suite = ProbeSuite::new("effect system");
        self.probe(&mut suite, Probe::get(format!("{ADMIN}/effects?{PAGE}"), "list effects"))
            .await;
        let buffs = self
            .probe(&mut suite, Probe::get(format!("{ADMIN}/buffs?{PAGE}"), "list buffs"))
            .await;
        self.detail_probes(
            &mut suite,
            buffs.first_item_id(),
            "buffs",
            &[("", "buff detail"), ("/effects", "buff effects")],
        )
        .await;
        suite
    }

    async fn action_system(&self) -> ProbeSuite {
        let mut suite = ProbeSuite::new("action system");
        let list = self
            .probe(&mut suite, Probe::get(format!("{ADMIN}/actions?{PAGE}"), "list actions"))
            .await;
        self.detail_probes(
            &mut suite,
            list.first_item_id(),
            "actions",
            &[("", "action detail"), ("/effects", "action effects")],
        )
        .await;
        suite
    }

    async fn error_handling(&self) -> ProbeSuite {
        let mut suite = ProbeSuite::new("error handling");
        self.probe(
            &mut suite,
            Probe::get(format!("{ADMIN}/skills/999999"), "missing resource is 404").expecting(&[404]),
        )
        .await;
        self.probe(
            &mut suite,
            Probe::get(format!("{ADMIN}/skills?page=-1&page_size=0"), "invalid paging is handled")
                .expecting(&[200, 400]),
        )
        .await;
        self.probe(
            &mut suite,
            Probe::get(format!("{ADMIN}/users"), "unauthenticated access is denied")
                .anonymous()
                .expecting(DENIED),
        )
        .await;
        self.probe(
            &mut suite,
            Probe::get(format!("{ADMIN}/users"), "invalid token is denied")
                .with_token(INVALID_TOKEN)
                .expecting(DENIED),
        )
        .await;
        suite
    }

    /// Per-entity probes under `/{collection}/{id}`, skipped without an id.
    async fn detail_probes(
        &self,
        suite: &mut ProbeSuite,
        id: Option<String>,
        collection: &str,
        probes: &[(&str, &str)],
    ) {
        for (suffix, label) in probes {
            match &id {
                Some(id) => {
                    self.probe(
                        suite,
                        Probe::get(format!("{ADMIN}/{collection}/{id}{suffix}"), format!("{label} (id {id})")),
                    )
                    .await;
                }
                None => self.skip(
                    suite,
                    &format!("{ADMIN}/{collection}/{{id}}{suffix}"),
                    label,
                    &format!("no {collection}"),
                ),
            }
        }
    }
}

fn log_case(case: &ProbeCase) {
    match case.status {
        ProbeStatus::Passed => tracing::info!(
            probe = %case.name,
            http_code = ?case.http_code,
            elapsed_secs = case.response_time,
            "PASS"
        ),
        status => tracing::warn!(
            probe = %case.name,
            status = status.as_str(),
            http_code = ?case.http_code,
            error = %case.error_message,
            "Probe did not pass"
        ),
    }
}
