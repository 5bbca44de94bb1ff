//! Console and JSON reports of a probe run.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ProbeError;
use crate::harness::ProbeRun;
use crate::model::{ProbeCase, ProbeStatus};

const RED: &str = "\x1b[0;31m";
const GREEN: &str = "\x1b[0;32m";
const YELLOW: &str = "\x1b[1;33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

const RULE: &str = "────────────────────────────────────────────────────────────";

/// File name of the JSON report inside the run directory.
pub const JSON_REPORT_FILE: &str = "test_report.json";

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

/// Colored plain-text report: totals, per-suite lines, failed case details.
pub fn render_console(run: &ProbeRun) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_console(&mut out, run);
    out
}

fn write_console(out: &mut String, run: &ProbeRun) -> std::fmt::Result {
    let failed = run.count(ProbeStatus::Failed);
    let duration = (run.finished_at - run.started_at).num_milliseconds() as f64 / 1000.0;

    writeln!(out, "{BOLD}API probe report{RESET}")?;
    writeln!(out, "Target:   {}", run.base_url)?;
    writeln!(out, "Account:  {}", run.username)?;
    writeln!(out, "Started:  {}", run.started_at.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out, "Finished: {}", run.finished_at.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out, "Duration: {duration:.2}s")?;

    if !run.authenticated {
        let reason = run
            .login
            .as_ref()
            .map(|c| c.error_message.as_str())
            .filter(|m| !m.is_empty())
            .unwrap_or("unexpected login response");
        writeln!(out, "{RED}Login failed: {reason}{RESET}")?;
        writeln!(out, "{RED}No suites were run{RESET}")?;
        return Ok(());
    }

    writeln!(out, "{RULE}")?;
    writeln!(out, "  Total:     {}", run.total())?;
    writeln!(out, "  {GREEN}Passed:    {}{RESET}", run.count(ProbeStatus::Passed))?;
    writeln!(out, "  {RED}Failed:    {failed}{RESET}")?;
    writeln!(out, "  {YELLOW}Skipped:   {}{RESET}", run.count(ProbeStatus::Skipped))?;
    writeln!(out, "  {YELLOW}Blocked:   {}{RESET}", run.count(ProbeStatus::Blocked))?;
    writeln!(out, "  Pass rate: {:.1}%", run.pass_rate())?;
    writeln!(out, "{RULE}")?;

    for suite in &run.suites {
        let (mark, color) = if suite.count(ProbeStatus::Failed) == 0 {
            ("✓", GREEN)
        } else {
            ("✗", RED)
        };
        writeln!(
            out,
            "  {color}{mark} {}: {}/{} passed ({:.1}%){RESET}",
            suite.name,
            suite.count(ProbeStatus::Passed),
            suite.total(),
            suite.pass_rate()
        )?;
    }
    writeln!(out, "{RULE}")?;

    if failed > 0 {
        writeln!(out, "  Failed cases")?;
        for suite in &run.suites {
            let cases: Vec<&ProbeCase> = suite
                .cases
                .iter()
                .filter(|c| c.status == ProbeStatus::Failed)
                .collect();
            if cases.is_empty() {
                continue;
            }
            writeln!(out, "  {YELLOW}[{}]{RESET}", suite.name)?;
            for case in cases {
                writeln!(out, "    ✗ {}", case.name)?;
                writeln!(out, "      URL:    {}", case.request_url)?;
                match case.http_code {
                    Some(code) => writeln!(out, "      Status: {code}")?,
                    None => writeln!(out, "      Status: none")?,
                }
                writeln!(out, "      Error:  {}", case.error_message)?;
            }
        }
        writeln!(out, "{RULE}")?;
        writeln!(out, "{RED}{failed} case(s) failed{RESET}")?;
    } else {
        writeln!(out, "{GREEN}All probes passed{RESET}")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    start_time: String,
    end_time: String,
    duration_seconds: f64,
    authenticated: bool,
    success: bool,
    test_suites: Vec<JsonSuite<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonSuite<'a> {
    name: &'a str,
    total: usize,
    passed: usize,
    failed: usize,
    skipped: usize,
    blocked: usize,
    pass_rate: f64,
    tests: &'a [ProbeCase],
}

fn json_report(run: &ProbeRun) -> JsonReport<'_> {
    JsonReport {
        start_time: run.started_at.to_rfc3339(),
        end_time: run.finished_at.to_rfc3339(),
        duration_seconds: (run.finished_at - run.started_at).num_milliseconds() as f64 / 1000.0,
        authenticated: run.authenticated,
        success: run.success(),
        test_suites: run
            .suites
            .iter()
            .map(|suite| JsonSuite {
                name: suite.name,
                total: suite.total(),
                passed: suite.count(ProbeStatus::Passed),
                failed: suite.count(ProbeStatus::Failed),
                skipped: suite.count(ProbeStatus::Skipped),
                blocked: suite.count(ProbeStatus::Blocked),
                pass_rate: suite.pass_rate(),
                tests: &suite.cases,
            })
            .collect(),
    }
}

/// Write `test_results_<unix-ts>/test_report.json` under `output_dir` and
/// return the report path.
pub fn write_json(run: &ProbeRun, output_dir: &Path) -> Result<PathBuf, ProbeError> {
    let dir = output_dir.join(format!("test_results_{}", run.finished_at.timestamp()));
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(JSON_REPORT_FILE);
    let body = serde_json::to_string_pretty(&json_report(run))?;
    std::fs::write(&path, body)?;
    tracing::info!(path = %path.display(), "JSON report written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProbeSuite;
    use chrono::{Duration, TimeZone, Utc};

    fn run(cases: Vec<ProbeCase>) -> ProbeRun {
        let started_at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut suite = ProbeSuite::new("system health");
        suite.cases = cases;
        ProbeRun {
            base_url: "http://localhost:80".into(),
            username: "root".into(),
            started_at,
            finished_at: started_at + Duration::milliseconds(1500),
            login: None,
            authenticated: true,
            suites: vec![suite],
        }
    }

    fn case(name: &str, status: ProbeStatus, code: u16) -> ProbeCase {
        let mut case = ProbeCase::new(name, status, format!("http://localhost:80/{name}"));
        case.http_code = Some(code);
        case
    }

    #[test]
    fn console_lists_suites_and_failures() {
        let mut failed = case("swagger", ProbeStatus::Failed, 500);
        failed.error_message = "expected status [200, 301, 302], got 500".into();
        let text = render_console(&run(vec![case("health", ProbeStatus::Passed, 200), failed]));
        assert!(text.contains("system health: 1/2 passed (50.0%)"));
        assert!(text.contains("URL:    http://localhost:80/swagger"));
        assert!(text.contains("1 case(s) failed"));
    }

    #[test]
    fn console_reports_login_failure() {
        let mut failed_login = run(Vec::new());
        failed_login.authenticated = false;
        failed_login.suites.clear();
        let text = render_console(&failed_login);
        assert!(text.contains("Login failed"));
        assert!(!text.contains("Pass rate"));
    }

    #[test]
    fn json_report_lands_in_timestamped_directory() {
        let dir = tempfile::tempdir().unwrap();
        let run = run(vec![case("health", ProbeStatus::Passed, 200)]);
        let path = write_json(&run, dir.path()).unwrap();

        let expected_dir = format!("test_results_{}", run.finished_at.timestamp());
        assert!(path.ends_with(format!("{expected_dir}/{JSON_REPORT_FILE}")));

        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(report["duration_seconds"], 1.5);
        assert_eq!(report["success"], true);
        let suite = &report["test_suites"][0];
        assert_eq!(suite["name"], "system health");
        assert_eq!(suite["passed"], 1);
        assert_eq!(suite["tests"][0]["status"], "PASSED");
        assert_eq!(suite["tests"][0]["http_code"], 200);
        assert!(suite["tests"][0].get("response").is_none());
    }
}
