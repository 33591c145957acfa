//! Dependency-ordered success-path scenario.
//!
//! Three independent chains run against one tenant:
//!
//! 1. list default applications
//! 2. import → export
//! 3. create → get → delete → get (404)
//!
//! A failed step marks every step that depends on it as skipped, so one
//! report shows both the root failure and what could not be checked.

use log::{error, info, warn};
use std::fmt;

use crate::client::fixtures::Fixtures;
use crate::client::{ClientError, ClientResult, Credentials, RegistryClient};
use crate::descriptor::DocumentQuery;

/// A single check of the scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    ListDefaults,
    Import,
    Export,
    Create,
    Get,
    Delete,
    GetDeleted,
}

impl Step {
    pub const ALL: [Step; 7] = [
        Step::ListDefaults,
        Step::Import,
        Step::Export,
        Step::Create,
        Step::Get,
        Step::Delete,
        Step::GetDeleted,
    ];

    /// Step that must pass before this one can run.
    pub fn prerequisite(self) -> Option<Step> {
        match self {
            Step::ListDefaults | Step::Import | Step::Create => None,
            Step::Export => Some(Step::Import),
            Step::Get => Some(Step::Create),
            Step::Delete => Some(Step::Get),
            Step::GetDeleted => Some(Step::Delete),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Step::ListDefaults => "list default applications",
            Step::Import => "import application",
            Step::Export => "export application",
            Step::Create => "create application",
            Step::Get => "get application by id",
            Step::Delete => "delete application by id",
            Step::GetDeleted => "get deleted application",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Passed,
    Failed(String),
    Skipped { prerequisite: Step },
}

impl StepOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, StepOutcome::Passed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: Step,
    pub outcome: StepOutcome,
}

/// Outcome of every step for one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    pub tenant: String,
    pub steps: Vec<StepReport>,
}

impl ScenarioReport {
    fn new(tenant: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            steps: Vec::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.steps.len() == Step::ALL.len() && self.steps.iter().all(|s| s.outcome.is_passed())
    }

    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|report| report.step == step)
            .map(|report| &report.outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|report| matches!(report.outcome, StepOutcome::Failed(_)))
    }

    /// Record the result of a step, returning its value on success.
    fn record<T>(&mut self, step: Step, result: ClientResult<T>) -> Option<T> {
        match result {
            Ok(value) => {
                info!("[{}] {}: passed", self.tenant, step);
                self.steps.push(StepReport {
                    step,
                    outcome: StepOutcome::Passed,
                });
                Some(value)
            }
            Err(e) => {
                error!("[{}] {}: failed: {}", self.tenant, step, e);
                self.steps.push(StepReport {
                    step,
                    outcome: StepOutcome::Failed(e.to_string()),
                });
                None
            }
        }
    }

    fn skip<T>(&mut self, step: Step) -> Option<T> {
        // Every skippable step has a prerequisite
        let prerequisite = step.prerequisite().unwrap_or(step);
        warn!(
            "[{}] {}: skipped, '{}' did not pass",
            self.tenant, step, prerequisite
        );
        self.steps.push(StepReport {
            step,
            outcome: StepOutcome::Skipped { prerequisite },
        });
        None
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tenant {}:", self.tenant)?;
        for report in &self.steps {
            match &report.outcome {
                StepOutcome::Passed => writeln!(f, "  PASS  {}", report.step)?,
                StepOutcome::Failed(reason) => {
                    writeln!(f, "  FAIL  {}: {}", report.step, reason)?
                }
                StepOutcome::Skipped { prerequisite } => writeln!(
                    f,
                    "  SKIP  {} (requires {})",
                    report.step, prerequisite
                )?,
            }
        }
        Ok(())
    }
}

/// Runs the success-path scenario for one tenant.
#[derive(Debug)]
pub struct ScenarioRunner<'a> {
    client: &'a RegistryClient,
    credentials: Credentials,
    fixtures: Fixtures,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(client: &'a RegistryClient, credentials: Credentials) -> Self {
        let fixtures = Fixtures::for_tenant(&credentials.tenant);
        Self {
            client,
            credentials,
            fixtures,
        }
    }

    pub fn with_fixtures(mut self, fixtures: Fixtures) -> Self {
        self.fixtures = fixtures;
        self
    }

    pub async fn run(&self) -> ScenarioReport {
        let mut report = ScenarioReport::new(&self.credentials.tenant);
        info!(
            "Running application management scenario for tenant '{}' against {}",
            self.credentials.tenant,
            self.client.base_url()
        );

        report.record(Step::ListDefaults, self.check_default_applications().await);

        match report.record(Step::Import, self.import().await) {
            Some(id) => {
                report.record(Step::Export, self.check_export(&id).await);
            }
            None => {
                report.skip::<()>(Step::Export);
            }
        }

        let created = report.record(Step::Create, self.create().await);
        let fetched = match &created {
            Some(id) => report.record(Step::Get, self.check_get(id).await),
            None => report.skip(Step::Get),
        };
        let deleted = match (&created, fetched) {
            (Some(id), Some(())) => report.record(
                Step::Delete,
                self.client.delete_application(&self.credentials, id).await,
            ),
            _ => report.skip(Step::Delete),
        };
        match (&created, deleted) {
            (Some(id), Some(())) => {
                report.record(
                    Step::GetDeleted,
                    self.client.expect_not_found(&self.credentials, id).await,
                );
            }
            _ => {
                report.skip::<()>(Step::GetDeleted);
            }
        }

        report
    }

    async fn check_default_applications(&self) -> ClientResult<()> {
        let list = self.client.list_applications(&self.credentials).await?;
        for expected in self.fixtures.default_applications {
            if !list.contains_name(expected) {
                let listed: Vec<&str> = list.applications.iter().map(|a| a.name.as_str()).collect();
                return Err(ClientError::Mismatch {
                    check: "default application listed",
                    expected: expected.to_string(),
                    actual: listed.join(", "),
                });
            }
        }
        Ok(())
    }

    async fn import(&self) -> ClientResult<String> {
        self.client
            .import_application(
                &self.credentials,
                self.fixtures.import_file_name,
                self.fixtures.import_descriptor.as_bytes().to_vec(),
            )
            .await
    }

    async fn check_export(&self, id: &str) -> ClientResult<()> {
        let xml = self.client.export_application(&self.credentials, id).await?;
        let name = DocumentQuery::new(&xml).first_text("ApplicationName")?;
        match name {
            Some(name) if name == self.fixtures.imported_name => Ok(()),
            other => {
                error!("Unexpected export document: {}", xml);
                Err(ClientError::Mismatch {
                    check: "exported ApplicationName",
                    expected: self.fixtures.imported_name.to_string(),
                    actual: other.unwrap_or_else(|| "<missing>".to_string()),
                })
            }
        }
    }

    async fn create(&self) -> ClientResult<String> {
        let body = self
            .fixtures
            .create_payload()
            .map_err(|e| ClientError::Decode {
                operation: "create application",
                message: format!("invalid fixture: {}", e),
            })?;
        self.client
            .create_application(&self.credentials, &body)
            .await
    }

    async fn check_get(&self, id: &str) -> ClientResult<()> {
        let app = self.client.get_application(&self.credentials, id).await?;
        if app.name == self.fixtures.created_name {
            Ok(())
        } else {
            Err(ClientError::Mismatch {
                check: "application name",
                expected: self.fixtures.created_name.to_string(),
                actual: app.name,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prerequisites_form_chains() {
        assert_eq!(Step::Export.prerequisite(), Some(Step::Import));
        assert_eq!(Step::GetDeleted.prerequisite(), Some(Step::Delete));
        assert_eq!(Step::Create.prerequisite(), None);
    }

    #[test]
    fn failed_step_and_skipped_dependants() {
        let mut report = ScenarioReport::new("carbon.super");
        assert_eq!(report.record::<()>(Step::ListDefaults, Ok(())), Some(()));
        let failed: ClientResult<String> = Err(ClientError::MissingLocation {
            operation: "import application",
        });
        assert_eq!(report.record(Step::Import, failed), None);
        assert_eq!(report.skip::<()>(Step::Export), None);

        assert!(!report.passed());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(
            report.outcome(Step::Export),
            Some(&StepOutcome::Skipped {
                prerequisite: Step::Import
            })
        );
        let rendered = report.to_string();
        assert!(rendered.contains("FAIL  import application"));
        assert!(rendered.contains("SKIP  export application (requires import application)"));
    }

    #[test]
    fn partial_report_is_not_passed() {
        let mut report = ScenarioReport::new("carbon.super");
        report.record::<()>(Step::ListDefaults, Ok(()));
        assert!(!report.passed());
    }
}
