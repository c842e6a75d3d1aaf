//! Config Transaction Use Case
//!
//! Reads, verifies and edits the routing file on the router. Every edit
//! follows the same template inside a single session:
//!
//! 1. copy the file to `<path>.bk`
//! 2. read and parse it
//! 3. locate the managed rule (never created when missing)
//! 4. apply the [`DomainEdit`]
//! 5. serialize the whole document and write it back
//!
//! Any failure aborts the remaining steps. The `.bk` copy is left in place
//! and is the only recovery path; nothing is restored automatically.

use std::sync::Arc;

use tracing::info;

use super::xkeen::{EXISTS_MARKER, XkeenCommandBuilder};
use crate::config::Credentials;
use crate::domain::ProgressFn;
use crate::domain::executor::CommandExecutor;
use crate::domain::gateway::SessionGateway;
use crate::domain::routing::{DomainEdit, RoutingConfig};
use crate::error::{Result, RouterError};
use crate::ports::{ReachabilityProbe, SshClientTrait, SshConnector};

/// Outcome of a successful edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationReport {
    /// Entries actually added or removed
    pub changed: usize,
    /// Managed rule's domain list as written
    pub domains: Vec<String>,
    /// Where the pre-edit copy was saved
    pub backup_path: String,
}

/// Proof that the backup copy succeeded in the current session.
/// Only [`ConfigTransaction::backup`] creates one and the write step
/// requires it.
struct BackupToken {
    backup_path: String,
}

pub struct ConfigTransaction<C, P> {
    gateway: Arc<SessionGateway<C, P>>,
    executor: CommandExecutor,
    managed_tag: String,
}

impl<C: SshConnector, P: ReachabilityProbe> ConfigTransaction<C, P> {
    pub fn new(gateway: Arc<SessionGateway<C, P>>, managed_tag: impl Into<String>) -> Self {
        let executor = CommandExecutor::new(gateway.limits().clone());
        Self {
            gateway,
            executor,
            managed_tag: managed_tag.into(),
        }
    }

    /// Check that the router is reachable, the login works and the routing
    /// file exists.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::ConfigNotFound`] if the existence check does
    /// not report the file, or any transport error.
    pub async fn verify(&self, credentials: &Credentials) -> Result<()> {
        let path = &credentials.config_path;
        self.gateway
            .with_session(credentials, async |session| {
                let check = XkeenCommandBuilder::build_exists_command(path);
                let output = self.executor.run_logged(session, &check).await?;
                if !output.contains(EXISTS_MARKER) {
                    return Err(RouterError::ConfigNotFound { path: path.clone() });
                }
                info!(path = %path, "Routing file present");
                Ok(())
            })
            .await
    }

    /// The managed rule's domains in file order; empty when no rule carries
    /// the managed tag or the rule has no domain list.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::Json`] on malformed content, or any
    /// transport/command error.
    pub async fn get_domains(&self, credentials: &Credentials) -> Result<Vec<String>> {
        self.gateway
            .with_session(credentials, async |session| {
                let document = self.read_document(session, &credentials.config_path).await?;
                Ok(document
                    .managed_rule(&self.managed_tag)
                    .and_then(|rule| rule.domain.clone())
                    .unwrap_or_default())
            })
            .await
    }

    /// # Errors
    ///
    /// See [`ConfigTransaction::apply`].
    pub async fn add_domains(
        &self,
        credentials: &Credentials,
        domains: &[String],
        progress: &ProgressFn<'_>,
    ) -> Result<MutationReport> {
        self.apply(credentials, DomainEdit::Add(domains.to_vec()), progress)
            .await
    }

    /// # Errors
    ///
    /// See [`ConfigTransaction::apply`].
    pub async fn remove_domains(
        &self,
        credentials: &Credentials,
        domains: &[String],
        progress: &ProgressFn<'_>,
    ) -> Result<MutationReport> {
        self.apply(credentials, DomainEdit::Remove(domains.to_vec()), progress)
            .await
    }

    /// Run the backup, read, edit, write template for `edit`.
    ///
    /// The file is written back even when the edit changes nothing.
    ///
    /// # Errors
    ///
    /// Fails at the first failing step: backup or read command errors,
    /// [`RouterError::Json`], [`RouterError::RuleNotFound`], or the write
    /// command error.
    pub async fn apply(
        &self,
        credentials: &Credentials,
        edit: DomainEdit,
        progress: &ProgressFn<'_>,
    ) -> Result<MutationReport> {
        let path = &credentials.config_path;
        self.gateway
            .with_session(credentials, async |session| {
                progress(&format!(
                    "Backing up {path} to {}",
                    XkeenCommandBuilder::backup_path(path)
                ));
                let token = self.backup(session, path).await?;

                let mut document = self.read_document(session, path).await?;
                let rule = document
                    .managed_rule_mut(&self.managed_tag)
                    .ok_or_else(|| self.rule_not_found())?;
                let changed = edit.apply(rule);
                let domains = rule.domain.clone().unwrap_or_default();

                let json = document.to_json_pretty()?;
                progress(&format!("Writing {path} ({} domains)", domains.len()));
                self.write(session, path, &json, &token).await?;

                info!(
                    path = %path,
                    changed,
                    total = domains.len(),
                    "Routing file updated"
                );
                Ok(MutationReport {
                    changed,
                    domains,
                    backup_path: token.backup_path,
                })
            })
            .await
    }

    async fn backup<S: SshClientTrait>(&self, session: &S, path: &str) -> Result<BackupToken> {
        self.executor
            .run_strict(session, &XkeenCommandBuilder::build_backup_command(path))
            .await?;
        Ok(BackupToken {
            backup_path: XkeenCommandBuilder::backup_path(path),
        })
    }

    async fn read_document<S: SshClientTrait>(
        &self,
        session: &S,
        path: &str,
    ) -> Result<RoutingConfig> {
        let text = self
            .executor
            .run_strict(session, &XkeenCommandBuilder::build_read_command(path))
            .await?;
        RoutingConfig::from_json(&text)
    }

    async fn write<S: SshClientTrait>(
        &self,
        session: &S,
        path: &str,
        content: &str,
        _backup: &BackupToken,
    ) -> Result<()> {
        self.executor
            .run_strict(
                session,
                &XkeenCommandBuilder::build_write_command(path, content),
            )
            .await?;
        Ok(())
    }

    fn rule_not_found(&self) -> RouterError {
        RouterError::RuleNotFound {
            tag: self.managed_tag.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LimitsConfig;
    use crate::ports::{MockProbe, MockSshConnector};
    use crate::ssh::CommandOutput;
    use std::sync::Mutex;

    const PATH: &str = "/opt/etc/xray/configs/05_routing.json";
    const SAMPLE: &str =
        r#"{"routing":{"rules":[{"type":"field","outboundTag":"vless-reality","domain":["a.com"]}]}}"#;

    fn transaction(
        connector: &MockSshConnector,
        probe: &MockProbe,
    ) -> ConfigTransaction<MockSshConnector, MockProbe> {
        let gateway = SessionGateway::new(connector.clone(), probe.clone(), LimitsConfig::default());
        ConfigTransaction::new(Arc::new(gateway), "vless-reality")
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    fn quiet(_: &str) {}

    fn is_write(cmd: &str) -> bool {
        cmd.starts_with("echo '")
    }

    // ============== verify ==============

    #[tokio::test]
    async fn test_verify_found() {
        let connector = MockSshConnector::new();
        connector.add_response(
            &XkeenCommandBuilder::build_exists_command(PATH),
            CommandOutput::stdout("exists\n"),
        );
        let tx = transaction(&connector, &MockProbe::reachable());
        tx.verify(&Credentials::default()).await.unwrap();
        assert_eq!(connector.close_count(), 1);
    }

    #[tokio::test]
    async fn test_verify_missing() {
        let connector = MockSshConnector::new();
        connector.add_response(
            &XkeenCommandBuilder::build_exists_command(PATH),
            CommandOutput::stdout("not_found\n"),
        );
        let tx = transaction(&connector, &MockProbe::reachable());
        let err = tx.verify(&Credentials::default()).await.unwrap_err();
        assert!(matches!(err, RouterError::ConfigNotFound { ref path } if path == PATH));
    }

    #[tokio::test]
    async fn test_verify_tolerates_stderr_noise() {
        let connector = MockSshConnector::new();
        connector.add_response(
            &XkeenCommandBuilder::build_exists_command(PATH),
            CommandOutput::stdout("exists\n").with_stderr("warning: locale"),
        );
        let tx = transaction(&connector, &MockProbe::reachable());
        assert!(tx.verify(&Credentials::default()).await.is_ok());
    }

    // ============== get_domains ==============

    #[tokio::test]
    async fn test_get_domains() {
        let connector = MockSshConnector::new();
        connector.add_response(&format!("cat {PATH}"), CommandOutput::stdout(SAMPLE));
        let tx = transaction(&connector, &MockProbe::reachable());
        let domains = tx.get_domains(&Credentials::default()).await.unwrap();
        assert_eq!(domains, strings(&["a.com"]));
        assert_eq!(connector.executed(), vec![format!("cat {PATH}")]);
    }

    #[tokio::test]
    async fn test_get_domains_rule_without_domains() {
        let connector = MockSshConnector::new();
        connector.add_response(
            &format!("cat {PATH}"),
            CommandOutput::stdout(r#"{"routing":{"rules":[{"type":"field","outboundTag":"vless-reality"}]}}"#),
        );
        let tx = transaction(&connector, &MockProbe::reachable());
        assert!(tx.get_domains(&Credentials::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_domains_without_managed_rule_is_empty() {
        let connector = MockSshConnector::new();
        connector.add_response(
            &format!("cat {PATH}"),
            CommandOutput::stdout(r#"{"routing":{"rules":[{"type":"field","outboundTag":"direct"}]}}"#),
        );
        let tx = transaction(&connector, &MockProbe::reachable());
        let domains = tx.get_domains(&Credentials::default()).await.unwrap();
        assert!(domains.is_empty());
        assert_eq!(connector.close_count(), 1);
    }

    #[tokio::test]
    async fn test_get_domains_parse_failure() {
        let connector = MockSshConnector::new();
        connector.add_response(&format!("cat {PATH}"), CommandOutput::stdout("not json"));
        let tx = transaction(&connector, &MockProbe::reachable());
        assert!(matches!(
            tx.get_domains(&Credentials::default()).await,
            Err(RouterError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_get_domains_stderr_fails() {
        let connector = MockSshConnector::new();
        connector.add_response(
            &format!("cat {PATH}"),
            CommandOutput::stdout("").with_stderr("cat: can't open"),
        );
        let tx = transaction(&connector, &MockProbe::reachable());
        assert!(matches!(
            tx.get_domains(&Credentials::default()).await,
            Err(RouterError::CommandFailed { .. })
        ));
    }

    // ============== mutations ==============

    #[tokio::test]
    async fn test_add_scenario_backup_then_write() {
        let connector = MockSshConnector::new();
        connector.add_response(&format!("cat {PATH}"), CommandOutput::stdout(SAMPLE));
        let tx = transaction(&connector, &MockProbe::reachable());

        let report = tx
            .add_domains(
                &Credentials::default(),
                &strings(&["b.com", "a.com", ""]),
                &quiet,
            )
            .await
            .unwrap();

        assert_eq!(report.changed, 1);
        assert_eq!(report.domains, strings(&["a.com", "b.com"]));
        assert_eq!(report.backup_path, format!("{PATH}.bk"));

        let executed = connector.executed();
        assert_eq!(executed.len(), 3);
        assert_eq!(executed[0], format!("cp {PATH} {PATH}.bk"));
        assert_eq!(executed[1], format!("cat {PATH}"));
        assert!(is_write(&executed[2]));
        assert!(executed[2].ends_with(&format!("' > {PATH}")));

        let json = executed[2]
            .strip_prefix("echo '")
            .and_then(|s| s.strip_suffix(&format!("' > {PATH}")))
            .unwrap();
        let written = RoutingConfig::from_json(json).unwrap();
        assert_eq!(
            written.managed_rule("vless-reality").unwrap().domain,
            Some(strings(&["a.com", "b.com"]))
        );
    }

    #[tokio::test]
    async fn test_remove_absent_domain_still_writes() {
        let connector = MockSshConnector::new();
        connector.add_response(&format!("cat {PATH}"), CommandOutput::stdout(SAMPLE));
        let tx = transaction(&connector, &MockProbe::reachable());

        let report = tx
            .remove_domains(&Credentials::default(), &strings(&["zzz.com"]), &quiet)
            .await
            .unwrap();

        assert_eq!(report.changed, 0);
        assert_eq!(report.domains, strings(&["a.com"]));
        assert_eq!(connector.executed().iter().filter(|c| is_write(c)).count(), 1);
    }

    #[tokio::test]
    async fn test_rule_missing_aborts_without_write() {
        let connector = MockSshConnector::new();
        connector.add_response(
            &format!("cat {PATH}"),
            CommandOutput::stdout(r#"{"routing":{"rules":[{"type":"field","outboundTag":"direct"}]}}"#),
        );
        let tx = transaction(&connector, &MockProbe::reachable());

        let err = tx
            .add_domains(&Credentials::default(), &strings(&["b.com"]), &quiet)
            .await
            .unwrap_err();

        assert!(matches!(err, RouterError::RuleNotFound { ref tag } if tag == "vless-reality"));
        let executed = connector.executed();
        assert_eq!(executed[0], format!("cp {PATH} {PATH}.bk"));
        assert!(!executed.iter().any(|c| is_write(c)));
        assert_eq!(connector.close_count(), 1);
    }

    #[tokio::test]
    async fn test_backup_failure_aborts_before_read() {
        let connector = MockSshConnector::new();
        connector.add_response(
            &format!("cp {PATH} {PATH}.bk"),
            CommandOutput::stdout("").with_stderr("cp: can't create '/opt/x.bk': Read-only file system"),
        );
        let tx = transaction(&connector, &MockProbe::reachable());

        let err = tx
            .add_domains(&Credentials::default(), &strings(&["b.com"]), &quiet)
            .await
            .unwrap_err();

        assert!(matches!(err, RouterError::CommandFailed { ref stderr } if stderr.contains("Read-only")));
        assert_eq!(connector.executed(), vec![format!("cp {PATH} {PATH}.bk")]);
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let connector = MockSshConnector::new();
        connector.add_response(&format!("cat {PATH}"), CommandOutput::stdout(SAMPLE));
        let tx = transaction(&connector, &MockProbe::reachable());
        let json = {
            let mut doc = RoutingConfig::from_json(SAMPLE).unwrap();
            DomainEdit::Add(strings(&["b.com"])).apply(doc.managed_rule_mut("vless-reality").unwrap());
            doc.to_json_pretty().unwrap()
        };
        connector.add_failure(
            &XkeenCommandBuilder::build_write_command(PATH, &json),
            "channel closed",
        );

        let result = tx
            .add_domains(&Credentials::default(), &strings(&["b.com"]), &quiet)
            .await;

        assert!(matches!(result, Err(RouterError::SshExec { .. })));
        assert_eq!(connector.close_count(), 1);
    }

    #[tokio::test]
    async fn test_progress_messages_in_order() {
        let connector = MockSshConnector::new();
        connector.add_response(&format!("cat {PATH}"), CommandOutput::stdout(SAMPLE));
        let tx = transaction(&connector, &MockProbe::reachable());
        let messages = Mutex::new(Vec::new());
        let record = |msg: &str| messages.lock().unwrap().push(msg.to_string());

        tx.add_domains(&Credentials::default(), &strings(&["b.com"]), &record)
            .await
            .unwrap();

        let messages = messages.into_inner().unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("Backing up"));
        assert!(messages[1].starts_with("Writing"));
        assert!(messages[1].contains("2 domains"));
    }

    #[tokio::test]
    async fn test_unreachable_mutation_runs_nothing() {
        let connector = MockSshConnector::new();
        let tx = transaction(&connector, &MockProbe::unreachable());
        let result = tx
            .add_domains(&Credentials::default(), &strings(&["b.com"]), &quiet)
            .await;
        assert!(matches!(result, Err(RouterError::Unreachable { .. })));
        assert_eq!(connector.connect_count(), 0);
        assert!(connector.executed().is_empty());
    }

    #[tokio::test]
    async fn test_write_escapes_single_quotes_in_document() {
        let doc = r#"{"routing":{"rules":[{"type":"field","outboundTag":"vless-reality","domain":["it's.com"]}]}}"#;
        let connector = MockSshConnector::new();
        connector.add_response(&format!("cat {PATH}"), CommandOutput::stdout(doc));
        let tx = transaction(&connector, &MockProbe::reachable());

        tx.add_domains(&Credentials::default(), &strings(&["b.com"]), &quiet)
            .await
            .unwrap();

        let write = connector.executed().into_iter().find(|c| is_write(c)).unwrap();
        assert!(write.contains(r"it'\''s.com"));
    }
}
