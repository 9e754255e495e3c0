//! The closing report once the cluster is up.

use std::path::{Path, PathBuf};

use hoist_assets::{KUBECONFIG_PATH, PASSWORD_PATH};
use tracing::info;

/// What an administrator needs to reach the new cluster.
#[derive(Debug, PartialEq, Eq)]
pub struct Completion {
    /// Absolute path of the admin kubeconfig.
    pub kubeconfig: PathBuf,
    /// The `kubeadmin` password.
    pub password: String,
}

/// Reads the admin credentials from the install directory.
pub fn completion(dir: &Path) -> Result<Completion, Box<dyn std::error::Error>> {
    let kubeconfig = dir.join(KUBECONFIG_PATH);
    let kubeconfig = std::fs::canonicalize(&kubeconfig)
        .map_err(|e| format!("reading {}: {e}", kubeconfig.display()))?;

    let password_path = dir.join(PASSWORD_PATH);
    let password = std::fs::read_to_string(&password_path)
        .map_err(|e| format!("reading {}: {e}", password_path.display()))?;

    Ok(Completion {
        kubeconfig,
        password: password.trim().to_string(),
    })
}

/// Logs how to reach the cluster.
pub fn log_complete(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let done = completion(dir)?;
    info!("Install complete!");
    info!(
        "Run 'export KUBECONFIG={}' to manage the cluster with 'kubectl'.",
        done.kubeconfig.display()
    );
    info!("Login as user: kubeadmin, password: {}", done.password);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_reads_credentials() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("auth")).unwrap();
        std::fs::write(dir.path().join(KUBECONFIG_PATH), "{}").unwrap();
        std::fs::write(dir.path().join(PASSWORD_PATH), "abcde-fghij-klmno-pqrst\n").unwrap();

        let done = completion(dir.path()).unwrap();
        assert!(done.kubeconfig.is_absolute());
        assert!(done.kubeconfig.ends_with("auth/kubeconfig"));
        assert_eq!(done.password, "abcde-fghij-klmno-pqrst");
    }

    #[test]
    fn missing_password_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("auth")).unwrap();
        std::fs::write(dir.path().join(KUBECONFIG_PATH), "{}").unwrap();

        let err = completion(dir.path()).unwrap_err();
        assert!(err.to_string().contains("kubeadmin-password"));
    }
}
