//! The admin kubeconfig written to `auth/kubeconfig`.

use hoist_asset::{Asset, AssetError, AssetFile, DependencyTable, FileFetcher, WritableAsset};
use hoist_kube::{
    AuthInfo, Cluster, Context, Kubeconfig, NamedAuthInfo, NamedCluster, NamedContext,
    KUBECONFIG_PATH,
};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::install_config::InstallConfig;
use crate::json;

const ADMIN_USER: &str = "admin";
const TOKEN_LEN: usize = 32;

/// Client credentials for the cluster administrator.
#[derive(Debug, Default)]
pub struct AdminKubeconfig {
    /// The kubeconfig, once resolved.
    pub config: Kubeconfig,
    file: Option<AssetFile>,
}

impl Asset for AdminKubeconfig {
    fn name(&self) -> &'static str {
        "Kubeconfig Admin Client"
    }

    fn dependencies(&self) -> Vec<Box<dyn Asset>> {
        vec![Box::new(InstallConfig::default())]
    }

    fn generate(&mut self, parents: &DependencyTable<'_>) -> Result<(), AssetError> {
        let install = parents.get::<InstallConfig>()?.data()?;
        let cluster_name = install.cluster_name().to_string();
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();

        let config = Kubeconfig {
            clusters: vec![NamedCluster {
                name: cluster_name.clone(),
                cluster: Cluster {
                    server: install.api_url(),
                    certificate_authority_data: None,
                    insecure_skip_tls_verify: true,
                },
            }],
            users: vec![NamedAuthInfo {
                name: ADMIN_USER.to_string(),
                user: AuthInfo {
                    token: Some(token),
                    ..AuthInfo::default()
                },
            }],
            contexts: vec![NamedContext {
                name: ADMIN_USER.to_string(),
                context: Context {
                    cluster: cluster_name,
                    user: ADMIN_USER.to_string(),
                    namespace: None,
                },
            }],
            current_context: Some(ADMIN_USER.to_string()),
            api_version: "v1".to_string(),
            kind: "Config".to_string(),
        };

        self.file = Some(json::to_file(KUBECONFIG_PATH, &config)?);
        self.config = config;
        Ok(())
    }

    fn as_writable(&self) -> Option<&dyn WritableAsset> {
        Some(self)
    }

    fn as_writable_mut(&mut self) -> Option<&mut dyn WritableAsset> {
        Some(self)
    }
}

impl WritableAsset for AdminKubeconfig {
    fn files(&self) -> &[AssetFile] {
        self.file.as_slice()
    }

    fn load(&mut self, fetcher: &dyn FileFetcher) -> Result<bool, AssetError> {
        let Some(file) = fetcher.fetch_by_name(KUBECONFIG_PATH)? else {
            return Ok(false);
        };
        let config: Kubeconfig = json::from_file(&file)?;
        config
            .resolve(None)
            .map_err(|e| AssetError::parse(KUBECONFIG_PATH, e))?;
        self.config = config;
        self.file = Some(file);
        Ok(true)
    }
}
