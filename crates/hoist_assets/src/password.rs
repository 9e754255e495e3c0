//! The generated password of the `kubeadmin` user.

use hoist_asset::{Asset, AssetError, AssetFile, DependencyTable, FileFetcher, WritableAsset};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::PASSWORD_PATH;

const GROUPS: usize = 4;
const GROUP_LEN: usize = 5;

/// A random `xxxxx-xxxxx-xxxxx-xxxxx` password.
#[derive(Debug, Default)]
pub struct KubeadminPassword {
    /// The password.
    pub password: String,
    file: Option<AssetFile>,
}

fn generate_password() -> String {
    let mut rng = rand::thread_rng();
    (0..GROUPS)
        .map(|_| {
            (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(GROUP_LEN)
                .map(char::from)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
}

impl Asset for KubeadminPassword {
    fn name(&self) -> &'static str {
        "Kubeadmin Password"
    }

    fn dependencies(&self) -> Vec<Box<dyn Asset>> {
        Vec::new()
    }

    fn generate(&mut self, _parents: &DependencyTable<'_>) -> Result<(), AssetError> {
        self.password = generate_password();
        self.file = Some(AssetFile::new(PASSWORD_PATH, self.password.clone()));
        Ok(())
    }

    fn as_writable(&self) -> Option<&dyn WritableAsset> {
        Some(self)
    }

    fn as_writable_mut(&mut self) -> Option<&mut dyn WritableAsset> {
        Some(self)
    }
}

impl WritableAsset for KubeadminPassword {
    fn files(&self) -> &[AssetFile] {
        self.file.as_slice()
    }

    fn load(&mut self, fetcher: &dyn FileFetcher) -> Result<bool, AssetError> {
        let Some(file) = fetcher.fetch_by_name(PASSWORD_PATH)? else {
            return Ok(false);
        };
        let password = file.text()?.trim();
        if password.is_empty() {
            return Err(AssetError::parse(PASSWORD_PATH, "password file is empty"));
        }
        self.password = password.to_string();
        self.file = Some(file);
        Ok(true)
    }
}
