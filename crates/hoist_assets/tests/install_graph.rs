use std::collections::BTreeMap;
use std::path::Path;

use hoist_asset::{Store, StoreError};
use hoist_assets::ignition::BOOTSTRAP_IGNITION_PATH;
use hoist_assets::{
    AdminKubeconfig, BootstrapIgnition, InstallConfig, KubeadminPassword, Target,
    TerraformVariables, KUBECONFIG_PATH, PASSWORD_PATH,
};

const OPTIONS: &str = r#"
cluster_name = "demo"
base_domain = "example.com"
pull_secret = '{"auths": {}}'
ssh_key = "ssh-ed25519 AAAA demo"

[platform]
type = "libvirt"
uri = "qemu:///system"
"#;

fn install_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("install-options.toml"), OPTIONS).unwrap();
    dir
}

fn create(dir: &Path, target: Target) -> Result<Store, StoreError> {
    let mut store = Store::new(dir);
    for asset in target.assets() {
        store.fetch(asset)?;
    }
    Ok(store)
}

fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<String, Vec<u8>>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let name = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
                out.insert(name, std::fs::read(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(dir, dir, &mut out);
    out
}

#[test]
fn cluster_target_writes_every_file() {
    let dir = install_dir();
    create(dir.path(), Target::Cluster).unwrap();

    let files: Vec<_> = snapshot(dir.path()).into_keys().collect();
    for expected in [
        "auth/kubeadmin-password",
        "auth/kubeconfig",
        "bootstrap.ign",
        "install-config.json",
        "install-options.toml",
        "manifests/cluster-config.json",
        "manifests/cluster-infrastructure-02-config.json",
        "manifests/cluster-network-02-config.json",
        "master.ign",
        "metadata.json",
        "terraform.tfvars.json",
    ] {
        assert!(files.iter().any(|f| f == expected), "missing {expected}: {files:?}");
    }
    // Worker configs only come with the ignition-configs target.
    assert!(!files.iter().any(|f| f == "worker.ign"));
}

#[test]
fn rerun_loads_instead_of_regenerating() {
    let dir = install_dir();
    create(dir.path(), Target::Cluster).unwrap();
    let first = snapshot(dir.path());

    create(dir.path(), Target::Cluster).unwrap();
    assert_eq!(snapshot(dir.path()), first);
}

#[test]
fn downstream_assets_share_one_install_config() {
    let dir = install_dir();
    let store = create(dir.path(), Target::Cluster).unwrap();

    let install = store.get::<InstallConfig>().unwrap().data().unwrap();
    let vars = &store.get::<TerraformVariables>().unwrap().vars;
    assert_eq!(vars.cluster_id, install.cluster_id);
    assert_eq!(vars.masters_count, 1);
    assert_eq!(vars.libvirt_uri.as_deref(), Some("qemu:///system"));

    let kubeconfig = &store.get::<AdminKubeconfig>().unwrap().config;
    assert_eq!(kubeconfig.clusters[0].cluster.server, "https://api.demo.example.com:6443");

    let bootstrap = &store.get::<BootstrapIgnition>().unwrap().config;
    let embedded = bootstrap.file_contents("/opt/hoist/auth/kubeconfig").unwrap();
    assert_eq!(embedded, std::fs::read(dir.path().join(KUBECONFIG_PATH)).unwrap());
}

#[test]
fn deleted_output_is_regenerated_from_persisted_inputs() {
    let dir = install_dir();
    create(dir.path(), Target::IgnitionConfigs).unwrap();
    let before = std::fs::read(dir.path().join(BOOTSTRAP_IGNITION_PATH)).unwrap();
    let password = std::fs::read(dir.path().join(PASSWORD_PATH)).unwrap();

    std::fs::remove_file(dir.path().join(BOOTSTRAP_IGNITION_PATH)).unwrap();
    let store = create(dir.path(), Target::IgnitionConfigs).unwrap();

    assert_eq!(std::fs::read(dir.path().join(BOOTSTRAP_IGNITION_PATH)).unwrap(), before);
    assert_eq!(
        store.get::<KubeadminPassword>().unwrap().password.as_bytes(),
        password.as_slice()
    );
}

#[test]
fn missing_platform_fails_install_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("install-options.toml"),
        "cluster_name = \"demo\"\nbase_domain = \"example.com\"\npull_secret = \"{}\"\n",
    )
    .unwrap();

    let err = create(dir.path(), Target::InstallConfig).err().unwrap();
    assert!(matches!(err, StoreError::Generate { asset: "Install Config", .. }));
    assert!(err.to_string().contains("unknown platform type: none selected"));
    assert!(!dir.path().join("install-config.json").exists());
}
