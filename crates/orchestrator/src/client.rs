//! Container specification per execution client

use crate::config::Settings;
use crate::roster::NodeConfig;
use docker::{MANAGED_LABEL, NODE_LABEL};
use domain::{ClientKind, ContainerSpec};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

const VALIDATOR_LABEL: &str = "devnet.node.validator";
const CLIENT_LABEL: &str = "devnet.node.client";

const GETH_HTTP_API: &str = "eth,net,web3,personal,miner,admin,debug,txpool";
const GETH_WS_API: &str = "eth,net,web3,txpool";
const NETHERMIND_RPC_MODULES: &str =
    "Eth,Subscribe,Trace,TxPool,Web3,Personal,Proof,Net,Parity,Health,Rpc";

/// Full container specification for one roster member.
///
/// Host paths must be absolute; the daemon resolves binds on its side.
pub fn container_spec(
    config: &NodeConfig,
    settings: &Settings,
    genesis_path: &Path,
) -> ContainerSpec {
    let (image, entrypoint, command) = match config.client {
        ClientKind::Geth => (
            settings.geth_image.clone(),
            Some(vec!["sh".to_string(), "-c".to_string()]),
            vec![geth_script(config, settings.chain_id)],
        ),
        ClientKind::Nethermind => (
            settings.nethermind_image.clone(),
            None,
            nethermind_args(config),
        ),
    };

    let mut port_bindings = BTreeMap::new();
    for port in [config.peer_port, config.rpc_port, config.ws_port] {
        port_bindings.insert(format!("{}/tcp", port), port);
    }

    let mut labels = HashMap::new();
    labels.insert(MANAGED_LABEL.to_string(), "true".to_string());
    labels.insert(NODE_LABEL.to_string(), config.name.clone());
    labels.insert(VALIDATOR_LABEL.to_string(), config.is_validator.to_string());
    labels.insert(CLIENT_LABEL.to_string(), config.client.to_string());

    ContainerSpec {
        name: config.container_name(),
        image,
        entrypoint,
        command,
        env_vars: HashMap::new(),
        port_bindings,
        volume_binds: vec![
            format!("{}:/data", config.data_dir.display()),
            format!("{}:/keystore", config.keystore_dir.display()),
            format!("{}:/genesis.json:ro", genesis_path.display()),
        ],
        network_mode: Some(settings.docker_network.clone()),
        labels,
    }
}

/// geth flags after `geth`
pub fn geth_args(config: &NodeConfig, network_id: u64) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--networkid".into(),
        network_id.to_string(),
        "--datadir".into(),
        "/data".into(),
        "--keystore".into(),
        "/keystore".into(),
        "--port".into(),
        config.peer_port.to_string(),
        "--http".into(),
        "--http.addr".into(),
        "0.0.0.0".into(),
        "--http.port".into(),
        config.rpc_port.to_string(),
        "--http.api".into(),
        GETH_HTTP_API.into(),
        "--http.corsdomain".into(),
        "'*'".into(),
        "--ws".into(),
        "--ws.addr".into(),
        "0.0.0.0".into(),
        "--ws.port".into(),
        config.ws_port.to_string(),
        "--ws.api".into(),
        GETH_WS_API.into(),
        "--ws.origins".into(),
        "'*'".into(),
        "--nodiscover".into(),
        "--syncmode".into(),
        "full".into(),
    ];

    if config.is_validator {
        let address = config.address().to_checksum(None);
        args.extend([
            "--allow-insecure-unlock".into(),
            "--unlock".into(),
            address.clone(),
            "--password".into(),
            "/dev/null".into(),
            "--mine".into(),
            "--miner.etherbase".into(),
            address,
        ]);
    }
    args
}

/// Shell script run by `sh -c`: initialise the data dir from the genesis,
/// import the signer key for validators, then exec geth.
fn geth_script(config: &NodeConfig, network_id: u64) -> String {
    let mut steps = vec!["geth init --datadir /data /genesis.json".to_string()];
    if config.is_validator {
        steps.push(format!(
            "(geth account import --datadir /data --keystore /keystore \
             --password /dev/null /keystore/{}-private.key || true)",
            config.name
        ));
    }
    steps.push(format!("exec geth {}", geth_args(config, network_id).join(" ")));
    steps.join(" && ")
}

/// Arguments passed to the Nethermind image entrypoint
pub fn nethermind_args(config: &NodeConfig) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--datadir".into(),
        "/data".into(),
        "--Network.DiscoveryPort".into(),
        config.peer_port.to_string(),
        "--Network.P2PPort".into(),
        config.peer_port.to_string(),
        "--JsonRpc.Enabled".into(),
        "true".into(),
        "--JsonRpc.Host".into(),
        "0.0.0.0".into(),
        "--JsonRpc.Port".into(),
        config.rpc_port.to_string(),
        "--JsonRpc.WebSocketsPort".into(),
        config.ws_port.to_string(),
        "--JsonRpc.EnabledModules".into(),
        NETHERMIND_RPC_MODULES.into(),
        "--KeyStore.KeyStoreDirectory".into(),
        "/keystore".into(),
        "--Init.ChainSpecPath".into(),
        "/genesis.json".into(),
    ];

    if config.is_validator {
        args.extend([
            "--Init.IsMining".into(),
            "true".into(),
            "--KeyStore.BlockAuthorAccount".into(),
            config.address().to_checksum(None),
        ]);
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::generate_default_set;
    use std::path::PathBuf;

    fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(|s| s.as_str())
    }

    #[test]
    fn test_geth_validator_mines_to_its_address() {
        let configs = generate_default_set(Path::new("/srv/devnet/nodes")).unwrap();
        let alice = &configs[0];
        let args = geth_args(alice, 1337);

        assert_eq!(flag_value(&args, "--networkid"), Some("1337"));
        assert_eq!(flag_value(&args, "--port"), Some("30303"));
        assert_eq!(flag_value(&args, "--http.port"), Some("8545"));
        assert_eq!(flag_value(&args, "--ws.port"), Some("9545"));
        assert!(flag_value(&args, "--http.api").unwrap().contains("txpool"));
        assert!(args.contains(&"--mine".to_string()));
        let etherbase = alice.address().to_checksum(None);
        assert_eq!(flag_value(&args, "--miner.etherbase"), Some(etherbase.as_str()));
    }

    #[test]
    fn test_geth_non_validator_does_not_mine() {
        let configs = generate_default_set(Path::new("/srv/devnet/nodes")).unwrap();
        let args = geth_args(&configs[3], 1337);
        assert!(!args.contains(&"--mine".to_string()));
        assert!(!args.contains(&"--unlock".to_string()));
    }

    #[test]
    fn test_nethermind_flags() {
        let configs = generate_default_set(Path::new("/srv/devnet/nodes")).unwrap();
        let cassandra = &configs[2];
        let args = nethermind_args(cassandra);
        assert_eq!(flag_value(&args, "--JsonRpc.Port"), Some("8547"));
        assert_eq!(flag_value(&args, "--Network.P2PPort"), Some("30305"));
        assert_eq!(flag_value(&args, "--Init.ChainSpecPath"), Some("/genesis.json"));
        assert_eq!(flag_value(&args, "--Init.IsMining"), Some("true"));

        let elena = nethermind_args(&configs[4]);
        assert!(flag_value(&elena, "--Init.IsMining").is_none());
        assert!(flag_value(&elena, "--KeyStore.BlockAuthorAccount").is_none());
    }

    #[test]
    fn test_container_spec_wiring() {
        let settings = Settings::default();
        let configs = generate_default_set(Path::new("/srv/devnet/nodes")).unwrap();
        let genesis = PathBuf::from("/srv/devnet/genesis.json");

        let spec = container_spec(&configs[0], &settings, &genesis);
        assert_eq!(spec.name, "devnet-alice");
        assert_eq!(spec.image, settings.geth_image);
        assert_eq!(spec.entrypoint, Some(vec!["sh".to_string(), "-c".to_string()]));
        assert!(spec.command[0].starts_with("geth init --datadir /data /genesis.json && "));
        assert!(spec.command[0].contains("alice-private.key"));
        assert_eq!(spec.port_bindings.get("8545/tcp"), Some(&8545));
        assert_eq!(spec.port_bindings.get("9545/tcp"), Some(&9545));
        assert_eq!(spec.port_bindings.get("30303/tcp"), Some(&30303));
        assert!(spec.volume_binds.contains(&"/srv/devnet/nodes/alice/data:/data".to_string()));
        let genesis_bind = "/srv/devnet/genesis.json:/genesis.json:ro".to_string();
        assert!(spec.volume_binds.contains(&genesis_bind));
        assert_eq!(spec.network_mode.as_deref(), Some("devnet-network"));
        assert_eq!(spec.labels[NODE_LABEL], "alice");
        assert_eq!(spec.labels[VALIDATOR_LABEL], "true");
        assert_eq!(spec.labels[CLIENT_LABEL], "geth");

        let elena = container_spec(&configs[4], &settings, &genesis);
        assert_eq!(elena.image, settings.nethermind_image);
        assert!(elena.entrypoint.is_none());
        assert_eq!(elena.labels[CLIENT_LABEL], "nethermind");
        assert_eq!(elena.labels[VALIDATOR_LABEL], "false");
    }
}
