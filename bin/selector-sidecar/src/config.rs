use clap::Parser;
use std::{net::Ipv4Addr, path::PathBuf};
use url::Url;

/// CLI/config surface for the block-building sidecar (spec.md §6).
#[derive(Debug, Parser)]
#[clap(author, version, about = "transaction selection sidecar for block building", long_about = None)]
pub struct Cli {
    #[clap(long, env, default_value = "0.0.0.0")]
    pub rpc_host: Ipv4Addr,
    #[clap(long, env, default_value_t = 8645)]
    pub rpc_port: u16,

    #[clap(long, env, default_value = "./data")]
    pub data_dir: PathBuf,

    #[clap(long, env)]
    pub module_limit_file_path: PathBuf,
    #[clap(long, env)]
    pub deny_list_path: PathBuf,

    #[clap(long, env, default_value_t = false)]
    pub tx_pool_simulation_check_api_enabled: bool,

    #[clap(long, env, value_delimiter = ',')]
    pub bundles_forward_urls: Vec<Url>,

    #[clap(long, env)]
    pub rejected_tx_endpoint: Url,

    #[clap(long, env, default_value_t = false)]
    pub blob_tx_enabled: bool,
}
