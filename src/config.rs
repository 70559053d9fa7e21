use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use url::Url;

/// Variable the containers read the access token from
pub const SB_AUTH_TOKEN: &str = "SB_AUTH_TOKEN";
/// Variable the containers read the API endpoint from
pub const SB_API_ENDPOINT: &str = "SB_API_ENDPOINT";

pub const DEFAULT_API_ENDPOINT: &str = "https://cgc-api.sbgenomics.com/v2";
pub const DEFAULT_SYNCR_IMAGE: &str = "quay.io/pancancer/syncr:0.0.2";

/// Platform and container settings shared by all subcommands
#[derive(Args, Clone)]
pub struct PlatformArgs {
    /// CGC access token
    #[arg(long, env = "CGC_ACCESS_TOKEN", hide_env_values = true)]
    token: String,
    /// CGC API endpoint
    #[arg(long, env = "SB_API_ENDPOINT", default_value = DEFAULT_API_ENDPOINT)]
    api_endpoint: Url,
    /// Container runtime used to run syncr and the download tool
    #[arg(long, env = "CGC_CONTAINER_RUNTIME", default_value = "docker")]
    container_runtime: PathBuf,
    /// Image of the syncr task submission tool
    #[arg(long, env = "CGC_SYNCR_IMAGE", default_value = DEFAULT_SYNCR_IMAGE)]
    syncr_image: String,
    /// Image of the download tool (required by `download`)
    #[arg(long, env = "CGC_DOWNLOAD_IMAGE")]
    download_image: Option<String>,
    /// How often syncr probes task status, in seconds
    #[arg(long, default_value_t = 300)]
    probing_interval: u64,
    /// Timeout of each CGC API request, in seconds
    #[arg(long, default_value_t = 60)]
    api_timeout: u64,
}

/// Everything the dispatcher and download helper need to reach the platform
///
/// Passed explicitly; the process environment is never modified. The token only reaches child
/// processes through [`Config::forwarded_env`].
#[derive(Clone)]
pub struct Config {
    pub auth_token: String,
    pub api_endpoint: Url,
    pub container_runtime: PathBuf,
    pub syncr_image: String,
    pub download_image: Option<String>,
    pub probing_interval: u64,
    pub api_timeout: Duration,
}

impl Config {
    /// Variables forwarded into containers, as set on the container runtime process
    pub fn forwarded_env(&self) -> Vec<(String, String)> {
        vec![
            (SB_AUTH_TOKEN.to_string(), self.auth_token.clone()),
            (SB_API_ENDPOINT.to_string(), self.api_endpoint.to_string()),
        ]
    }
}

impl From<PlatformArgs> for Config {
    fn from(args: PlatformArgs) -> Self {
        Config {
            auth_token: args.token,
            api_endpoint: args.api_endpoint,
            container_runtime: args.container_runtime,
            syncr_image: args.syncr_image,
            download_image: args.download_image,
            probing_interval: args.probing_interval,
            api_timeout: Duration::from_secs(args.api_timeout),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Config")
            .field("auth_token", &"<redacted>")
            .field("api_endpoint", &self.api_endpoint.as_str())
            .field("container_runtime", &self.container_runtime)
            .field("syncr_image", &self.syncr_image)
            .field("download_image", &self.download_image)
            .field("probing_interval", &self.probing_interval)
            .field("api_timeout", &self.api_timeout)
            .finish()
    }
}
