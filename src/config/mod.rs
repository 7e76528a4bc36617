pub mod env;
pub mod error;
pub mod paths;
pub mod public_url;

pub use env::{dotenv_candidates, force_mode, load_dotenv_files, ClientEnvironment, EnvSnapshot};
pub use error::ConfigError;
pub use paths::{resolve_module, LayoutKind, OwnPackage, Paths, MODULE_FILE_EXTENSIONS};

use log::info;
use std::path::{Path, PathBuf};

/// Everything a dispatched script needs, computed once per invocation.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub layout: LayoutKind,
    pub paths: Paths,
    pub env: EnvSnapshot,
    pub loaded_env_files: Vec<PathBuf>,
}

impl ResolvedConfig {
    /// Load `.env` files into the process environment, capture it, then
    /// resolve paths against the snapshot.
    ///
    /// This is the one place the process environment is written. Fails if
    /// `NODE_ENV` is not set.
    pub fn prepare(app_dir: &Path, own: Option<&OwnPackage>) -> error::Result<Self> {
        let layout = LayoutKind::detect(app_dir, own);
        info!("Using {:?} layout", layout);

        let dotenv = Paths::dotenv_base(layout, app_dir, own);
        let loaded_env_files = env::load_dotenv_files(&dotenv)?;

        let mut env = EnvSnapshot::from_process();
        env.resolve_node_path(app_dir);

        let paths = Paths::resolve(layout, app_dir, own, &env)?;

        Ok(Self {
            layout,
            paths,
            env,
            loaded_env_files,
        })
    }

    /// Client environment with `PUBLIC_URL` stripped of its trailing slash.
    pub fn client_environment(&self) -> ClientEnvironment {
        let url = &self.paths.public_url_or_path;
        let public_url = url.strip_suffix('/').unwrap_or(url);
        self.env.client_environment(public_url)
    }
}
