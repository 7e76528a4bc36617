use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use log::{debug, info};
use serde_json::json;
use std::path::PathBuf;

use crate::config::{self, OwnPackage, ResolvedConfig};
use crate::dispatch::{self, ChildOutcome, Invocation, Launch, Script};

#[derive(Parser, Debug, Clone)]
#[command(name = "my-scripts")]
#[command(about = "Run the start/build/test/eject scripts of a front-end app", long_about = None)]
#[command(disable_version_flag = true)]
pub struct Args {
    /// JavaScript runtime used to execute scripts
    #[arg(long, env = "MY_SCRIPTS_RUNTIME", default_value = "node", value_name = "BIN")]
    pub runtime: PathBuf,

    /// Root of the scripts package (default: parent of the executable's directory)
    #[arg(long, env = "MY_SCRIPTS_OWN_PATH", value_name = "DIR")]
    pub own_path: Option<PathBuf>,

    /// Print the resolved launch and configuration as JSON instead of running
    #[arg(long)]
    pub dry_run: bool,

    /// [runtime-args...] <script> [script-args...]
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Resolved locations for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub runtime: PathBuf,
    pub own_path: PathBuf,
    pub app_dir: PathBuf,
}

impl Settings {
    pub fn from_args(args: &Args) -> Result<Self> {
        let own_path = match &args.own_path {
            Some(path) => path.clone(),
            None => default_own_path()?,
        };
        let app_dir = std::env::current_dir()
            .and_then(|dir| dir.canonicalize())
            .context("Failed to resolve the app directory")?;

        Ok(Self {
            runtime: args.runtime.clone(),
            own_path,
            app_dir,
        })
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.own_path.join("scripts")
    }
}

// The executable lives in `<own>/bin/`.
fn default_own_path() -> Result<PathBuf> {
    let exe = std::env::current_exe()
        .and_then(|exe| exe.canonicalize())
        .context("Failed to locate the running executable")?;
    exe.parent()
        .and_then(|bin| bin.parent())
        .map(PathBuf::from)
        .context("Executable has no parent package directory")
}

/// Dispatch to the requested script and return the exit code to use.
pub fn run(args: Args) -> Result<i32> {
    let (runtime_args, script, script_args) = match Invocation::parse(&args.args) {
        Invocation::Known {
            runtime_args,
            script,
            script_args,
        } => (runtime_args, script, script_args),
        Invocation::Unknown { name } => {
            let mut lines = dispatch::unknown_script_message(name.as_deref()).into_iter();
            if let Some(first) = lines.next() {
                println!("{}", first.yellow());
            }
            for line in lines {
                println!("{}", line);
            }
            return Ok(0);
        }
    };

    let settings = Settings::from_args(&args)?;
    debug!("Settings: {:?}", settings);

    let entry = dispatch::entry_point(&settings.scripts_dir(), script)?;
    let mut launch = Launch::new(settings.runtime.clone(), &runtime_args, entry, &script_args);

    let config = prepare_config(&settings, script)?;
    if let Some(config) = &config {
        launch = launch.with_env(config.env.clone());
    }

    if args.dry_run {
        print_report(script, &launch, config.as_ref())?;
        return Ok(0);
    }

    let outcome = launch.run()?;
    report_outcome(&outcome);
    Ok(outcome.exit_code())
}

/// Force the script's mode, then load `.env` files and resolve paths.
/// `eject` runs with the environment untouched.
fn prepare_config(settings: &Settings, script: Script) -> Result<Option<ResolvedConfig>> {
    let Some(mode) = script.mode() else {
        return Ok(None);
    };

    config::force_mode(mode);

    let own = OwnPackage::load(&settings.own_path)?;
    let config = ResolvedConfig::prepare(&settings.app_dir, own.as_ref())
        .with_context(|| format!("Failed to prepare the {} environment", mode))?;

    info!(
        "Loaded {} env file(s), public URL {}",
        config.loaded_env_files.len(),
        config.paths.public_url_or_path
    );
    Ok(Some(config))
}

fn report_outcome(outcome: &ChildOutcome) {
    if let Some(message) = outcome.explanation() {
        println!("{}", message);
    }
    if let ChildOutcome::Signaled(signal) = outcome {
        debug!("Script terminated by signal {:?}", signal);
    }
}

fn print_report(script: Script, launch: &Launch, config: Option<&ResolvedConfig>) -> Result<()> {
    let config = config.map(|config| {
        let client = config.client_environment();
        json!({
            "layout": config.layout,
            "envFiles": config.loaded_env_files,
            "paths": config.paths,
            "clientEnv": {
                "raw": client.raw,
                "stringified": client.stringified(),
            },
        })
    });

    let report = json!({
        "script": script.as_str(),
        "launch": launch,
        "config": config,
    });

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
