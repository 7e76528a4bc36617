pub mod script;
pub mod spawn;

pub use script::{Invocation, Script};
pub use spawn::{ChildOutcome, Launch};

use std::path::{Path, PathBuf};

use crate::config::{resolve_module, ConfigError};

/// Locate `<scripts_dir>/<script>.<ext>` for a recognised script.
pub fn entry_point(scripts_dir: &Path, script: Script) -> Result<PathBuf, ConfigError> {
    let entry = resolve_module(&scripts_dir.join(script.as_str()));
    if entry.is_file() {
        Ok(entry)
    } else {
        Err(ConfigError::MissingScript {
            name: script.to_string(),
            dir: scripts_dir.to_path_buf(),
        })
    }
}

/// Lines printed when the requested script is not one we know.
pub fn unknown_script_message(name: Option<&str>) -> Vec<String> {
    vec![
        format!("Unknown script \"{}\".", name.unwrap_or("undefined")),
        "Perhaps you need to update react-scripts?".to_string(),
        "See: https://facebook.github.io/create-react-app/docs/updating-to-new-releases".to_string(),
    ]
}
