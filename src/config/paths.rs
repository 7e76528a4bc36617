use std::fs;
use std::path::{Component, Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use super::env::EnvSnapshot;
use super::error::{ConfigError, Result};
use super::public_url;

/// Extensions probed for source modules, in priority order.
pub const MODULE_FILE_EXTENSIONS: &[&str] = &[
    "web.mjs", "mjs", "web.js", "js", "web.ts", "ts", "web.tsx", "tsx", "json", "web.jsx", "jsx",
];

/// Template location relative to the own package in a monorepo checkout.
const TEMPLATE_PATH: &str = "../cra-template/template";

/// Return the first `{path}.{ext}` that exists, or `{path}.js`.
pub fn resolve_module(path: &Path) -> PathBuf {
    MODULE_FILE_EXTENSIONS
        .iter()
        .map(|ext| with_extension(path, ext))
        .find(|candidate| candidate.exists())
        .unwrap_or_else(|| with_extension(path, "js"))
}

// `Path::with_extension` would replace the `.web` in `index.web`, so append instead.
fn with_extension(path: &Path, ext: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LayoutKind {
    /// Ejected app: no own package, only app paths.
    Standalone,
    /// Own package checked out next to the template in a monorepo.
    LinkedTemplate,
    /// Own package installed (or symlinked) into the app's `node_modules`.
    PublishedPackage,
}

impl LayoutKind {
    pub fn detect(app_dir: &Path, own: Option<&OwnPackage>) -> Self {
        let Some(own) = own else {
            return LayoutKind::Standalone;
        };

        let installed = app_dir.join("node_modules").join(&own.name);
        let linked = fs::symlink_metadata(&installed)
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false);

        let in_packages_dir = own
            .path
            .parent()
            .and_then(Path::file_name)
            .map_or(false, |name| name == "packages");

        if !linked && in_packages_dir {
            LayoutKind::LinkedTemplate
        } else {
            LayoutKind::PublishedPackage
        }
    }
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    name: Option<String>,
    homepage: Option<String>,
}

fn read_manifest(path: &Path) -> Result<Option<PackageManifest>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::Manifest {
            path: path.to_path_buf(),
            source,
        })
}

/// The `my-scripts` package itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnPackage {
    pub path: PathBuf,
    pub name: String,
}

impl OwnPackage {
    /// Read the package name from `<path>/package.json`. `None` when there is no manifest.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let manifest = read_manifest(&path.join("package.json"))?;
        Ok(manifest.and_then(|m| m.name).map(|name| OwnPackage {
            path: path.to_path_buf(),
            name,
        }))
    }

    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        normalize(&self.path.join(relative))
    }
}

/// Lexically collapse `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// `homepage` field of the app manifest, if any.
pub fn read_homepage(package_json: &Path) -> Result<Option<String>> {
    Ok(read_manifest(package_json)?.and_then(|m| m.homepage))
}

/// Paths that only exist while the scripts package has not been ejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnPaths {
    pub own_path: PathBuf,
    pub own_node_modules: PathBuf,
    pub app_type_declarations: PathBuf,
    pub own_type_declarations: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paths {
    pub dotenv: PathBuf,
    pub app_path: PathBuf,
    pub app_build: PathBuf,
    pub app_public: PathBuf,
    pub app_html: PathBuf,
    pub app_index_js: PathBuf,
    pub app_package_json: PathBuf,
    pub app_src: PathBuf,
    pub app_ts_config: PathBuf,
    pub app_js_config: PathBuf,
    pub yarn_lock_file: PathBuf,
    pub tests_setup: PathBuf,
    pub proxy_setup: PathBuf,
    pub app_node_modules: PathBuf,
    pub app_webpack_cache: PathBuf,
    pub app_ts_build_info_file: PathBuf,
    pub sw_src: PathBuf,
    pub public_url_or_path: String,
    #[serde(flatten)]
    pub own: Option<OwnPaths>,
}

impl Paths {
    /// Where `.env` files live for this layout. Needed before the environment is loaded.
    pub fn dotenv_base(layout: LayoutKind, app_dir: &Path, own: Option<&OwnPackage>) -> PathBuf {
        match (layout, own) {
            (LayoutKind::LinkedTemplate, Some(own)) => own.resolve(TEMPLATE_PATH).join(".env"),
            _ => app_dir.join(".env"),
        }
    }

    /// Build the path map for `layout`.
    ///
    /// `env` must already contain the loaded `.env` values; `BUILD_PATH`,
    /// `PUBLIC_URL` and the mode are read from it.
    pub fn resolve(
        layout: LayoutKind,
        app_dir: &Path,
        own: Option<&OwnPackage>,
        env: &EnvSnapshot,
    ) -> Result<Self> {
        let build_path = env.get("BUILD_PATH").filter(|p| !p.is_empty()).unwrap_or("build");

        let homepage = read_homepage(&app_dir.join("package.json"))?;
        let is_dev = env.get(super::env::MODE_VAR) == Some("development");
        let public_url_or_path =
            public_url::resolve(is_dev, homepage.as_deref(), env.get("PUBLIC_URL"))?;
        debug!("Public URL resolved to {}", public_url_or_path);

        let paths = match (layout, own) {
            (LayoutKind::LinkedTemplate, Some(own)) => {
                let template = own.resolve(TEMPLATE_PATH);
                Paths {
                    dotenv: template.join(".env"),
                    app_path: app_dir.to_path_buf(),
                    app_build: own.resolve(Path::new("../..").join(build_path)),
                    app_public: template.join("public"),
                    app_html: template.join("public/index.html"),
                    app_index_js: resolve_module(&template.join("src/index")),
                    app_package_json: own.resolve("package.json"),
                    app_src: template.join("src"),
                    app_ts_config: template.join("tsconfig.json"),
                    app_js_config: template.join("jsconfig.json"),
                    yarn_lock_file: template.join("yarn.lock"),
                    tests_setup: resolve_module(&template.join("src/setupTests")),
                    proxy_setup: template.join("src/setupProxy.js"),
                    app_node_modules: own.resolve("node_modules"),
                    app_webpack_cache: own.resolve("node_modules/.cache"),
                    app_ts_build_info_file: own.resolve("node_modules/.cache/tsconfig.tsbuildinfo"),
                    sw_src: resolve_module(&template.join("src/service-worker")),
                    public_url_or_path,
                    own: Some(OwnPaths {
                        own_path: own.path.clone(),
                        own_node_modules: own.resolve("node_modules"),
                        app_type_declarations: template.join("src/react-app-env.d.ts"),
                        own_type_declarations: own.resolve("lib/react-app.d.ts"),
                    }),
                }
            }
            (_, own) => {
                let mut paths = Self::app_rooted(app_dir, build_path, public_url_or_path);
                if layout == LayoutKind::PublishedPackage {
                    paths.own = own.map(|own| OwnPaths {
                        own_path: own.path.clone(),
                        own_node_modules: own.resolve("node_modules"),
                        app_type_declarations: app_dir.join("src/react-app-env.d.ts"),
                        own_type_declarations: own.resolve("lib/react-app.d.ts"),
                    });
                }
                paths
            }
        };

        Ok(paths)
    }

    fn app_rooted(app_dir: &Path, build_path: &str, public_url_or_path: String) -> Self {
        Paths {
            dotenv: app_dir.join(".env"),
            app_path: app_dir.to_path_buf(),
            app_build: normalize(&app_dir.join(build_path)),
            app_public: app_dir.join("public"),
            app_html: app_dir.join("public/index.html"),
            app_index_js: resolve_module(&app_dir.join("src/index")),
            app_package_json: app_dir.join("package.json"),
            app_src: app_dir.join("src"),
            app_ts_config: app_dir.join("tsconfig.json"),
            app_js_config: app_dir.join("jsconfig.json"),
            yarn_lock_file: app_dir.join("yarn.lock"),
            tests_setup: resolve_module(&app_dir.join("src/setupTests")),
            proxy_setup: app_dir.join("src/setupProxy.js"),
            app_node_modules: app_dir.join("node_modules"),
            app_webpack_cache: app_dir.join("node_modules/.cache"),
            app_ts_build_info_file: app_dir.join("node_modules/.cache/tsconfig.tsbuildinfo"),
            sw_src: resolve_module(&app_dir.join("src/service-worker")),
            public_url_or_path,
            own: None,
        }
    }
}
