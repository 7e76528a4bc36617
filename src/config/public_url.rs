use url::Url;

use super::error::{ConfigError, Result};

/// Origin used to give relative public URLs something to resolve against.
const STUB_ORIGIN: &str = "https://create-react-app.dev";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    EnvOverride,
    Homepage,
}

/// Compute the base path static assets are served from.
///
/// `env_override` (usually `PUBLIC_URL`) wins over `homepage` from the app's
/// `package.json`. With neither set the app is served from `/`.
///
/// A value starting with `.` means "serve from the root" in development but is
/// kept as authored in production. For the override source, production always
/// keeps the authored value; for the homepage source only dot-relative values
/// are kept, anything else is reduced to its path.
pub fn resolve(is_dev: bool, homepage: Option<&str>, env_override: Option<&str>) -> Result<String> {
    let (source, raw) = match (non_empty(env_override), non_empty(homepage)) {
        (Some(value), _) => (Source::EnvOverride, value),
        (None, Some(value)) => (Source::Homepage, value),
        (None, None) => return Ok("/".to_string()),
    };

    let value = with_trailing_slash(raw);
    let pathname = pathname_of(&value)?;
    let dot_relative = value.starts_with('.');

    let resolved = match (is_dev, source) {
        (true, _) if dot_relative => "/".to_string(),
        (true, _) => pathname,
        (false, Source::EnvOverride) => value,
        (false, Source::Homepage) if dot_relative => value,
        (false, Source::Homepage) => pathname,
    };

    Ok(resolved)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn with_trailing_slash(value: &str) -> String {
    if value.ends_with('/') {
        value.to_string()
    } else {
        format!("{}/", value)
    }
}

fn pathname_of(value: &str) -> Result<String> {
    let invalid = |source| ConfigError::InvalidPublicUrl {
        value: value.to_string(),
        source,
    };

    let base = Url::parse(STUB_ORIGIN).map_err(invalid)?;
    let url = base.join(value).map_err(invalid)?;
    Ok(url.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_root() {
        assert_eq!(resolve(true, None, None).unwrap(), "/");
        assert_eq!(resolve(false, None, None).unwrap(), "/");
        assert_eq!(resolve(false, Some(""), Some("")).unwrap(), "/");
    }

    #[test]
    fn test_override_beats_homepage() {
        let url = resolve(true, Some("/from-homepage"), Some("/from-env")).unwrap();
        assert_eq!(url, "/from-env/");
    }

    #[test]
    fn test_trailing_slash_not_doubled() {
        assert_eq!(resolve(true, None, Some("/app/")).unwrap(), "/app/");
        assert_eq!(resolve(false, None, Some("/app/")).unwrap(), "/app/");
    }

    #[test]
    fn test_scheme_relative_reduces_to_path_in_dev() {
        let url = resolve(true, None, Some("//cdn.example.com/assets")).unwrap();
        assert_eq!(url, "/assets/");
    }

    #[test]
    fn test_malformed_url_is_rejected() {
        let err = resolve(false, None, Some("http://[::1")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPublicUrl { .. }));
    }
}
