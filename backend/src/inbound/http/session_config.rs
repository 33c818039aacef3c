//! Session cookie configuration.
//!
//! Turns the session toggles loaded by [`crate::settings::AppSettings`] into
//! a signing key and cookie policy. Debug builds fall back to defaults with a
//! warning; release builds require explicit, valid values.

use std::path::{Path, PathBuf};

use actix_web::cookie::{Key, SameSite};
use cap_std::{ambient_authority, fs::Dir};
use tracing::warn;
use zeroize::Zeroize;

/// Default location of the session signing key.
pub const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
const SESSION_KEY_MIN_LEN: usize = 64;
// `Key::derive_from` needs at least this much master material.
const DERIVE_MIN_LEN: usize = 32;
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// Build mode for session configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate defaults and emit warnings for missing toggles.
    Debug,
    /// Release builds require explicit, valid session toggles.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use donor_backend::inbound::http::session_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// if cfg!(debug_assertions) {
    ///     assert_eq!(mode, BuildMode::Debug);
    /// } else {
    ///     assert_eq!(mode, BuildMode::Release);
    /// }
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Raw session toggles as loaded from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionToggles {
    /// Key file path; [`SESSION_KEY_DEFAULT_PATH`] when unset.
    pub key_file: Option<PathBuf>,
    pub cookie_secure: Option<bool>,
    /// `Strict`, `Lax`, or `None`, case-insensitive.
    pub same_site: Option<String>,
    pub allow_ephemeral: Option<bool>,
}

/// Session settings derived from configuration toggles.
pub struct SessionSettings {
    /// Signing key for cookie sessions.
    pub key: Key,
    /// Whether session cookies are marked `Secure`.
    pub cookie_secure: bool,
    /// Configured `SameSite` policy for session cookies.
    pub same_site: SameSite,
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    /// A toggle required in release builds is missing.
    #[error("missing required session setting: {name}")]
    MissingSetting { name: &'static str },
    /// A toggle is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidSetting {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// Reading the session key file failed.
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The session key file exists but is too short for release builds.
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    /// `SameSite=None` requires a secure cookie in release builds.
    #[error("same_site=None requires cookie_secure=true")]
    InsecureSameSiteNone,
    /// Release builds must not allow ephemeral session keys.
    #[error("allow_ephemeral must be false in release builds")]
    EphemeralNotAllowed,
}

/// Validate `toggles` for `mode` and load the signing key.
///
/// # Errors
///
/// Returns [`SessionConfigError`] when a release build is missing a toggle,
/// carries an invalid value, or cannot read a long enough key.
///
/// # Examples
///
/// ```rust
/// use donor_backend::inbound::http::session_config::{
///     BuildMode, SessionToggles, session_settings,
/// };
///
/// let toggles = SessionToggles {
///     key_file: Some("/nonexistent/session_key".into()),
///     cookie_secure: Some(false),
///     same_site: Some("lax".into()),
///     allow_ephemeral: Some(true),
/// };
/// let settings = session_settings(&toggles, BuildMode::Debug).expect("debug defaults");
/// assert!(!settings.cookie_secure);
/// ```
pub fn session_settings(
    toggles: &SessionToggles,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let cookie_secure = cookie_secure(toggles, mode)?;
    let same_site = same_site(toggles, mode, cookie_secure)?;
    let allow_ephemeral = allow_ephemeral(toggles, mode)?;
    let key = session_key(toggles, mode, allow_ephemeral)?;

    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

fn cookie_secure(toggles: &SessionToggles, mode: BuildMode) -> Result<bool, SessionConfigError> {
    match toggles.cookie_secure {
        Some(flag) => Ok(flag),
        None if mode.is_debug() => {
            warn!("cookie_secure not set; defaulting to secure");
            Ok(true)
        }
        None => Err(SessionConfigError::MissingSetting {
            name: "cookie_secure",
        }),
    }
}

fn same_site(
    toggles: &SessionToggles,
    mode: BuildMode,
    cookie_secure: bool,
) -> Result<SameSite, SessionConfigError> {
    let default_same_site = if mode.is_debug() {
        SameSite::Lax
    } else {
        SameSite::Strict
    };

    let Some(value) = toggles.same_site.as_deref() else {
        if mode.is_debug() {
            warn!("same_site not set; using default");
            return Ok(default_same_site);
        }
        return Err(SessionConfigError::MissingSetting { name: "same_site" });
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "lax" => Ok(SameSite::Lax),
        "strict" => Ok(SameSite::Strict),
        "none" => {
            if !cookie_secure {
                if !mode.is_debug() {
                    return Err(SessionConfigError::InsecureSameSiteNone);
                }
                warn!("same_site=None without secure cookies; browsers may reject the cookie");
            }
            Ok(SameSite::None)
        }
        _ if mode.is_debug() => {
            warn!(value, "invalid same_site, using default");
            Ok(default_same_site)
        }
        _ => Err(SessionConfigError::InvalidSetting {
            name: "same_site",
            value: value.to_owned(),
            expected: SAMESITE_EXPECTED,
        }),
    }
}

fn allow_ephemeral(toggles: &SessionToggles, mode: BuildMode) -> Result<bool, SessionConfigError> {
    match (toggles.allow_ephemeral, mode) {
        (Some(true), BuildMode::Release) => Err(SessionConfigError::EphemeralNotAllowed),
        (Some(flag), _) => Ok(flag),
        (None, _) => Ok(false),
    }
}

fn session_key(
    toggles: &SessionToggles,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SessionConfigError> {
    let path = toggles
        .key_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(SESSION_KEY_DEFAULT_PATH));

    match read_key_bytes(&path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if mode == BuildMode::Release && length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(SessionConfigError::KeyTooShort {
                    path,
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            if length < DERIVE_MIN_LEN {
                bytes.zeroize();
                warn!(path = %path.display(), length, "session key too short; using temporary key");
                return Ok(Key::generate());
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) if mode.is_debug() || allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %error,
                "using temporary session key (dev only)"
            );
            Ok(Key::generate())
        }
        Err(error) => Err(SessionConfigError::KeyRead {
            path,
            source: error,
        }),
    }
}

fn read_key_bytes(path: &Path) -> std::io::Result<Vec<u8>> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "key path has no file name")
    })?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    dir.read(file_name)
}

#[cfg(test)]
mod tests {
    //! Validation of session toggles per build mode.

    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct KeyFile {
        _dir: TempDir,
        path: PathBuf,
    }

    fn key_file(len: usize) -> KeyFile {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("session_key");
        let handle = Dir::open_ambient_dir(dir.path(), ambient_authority()).expect("open dir");
        handle
            .write("session_key", vec![b'a'; len])
            .expect("write key");
        KeyFile { _dir: dir, path }
    }

    #[fixture]
    fn long_key() -> KeyFile {
        key_file(SESSION_KEY_MIN_LEN)
    }

    fn release_toggles(path: &Path) -> SessionToggles {
        SessionToggles {
            key_file: Some(path.to_path_buf()),
            cookie_secure: Some(true),
            same_site: Some("Strict".to_owned()),
            allow_ephemeral: Some(false),
        }
    }

    #[rstest]
    fn release_accepts_explicit_toggles(long_key: KeyFile) {
        let settings = session_settings(&release_toggles(&long_key.path), BuildMode::Release)
            .expect("valid release settings");

        assert!(settings.cookie_secure);
        assert_eq!(settings.same_site, SameSite::Strict);
    }

    #[rstest]
    fn debug_defaults_when_unset() {
        let toggles = SessionToggles {
            key_file: Some(PathBuf::from("/nonexistent/donor-backend/key")),
            ..SessionToggles::default()
        };

        let settings = session_settings(&toggles, BuildMode::Debug).expect("debug defaults");

        assert!(settings.cookie_secure);
        assert_eq!(settings.same_site, SameSite::Lax);
    }

    #[rstest]
    #[case::cookie_secure("cookie_secure")]
    #[case::same_site("same_site")]
    fn release_requires_toggles(long_key: KeyFile, #[case] name: &str) {
        let mut toggles = release_toggles(&long_key.path);
        match name {
            "cookie_secure" => toggles.cookie_secure = None,
            _ => toggles.same_site = None,
        }

        let error = session_settings(&toggles, BuildMode::Release)
            .err()
            .expect("missing toggle");

        assert!(matches!(
            error,
            SessionConfigError::MissingSetting { name: missing } if missing == name
        ));
    }

    #[rstest]
    fn release_rejects_unknown_same_site(long_key: KeyFile) {
        let mut toggles = release_toggles(&long_key.path);
        toggles.same_site = Some("sometimes".to_owned());

        let error = session_settings(&toggles, BuildMode::Release)
            .err()
            .expect("invalid same_site");

        assert!(matches!(error, SessionConfigError::InvalidSetting { .. }));
    }

    #[rstest]
    fn release_rejects_insecure_same_site_none(long_key: KeyFile) {
        let mut toggles = release_toggles(&long_key.path);
        toggles.same_site = Some("None".to_owned());
        toggles.cookie_secure = Some(false);

        let error = session_settings(&toggles, BuildMode::Release)
            .err()
            .expect("insecure none");

        assert!(matches!(error, SessionConfigError::InsecureSameSiteNone));
    }

    #[rstest]
    fn debug_allows_insecure_same_site_none() {
        let toggles = SessionToggles {
            key_file: Some(PathBuf::from("/nonexistent/donor-backend/key")),
            cookie_secure: Some(false),
            same_site: Some("none".to_owned()),
            allow_ephemeral: None,
        };

        let settings = session_settings(&toggles, BuildMode::Debug).expect("debug");

        assert_eq!(settings.same_site, SameSite::None);
    }

    #[rstest]
    fn release_rejects_ephemeral_keys(long_key: KeyFile) {
        let mut toggles = release_toggles(&long_key.path);
        toggles.allow_ephemeral = Some(true);

        let error = session_settings(&toggles, BuildMode::Release)
            .err()
            .expect("ephemeral");

        assert!(matches!(error, SessionConfigError::EphemeralNotAllowed));
    }

    #[rstest]
    fn release_rejects_short_key() {
        let short = key_file(SESSION_KEY_MIN_LEN - 1);

        let error = session_settings(&release_toggles(&short.path), BuildMode::Release)
            .err()
            .expect("short key");

        assert!(matches!(
            error,
            SessionConfigError::KeyTooShort { length, .. } if length == SESSION_KEY_MIN_LEN - 1
        ));
    }

    #[rstest]
    fn release_reports_missing_key_file() {
        let toggles = release_toggles(Path::new("/nonexistent/donor-backend/key"));

        let error = session_settings(&toggles, BuildMode::Release)
            .err()
            .expect("missing key");

        assert!(matches!(error, SessionConfigError::KeyRead { .. }));
    }

    #[rstest]
    fn debug_accepts_short_key() {
        let short = key_file(8);
        let mut toggles = release_toggles(&short.path);
        toggles.allow_ephemeral = None;

        assert!(session_settings(&toggles, BuildMode::Debug).is_ok());
    }
}
