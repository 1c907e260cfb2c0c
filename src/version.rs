//! SDK version information and API compatibility checking.

use crate::logger::{log_fields, Logger};
use crate::Error;
use std::cmp::Ordering;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Current SDK version.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Minimum API version this SDK supports.
pub const MIN_API_VERSION: &str = "0.0.0";

/// Newest API version this SDK was built against.
pub const MAX_KNOWN_API_VERSION: &str = "1.0.0";

/// Response header carrying the server's API version.
pub const API_VERSION_HEADER: &str = "X-API-Version";

/// A parsed `major.minor.patch[-prerelease]` version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiVersion {
    /// Major component.
    pub major: u32,
    /// Minor component.
    pub minor: u32,
    /// Patch component.
    pub patch: u32,
    /// Pre-release tag after the first `-`, if any.
    pub prerelease: Option<String>,
}

impl ApiVersion {
    /// Components used for ordering. Pre-release tags do not take part.
    pub fn precedence(&self) -> (u32, u32, u32) {
        (self.major, self.minor, self.patch)
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}

fn numeric(part: &str) -> Option<u32> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn try_parse(version: &str) -> Option<ApiVersion> {
    let (core, prerelease) = match version.split_once('-') {
        Some((_, "")) => return None,
        Some((core, pre)) => (core, Some(pre.to_string())),
        None => (version, None),
    };

    let mut parts = core.split('.');
    let major = numeric(parts.next()?)?;
    let minor = numeric(parts.next()?)?;
    let patch = numeric(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }

    Some(ApiVersion {
        major,
        minor,
        patch,
        prerelease,
    })
}

/// Parse a semver string. Anything that is not `major.minor.patch` with an
/// optional `-prerelease` suffix parses as `0.0.0`.
pub fn parse_version(version: &str) -> ApiVersion {
    try_parse(version.trim()).unwrap_or_default()
}

/// Compare two versions by major, minor and patch.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    parse_version(a)
        .precedence()
        .cmp(&parse_version(b).precedence())
}

/// Check a server-reported API version against the supported range.
///
/// Fails with [`Error::UnsupportedApiVersion`] when the server is older than
/// `min_version`. A server whose major version is newer than `max_known`
/// only produces a warning.
pub fn check_api_version_compatibility(
    api_version: &str,
    min_version: &str,
    max_known_version: &str,
    logger: &dyn Logger,
) -> Result<(), Error> {
    if compare_versions(api_version, min_version) == Ordering::Less {
        return Err(Error::UnsupportedApiVersion {
            api_version: api_version.to_string(),
            min_version: min_version.to_string(),
            max_known_version: max_known_version.to_string(),
        });
    }

    if parse_version(api_version).major > parse_version(max_known_version).major {
        logger.warn(
            &format!(
                "API version {api_version} is newer than this SDK was built for \
                 ({max_known_version}). There may be breaking changes. Consider upgrading the SDK."
            ),
            Some(&log_fields! {
                "api_version" => api_version,
                "sdk_version" => SDK_VERSION,
                "max_known_version" => max_known_version,
            }),
        );
    }

    Ok(())
}

/// One-shot state cell guarding the API version check.
///
/// The first caller of [`VersionGate::check_once`] runs the check while
/// holding the lock and the gate keeps its verdict. Later callers never run
/// the check again; they get the stored verdict, so a server found too old
/// keeps failing with [`Error::UnsupportedApiVersion`].
#[derive(Debug, Default)]
pub struct VersionGate {
    verdict: Mutex<Option<Verdict>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Verdict {
    Compatible,
    Unsupported {
        api_version: String,
        min_version: String,
        max_known_version: String,
    },
}

impl Verdict {
    fn from_outcome(outcome: &Result<(), Error>) -> Self {
        match outcome {
            Err(Error::UnsupportedApiVersion {
                api_version,
                min_version,
                max_known_version,
            }) => Verdict::Unsupported {
                api_version: api_version.clone(),
                min_version: min_version.clone(),
                max_known_version: max_known_version.clone(),
            },
            // Only an incompatible version is worth remembering.
            _ => Verdict::Compatible,
        }
    }

    fn to_result(&self) -> Result<(), Error> {
        match self {
            Verdict::Compatible => Ok(()),
            Verdict::Unsupported {
                api_version,
                min_version,
                max_known_version,
            } => Err(Error::UnsupportedApiVersion {
                api_version: api_version.clone(),
                min_version: min_version.clone(),
                max_known_version: max_known_version.clone(),
            }),
        }
    }
}

impl VersionGate {
    /// Create an unchecked gate.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Verdict>> {
        self.verdict.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True once a check has run.
    pub fn is_checked(&self) -> bool {
        self.lock().is_some()
    }

    /// True if the check found the server's API version unsupported.
    pub fn is_rejected(&self) -> bool {
        matches!(*self.lock(), Some(Verdict::Unsupported { .. }))
    }

    /// Run `check` if no check has run yet on this gate, otherwise replay
    /// the stored verdict.
    pub fn check_once<F>(&self, check: F) -> Result<(), Error>
    where
        F: FnOnce() -> Result<(), Error>,
    {
        let mut verdict = self.lock();
        if let Some(stored) = verdict.as_ref() {
            return stored.to_result();
        }
        let outcome = check();
        *verdict = Some(Verdict::from_outcome(&outcome));
        outcome
    }
}

/// Build the User-Agent string for SDK requests.
pub fn build_user_agent(suffix: Option<&str>) -> String {
    let mut ua = format!(
        "Refyne-SDK-Rust/{} ({}; {})",
        SDK_VERSION,
        std::env::consts::OS,
        std::env::consts::ARCH
    );

    if let Some(s) = suffix.filter(|s| !s.is_empty()) {
        ua.push(' ');
        ua.push_str(s);
    }

    ua
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{LogFields, NoopLogger};
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingLogger {
        warnings: AtomicUsize,
    }

    impl Logger for CountingLogger {
        fn debug(&self, _: &str, _: Option<&LogFields>) {}
        fn info(&self, _: &str, _: Option<&LogFields>) {}
        fn warn(&self, _: &str, _: Option<&LogFields>) {
            self.warnings.fetch_add(1, AtomicOrdering::SeqCst);
        }
        fn error(&self, _: &str, _: Option<&LogFields>) {}
    }

    fn v(major: u32, minor: u32, patch: u32, pre: Option<&str>) -> ApiVersion {
        ApiVersion {
            major,
            minor,
            patch,
            prerelease: pre.map(String::from),
        }
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("1.2.3"), v(1, 2, 3, None));
        assert_eq!(parse_version("0.0.0"), v(0, 0, 0, None));
        assert_eq!(parse_version("10.20.30"), v(10, 20, 30, None));
        assert_eq!(parse_version("1.2.3-beta"), v(1, 2, 3, Some("beta")));
        assert_eq!(parse_version("1.2.3-beta.1"), v(1, 2, 3, Some("beta.1")));
    }

    #[test]
    fn test_unparseable_versions_are_zero() {
        for bad in ["invalid", "", "1.2", "1.2.3.4", "v1.2.3", "1.x.3", "1.2.3-", "+1.2.3"] {
            assert_eq!(parse_version(bad), ApiVersion::default(), "{bad:?}");
        }
    }

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("1.2.3", "1.2.3"), Ordering::Equal);
        assert_eq!(compare_versions("2.0.0", "1.0.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0.0", "2.0.0"), Ordering::Less);
        assert_eq!(compare_versions("1.2.0", "1.1.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.1.2", "1.1.1"), Ordering::Greater);
        assert_eq!(compare_versions("1.2.3-rc.1", "1.2.3"), Ordering::Equal);
    }

    #[test]
    fn test_version_constants() {
        assert_ne!(
            compare_versions(MIN_API_VERSION, MAX_KNOWN_API_VERSION),
            Ordering::Greater
        );
        assert_eq!(parse_version(SDK_VERSION).to_string(), SDK_VERSION);
    }

    #[test]
    fn test_compatibility_check() {
        let logger = CountingLogger::default();

        assert!(check_api_version_compatibility("2.0.0", "1.0.0", "2.0.0", &logger).is_ok());
        assert_eq!(logger.warnings.load(AtomicOrdering::SeqCst), 0);

        let err = check_api_version_compatibility("0.5.0", "1.0.0", "2.0.0", &logger).unwrap_err();
        match err {
            Error::UnsupportedApiVersion {
                api_version,
                min_version,
                ..
            } => {
                assert_eq!(api_version, "0.5.0");
                assert_eq!(min_version, "1.0.0");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Newer major version warns but still succeeds.
        assert!(check_api_version_compatibility("3.1.0", "1.0.0", "2.0.0", &logger).is_ok());
        assert_eq!(logger.warnings.load(AtomicOrdering::SeqCst), 1);

        // Garbage compares as 0.0.0.
        assert!(check_api_version_compatibility("garbage", "1.0.0", "2.0.0", &NoopLogger).is_err());
    }

    #[test]
    fn test_version_gate_runs_once() {
        let gate = VersionGate::new();
        assert!(!gate.is_checked());

        gate.check_once(|| Ok(())).unwrap();
        assert!(gate.is_checked());
        assert!(!gate.is_rejected());

        let mut ran = false;
        gate.check_once(|| {
            ran = true;
            Err(Error::Config("never runs".into()))
        })
        .unwrap();
        assert!(!ran);
    }

    #[test]
    fn test_version_gate_remembers_rejection() {
        let gate = VersionGate::new();
        let reject = || check_api_version_compatibility("0.5.0", "1.0.0", "2.0.0", &NoopLogger);

        assert!(matches!(
            gate.check_once(reject),
            Err(Error::UnsupportedApiVersion { .. })
        ));
        assert!(gate.is_rejected());

        // Later callers get the same verdict without running the check.
        let mut ran = false;
        let err = gate
            .check_once(|| {
                ran = true;
                Ok(())
            })
            .unwrap_err();
        assert!(!ran);
        match err {
            Error::UnsupportedApiVersion {
                api_version,
                min_version,
                max_known_version,
            } => {
                assert_eq!(api_version, "0.5.0");
                assert_eq!(min_version, "1.0.0");
                assert_eq!(max_known_version, "2.0.0");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_version_gate_forgets_other_failures() {
        let gate = VersionGate::new();
        assert!(gate
            .check_once(|| Err(Error::Config("boom".into())))
            .is_err());
        assert!(gate.is_checked());
        assert!(!gate.is_rejected());
        gate.check_once(|| Ok(())).unwrap();
    }

    #[test]
    fn test_version_gate_under_contention() {
        let gate = Arc::new(VersionGate::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let runs = Arc::clone(&runs);
                std::thread::spawn(move || {
                    gate.check_once(|| {
                        runs.fetch_add(1, AtomicOrdering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(5));
                        Ok(())
                    })
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert_eq!(runs.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn test_build_user_agent() {
        let ua = build_user_agent(None);
        assert!(ua.starts_with("Refyne-SDK-Rust/"));
        assert!(ua.contains(SDK_VERSION));
        assert!(ua.contains(std::env::consts::OS));

        let ua_with_suffix = build_user_agent(Some("MyApp/1.0"));
        assert!(ua_with_suffix.ends_with(" MyApp/1.0"));
    }
}
