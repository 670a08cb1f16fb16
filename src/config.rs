//! Tool configuration (`sos.toml`).
//!
//! Defines the typed configuration for file classification (text/binary
//! types, ignore lists) and merge defaults. Missing file → all defaults.

use std::fmt;
use std::path::Path;

use glob::Pattern;
use serde::Deserialize;

use crate::hash::progress::{ASCII_SYMBOLS, UNICODE_SYMBOLS};
use crate::merge::MergeOptions;
use crate::model::MergePolicy;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration.
///
/// Missing fields use the defaults listed on each field.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SosConfig {
    /// Compare file contents by hash instead of size and mtime only.
    #[serde(default)]
    pub strict: bool,

    /// Track files by explicit patterns instead of the whole tree.
    #[serde(default)]
    pub track: bool,

    /// Require explicit patterns for every tracked file.
    #[serde(default)]
    pub picky: bool,

    /// Store revision contents gzip-compressed.
    #[serde(default)]
    pub compress: bool,

    /// Use the Unicode block progress spinner (default: on, except Windows).
    #[serde(default = "default_use_unicode_font")]
    pub use_unicode_font: bool,

    /// Patterns of files treated as text.
    #[serde(default = "default_texttype")]
    pub texttype: Vec<String>,

    /// Patterns of files treated as binary, overriding `texttype`.
    #[serde(default)]
    pub bintype: Vec<String>,

    /// Patterns of ignored file names.
    #[serde(default = "default_ignores")]
    pub ignores: Vec<String>,

    /// Patterns exempted from `ignores`.
    #[serde(default)]
    pub ignores_whitelist: Vec<String>,

    /// Patterns of ignored folder names.
    #[serde(default = "default_ignore_dirs")]
    pub ignore_dirs: Vec<String>,

    /// Patterns exempted from `ignore_dirs`.
    #[serde(default)]
    pub ignore_dirs_whitelist: Vec<String>,

    /// Merge defaults.
    #[serde(default)]
    pub merge: MergeConfig,
}

impl Default for SosConfig {
    fn default() -> Self {
        Self {
            strict: false,
            track: false,
            picky: false,
            compress: false,
            use_unicode_font: default_use_unicode_font(),
            texttype: default_texttype(),
            bintype: Vec::new(),
            ignores: default_ignores(),
            ignores_whitelist: Vec::new(),
            ignore_dirs: default_ignore_dirs(),
            ignore_dirs_whitelist: Vec::new(),
            merge: MergeConfig::default(),
        }
    }
}

const fn default_use_unicode_font() -> bool {
    !cfg!(windows)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

fn default_texttype() -> Vec<String> {
    strings(&["*.md", "*.coco", "*.py", "*.pyi", "*.pth"])
}

fn default_ignores() -> Vec<String> {
    strings(&[
        "__coconut__.py",
        "*.bak",
        "*.py[cdo]",
        "*.class",
        ".fslckout",
        "_FOSSIL_",
        "*.sos.zip",
    ])
}

fn default_ignore_dirs() -> Vec<String> {
    strings(&[".*", "__pycache__", ".mypy_cache"])
}

// ---------------------------------------------------------------------------
// MergeConfig
// ---------------------------------------------------------------------------

/// Merge defaults (`[merge]`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeConfig {
    /// Policy for line blocks (default: `both`).
    #[serde(default)]
    pub policy: MergePolicy,

    /// Policy for character spans in single-line replacements
    /// (default: `both`).
    #[serde(default)]
    pub char_policy: MergePolicy,

    /// Compare lines with normalized whitespace.
    #[serde(default)]
    pub ignore_whitespace: bool,

    /// Use the other side's EOL style for merge output.
    #[serde(default)]
    pub use_other_eol: bool,
}

impl MergeConfig {
    /// Merge options for these defaults.
    #[must_use]
    pub const fn options(&self, diff_only: bool) -> MergeOptions {
        MergeOptions {
            policy: self.policy,
            char_policy: self.char_policy,
            diff_only,
            use_other_eol: self.use_other_eol,
            ignore_whitespace: self.ignore_whitespace,
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

fn matches_any(patterns: &[String], name: &str) -> bool {
    patterns
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .any(|pat| pat.matches(name))
}

impl SosConfig {
    /// Whether `name` is a text file: matches `texttype` and not `bintype`.
    #[must_use]
    pub fn is_text_type(&self, name: &str) -> bool {
        matches_any(&self.texttype, name) && !matches_any(&self.bintype, name)
    }

    /// Whether file `name` is ignored.
    #[must_use]
    pub fn is_ignored(&self, name: &str) -> bool {
        matches_any(&self.ignores, name) && !matches_any(&self.ignores_whitelist, name)
    }

    /// Whether folder `name` is ignored.
    #[must_use]
    pub fn is_dir_ignored(&self, name: &str) -> bool {
        matches_any(&self.ignore_dirs, name) && !matches_any(&self.ignore_dirs_whitelist, name)
    }

    /// Spinner symbols for progress output.
    #[must_use]
    pub const fn progress_symbols(&self) -> &'static str {
        if self.use_unicode_font {
            UNICODE_SYMBOLS
        } else {
            ASCII_SYMBOLS
        }
    }

    fn pattern_lists(&self) -> [(&'static str, &[String]); 6] {
        [
            ("texttype", &self.texttype),
            ("bintype", &self.bintype),
            ("ignores", &self.ignores),
            ("ignores_whitelist", &self.ignores_whitelist),
            ("ignore_dirs", &self.ignore_dirs),
            ("ignore_dirs_whitelist", &self.ignore_dirs_whitelist),
        ]
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, patterns) in self.pattern_lists() {
            for pattern in patterns {
                Pattern::new(pattern).map_err(|e| ConfigError {
                    path: None,
                    message: format!("invalid pattern '{pattern}' in {field}: {e}"),
                })?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Error loading a configuration file.
#[derive(Debug)]
pub struct ConfigError {
    /// The path that was being loaded (if available).
    pub path: Option<std::path::PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl SosConfig {
    /// Load configuration from a TOML file.
    ///
    /// - If the file does not exist, returns all defaults (not an error).
    /// - Invalid TOML, unknown fields and malformed patterns are errors.
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors (other than not-found), parse
    /// errors, or invalid glob patterns.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML, unknown fields or invalid
    /// patterns.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError {
                path: None,
                message,
            }
        })?;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_all_fields() {
        let cfg = SosConfig::default();
        assert!(!cfg.strict);
        assert!(!cfg.compress);
        assert_eq!(cfg.texttype.len(), 5);
        assert!(cfg.bintype.is_empty());
        assert_eq!(cfg.ignore_dirs, vec![".*", "__pycache__", ".mypy_cache"]);
        assert_eq!(cfg.merge.policy, MergePolicy::Both);
        assert_eq!(cfg.merge.char_policy, MergePolicy::Both);
        assert!(!cfg.merge.ignore_whitespace);
    }

    #[test]
    fn parse_empty_string() {
        assert_eq!(SosConfig::parse("").unwrap(), SosConfig::default());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
strict = true
compress = true
use_unicode_font = false
texttype = ["*.txt"]
bintype = ["*.bin.txt"]
ignores = ["*.tmp"]
ignores_whitelist = ["keep.tmp"]

[merge]
policy = "insert"
char_policy = "ask"
ignore_whitespace = true
use_other_eol = true
"#;
        let cfg = SosConfig::parse(toml).unwrap();
        assert!(cfg.strict);
        assert!(cfg.compress);
        assert_eq!(cfg.progress_symbols(), ASCII_SYMBOLS);
        assert_eq!(cfg.merge.policy, MergePolicy::Insert);
        assert_eq!(cfg.merge.char_policy, MergePolicy::Ask);

        let options = cfg.merge.options(true);
        assert!(options.diff_only);
        assert!(options.ignore_whitespace);
        assert!(options.use_other_eol);
    }

    #[test]
    fn unknown_field_reports_line() {
        let err = SosConfig::parse("strict = true\nbogus = 1\n").unwrap_err();
        assert!(err.message.contains("line 2"), "{err}");
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = SosConfig::parse("[merge]\npolicy = \"sideways\"\n").unwrap_err();
        assert!(err.to_string().starts_with("config error:"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = SosConfig::parse("ignores = [\"[\"]\n").unwrap_err();
        assert!(err.message.contains("ignores"), "{err}");
    }

    #[test]
    fn classification_honours_whitelists() {
        let cfg = SosConfig::parse(
            r#"
texttype = ["*.txt"]
bintype = ["raw*.txt"]
ignores = ["*.tmp"]
ignores_whitelist = ["keep.tmp"]
"#,
        )
        .unwrap();
        assert!(cfg.is_text_type("notes.txt"));
        assert!(!cfg.is_text_type("raw1.txt"));
        assert!(cfg.is_ignored("scratch.tmp"));
        assert!(!cfg.is_ignored("keep.tmp"));
        assert!(cfg.is_dir_ignored(".git"));
        assert!(!cfg.is_dir_ignored("src"));
    }

    #[test]
    fn default_ignores_cover_compiled_python() {
        let cfg = SosConfig::default();
        assert!(cfg.is_ignored("module.pyc"));
        assert!(cfg.is_ignored("backup.bak"));
        assert!(!cfg.is_ignored("module.py"));
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let cfg = SosConfig::load(Path::new("/nonexistent/sos.toml")).unwrap();
        assert_eq!(cfg, SosConfig::default());
    }
}
