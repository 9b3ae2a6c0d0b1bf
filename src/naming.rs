//! Output file naming.
//!
//! The private key path given with `-b` may contain a `#`, which is
//! replaced by the trust level. Without one, level 1 gets the bare name and
//! every other level gets its number appended before the extension, so a
//! project with a single key never sees a stray `1` in its file names.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::constants::{LEVEL_PLACEHOLDER, SOURCE_EXTENSION};
use crate::keyspec::TrustLevel;

/// Errors validating an output path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamingError {
    #[error("{kind} key output file '{path}' should have a .{ext} extension", ext = SOURCE_EXTENSION)]
    BadExtension { kind: &'static str, path: String },
}

/// Check that `path` ends in the generated source extension.
pub fn check_extension(path: &Path, kind: &'static str) -> Result<(), NamingError> {
    if path.extension().is_some_and(|e| e == SOURCE_EXTENSION) {
        Ok(())
    } else {
        Err(NamingError::BadExtension {
            kind,
            path: path.display().to_string(),
        })
    }
}

/// A private key output path split around its placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPattern {
    prefix: String,
    suffix: String,
    has_placeholder: bool,
}

/// Where one level's private key file goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutput {
    pub path: PathBuf,
    /// Whether names derived for this level carry the level number.
    pub explicit_suffix: bool,
}

impl ResolvedOutput {
    /// Program name for the signing tool built from this file: the file
    /// name without its extension.
    pub fn program_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl OutputPattern {
    /// Validate the extension and split the path around the first `#`.
    pub fn parse(path: &Path) -> Result<Self, NamingError> {
        check_extension(path, "Private")?;

        let full = path.to_string_lossy();
        let ext = format!(".{SOURCE_EXTENSION}");
        let Some(stem) = full.strip_suffix(ext.as_str()) else {
            return Err(NamingError::BadExtension {
                kind: "Private",
                path: path.display().to_string(),
            });
        };

        Ok(match stem.find(LEVEL_PLACEHOLDER) {
            Some(pos) => OutputPattern {
                prefix: stem[..pos].to_string(),
                suffix: format!("{}{ext}", &stem[pos + LEVEL_PLACEHOLDER.len_utf8()..]),
                has_placeholder: true,
            },
            None => OutputPattern {
                prefix: stem.to_string(),
                suffix: ext,
                has_placeholder: false,
            },
        })
    }

    pub fn has_placeholder(&self) -> bool {
        self.has_placeholder
    }

    /// Resolve the output path for `level`.
    pub fn resolve(&self, level: TrustLevel) -> ResolvedOutput {
        resolve(&self.prefix, &self.suffix, level, self.has_placeholder)
    }
}

/// Join `prefix`, the level number when required, and `suffix`.
///
/// The level is written whenever a placeholder was given, and otherwise
/// for every level except 1.
pub fn resolve(prefix: &str, suffix: &str, level: TrustLevel, has_placeholder: bool) -> ResolvedOutput {
    let explicit_suffix = has_placeholder || level.get() != 1;
    let path = if explicit_suffix {
        format!("{prefix}{level}{suffix}")
    } else {
        format!("{prefix}{suffix}")
    };

    ResolvedOutput {
        path: PathBuf::from(path),
        explicit_suffix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(n: i64) -> TrustLevel {
        TrustLevel::new(n).unwrap()
    }

    fn resolve_path(pattern: &str, n: i64) -> PathBuf {
        OutputPattern::parse(Path::new(pattern))
            .unwrap()
            .resolve(level(n))
            .path
    }

    #[test]
    fn no_placeholder_level_one_is_bare() {
        let out = OutputPattern::parse(Path::new("priv.cxx")).unwrap().resolve(level(1));
        assert_eq!(out.path, PathBuf::from("priv.cxx"));
        assert!(!out.explicit_suffix);
        assert_eq!(out.program_name(), "priv");
    }

    #[test]
    fn no_placeholder_other_levels_are_numbered() {
        assert_eq!(resolve_path("priv.cxx", 2), PathBuf::from("priv2.cxx"));
        assert_eq!(resolve_path("out/sign.cxx", 10), PathBuf::from("out/sign10.cxx"));
    }

    #[test]
    fn placeholder_always_numbered() {
        let out = OutputPattern::parse(Path::new("priv#.cxx")).unwrap().resolve(level(1));
        assert_eq!(out.path, PathBuf::from("priv1.cxx"));
        assert!(out.explicit_suffix);
        assert_eq!(out.program_name(), "priv1");
    }

    #[test]
    fn placeholder_in_middle_keeps_suffix() {
        assert_eq!(resolve_path("sign_#_key.cxx", 3), PathBuf::from("sign_3_key.cxx"));
        assert_eq!(resolve_path("keys/level#/sign.cxx", 2), PathBuf::from("keys/level2/sign.cxx"));
    }

    #[test]
    fn only_first_placeholder_is_replaced() {
        assert_eq!(resolve_path("a#b#.cxx", 4), PathBuf::from("a4b#.cxx"));
    }

    #[test]
    fn rejects_wrong_extension() {
        let err = OutputPattern::parse(Path::new("priv.cpp")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Private key output file 'priv.cpp' should have a .cxx extension"
        );
        assert!(OutputPattern::parse(Path::new("priv")).is_err());
    }

    #[test]
    fn check_extension_names_the_kind() {
        let err = check_extension(Path::new("pub.h"), "Public").unwrap_err();
        assert!(err.to_string().starts_with("Public key output file"));
        assert!(check_extension(Path::new("dir/pub.cxx"), "Public").is_ok());
    }

    #[test]
    fn free_resolve_matches_policy() {
        let bare = resolve("p", ".cxx", level(1), false);
        let numbered = resolve("p", ".cxx", level(1), true);
        assert_eq!(bare.path, PathBuf::from("p.cxx"));
        assert_eq!(numbered.path, PathBuf::from("p1.cxx"));
    }
}
