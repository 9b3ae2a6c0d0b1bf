//! The key generation run.
//!
//! [`GenerateRequest::prepare`] validates every option and argument and
//! seeds the registry before anything is generated; [`generate`] then walks
//! the requested levels in order, writing one private key source per level,
//! and finishes by rewriting the merged public key table.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::artifact::private::PrivateKeySource;
use crate::artifact::public::PublicKeyTable;
use crate::artifact::{self, ArtifactError};
use crate::config::{Config, ConfigError};
use crate::crypto::{self, CryptoError, CryptoProvider};
use crate::keygen::KeyPairGenerator;
use crate::keyspec::{self, KeySpec, KeySpecError};
use crate::naming::{self, NamingError, OutputPattern};
use crate::registry::{KeyRegistry, RegistryError};

/// Broad classes of failure, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad option or argument; detected before any key is generated.
    InvalidArgument,
    /// Key generation, encoding or encryption failed.
    Crypto,
    /// An input or output file could not be read or written.
    Io,
}

/// Any failure of a generation run.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    KeySpec(#[from] KeySpecError),

    #[error(transparent)]
    Naming(#[from] NamingError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    MissingOption(&'static str),
}

impl GenerateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerateError::KeySpec(_)
            | GenerateError::Naming(_)
            | GenerateError::Config(_)
            | GenerateError::MissingOption(_)
            | GenerateError::Registry(RegistryError::Parse { .. }) => ErrorKind::InvalidArgument,
            GenerateError::Crypto(_) => ErrorKind::Crypto,
            GenerateError::Artifact(_) | GenerateError::Registry(RegistryError::Read { .. }) => {
                ErrorKind::Io
            }
        }
    }
}

const NO_PRIVATE_OUTPUT: &str =
    "You must use the -b option to specify the private key output filenames.";
const NO_PUBLIC_OUTPUT: &str = "No -a specified, and no public key file configured \
     (set [public_keys] file in .prckey.toml or PRCKEY_PUBLIC_KEYS_FILE).";

/// Raw command-line input, before validation.
#[derive(Default)]
pub struct Options {
    /// `-a`: the public key table to write.
    pub public_output: Option<PathBuf>,
    /// `-b`: the private key output pattern.
    pub private_output: Option<PathBuf>,
    /// `-p`: pass phrase for every key without its own.
    pub passphrase: Option<String>,
    /// `level[,pass phrase]` arguments.
    pub keys: Vec<String>,
}

/// A fully validated generation run.
#[derive(Debug)]
pub struct GenerateRequest {
    pub public_output: PathBuf,
    pub private_pattern: OutputPattern,
    pub keys: Vec<KeySpec>,
    pub signing_template: String,
}

impl GenerateRequest {
    /// Validate `options` against `config` and load the registry the run
    /// will update.
    ///
    /// When `-a` is given the table starts empty. Otherwise the configured
    /// public key file is both the output and, if it already exists, the
    /// source of every key this run does not regenerate.
    pub fn prepare(options: &Options, config: &Config) -> Result<(Self, KeyRegistry), GenerateError> {
        let (public_output, seed_from_existing) = match &options.public_output {
            Some(path) => {
                naming::check_extension(path, "Public")?;
                (path.clone(), false)
            }
            None => {
                let path = config
                    .public_keys
                    .file
                    .clone()
                    .ok_or(GenerateError::MissingOption(NO_PUBLIC_OUTPUT))?;
                naming::check_extension(&path, "Public")?;
                (path, true)
            }
        };

        let private_output = options
            .private_output
            .as_deref()
            .ok_or(GenerateError::MissingOption(NO_PRIVATE_OUTPUT))?;
        let private_pattern = OutputPattern::parse(private_output)?;

        let keys = keyspec::parse_key_specs(options.keys.as_slice(), options.passphrase.as_deref())?;

        let registry = if seed_from_existing && public_output.exists() {
            KeyRegistry::load_existing(&public_output)?
        } else {
            KeyRegistry::new()
        };

        Ok((
            Self {
                public_output,
                private_pattern,
                keys,
                signing_template: config.signing.template.clone(),
            },
            registry,
        ))
    }
}

/// What a completed run wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateSummary {
    pub public_output: PathBuf,
    /// One path per requested level, in request order.
    pub private_outputs: Vec<PathBuf>,
    /// Number of slots in the written public key table.
    pub table_len: usize,
}

/// Generate one key per requested level, write its private key source,
/// then rewrite the public key table from `registry`.
///
/// All keys are stamped with `generated_at`. Files are written as the run
/// goes; a failure part way leaves earlier private key files in place and
/// the public key table untouched.
pub fn generate<P: CryptoProvider>(
    request: &GenerateRequest,
    provider: &P,
    registry: &mut KeyRegistry,
    generated_at: u64,
) -> Result<GenerateSummary, GenerateError> {
    let generator = KeyPairGenerator::with_timestamp(provider, generated_at);
    let mut private_outputs = Vec::with_capacity(request.keys.len());

    for spec in &request.keys {
        info!("Generating key {}", spec.level);
        let pair = generator.generate()?;

        let public_key = provider.encode_public_key(&pair.key)?;
        info!(
            level = spec.level.get(),
            fingerprint = %crypto::fingerprint(&public_key),
            "public key"
        );
        registry.set_key(spec.level, public_key, pair.generated_at);

        let output = request.private_pattern.resolve(spec.level);
        debug!(
            level = spec.level.get(),
            path = %output.path.display(),
            explicit_suffix = output.explicit_suffix,
            passphrase = ?spec.passphrase,
            "private key output"
        );
        if spec.passphrase.is_unencrypted() {
            warn!(
                "Private key {} will be stored unencrypted in {}",
                spec.level,
                output.path.display()
            );
        }

        let source = PrivateKeySource::encode(
            provider,
            &pair,
            spec.level,
            &output,
            &spec.passphrase,
            &request.signing_template,
        )?;
        artifact::write_artifact(&output.path, &source)?;
        private_outputs.push(output.path);
    }

    artifact::write_artifact(&request.public_output, &PublicKeyTable::new(registry))?;

    Ok(GenerateSummary {
        public_output: request.public_output.clone(),
        private_outputs,
        table_len: registry.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::SourceArtifact;
    use crate::crypto::testing::FakeProvider;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn options(dir: &Path, keys: &[&str]) -> Options {
        Options {
            public_output: Some(dir.join("pub.cxx")),
            private_output: Some(dir.join("priv.cxx")),
            passphrase: None,
            keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    #[test]
    fn prepare_rejects_bad_public_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path(), &["1"]);
        opts.public_output = Some(dir.path().join("pub.h"));

        let err = GenerateRequest::prepare(&opts, &Config::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().starts_with("Public key output file"));
    }

    #[test]
    fn prepare_requires_private_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path(), &["1"]);
        opts.private_output = None;

        let err = GenerateRequest::prepare(&opts, &Config::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("-b option"));
    }

    #[test]
    fn prepare_requires_some_public_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path(), &["1"]);
        opts.public_output = None;

        let err = GenerateRequest::prepare(&opts, &Config::default()).unwrap_err();
        assert!(matches!(err, GenerateError::MissingOption(_)));
        assert!(err.to_string().starts_with("No -a specified"));
    }

    #[test]
    fn prepare_checks_public_before_private() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path(), &["1"]);
        opts.public_output = Some(dir.path().join("pub.txt"));
        opts.private_output = None;

        let err = GenerateRequest::prepare(&opts, &Config::default()).unwrap_err();
        assert!(matches!(err, GenerateError::Naming(_)));
    }

    #[test]
    fn prepare_rejects_bad_level() {
        let dir = tempfile::tempdir().unwrap();
        let err = GenerateRequest::prepare(&options(dir.path(), &["1", "0"]), &Config::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            err.to_string(),
            "key numbers must be greater than 0; you specified 0"
        );
    }

    #[test]
    fn prepare_with_explicit_public_output_ignores_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pub.cxx"), "not a table").unwrap();

        let (request, registry) =
            GenerateRequest::prepare(&options(dir.path(), &["1"]), &Config::default()).unwrap();
        assert!(registry.is_empty());
        assert_eq!(request.signing_template, "signPrcFile_src.cxx");
    }

    #[test]
    fn prepare_seeds_from_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        let public = dir.path().join("configured.cxx");
        let mut existing = KeyRegistry::new();
        existing.set_key(
            crate::keyspec::TrustLevel::new(4).unwrap(),
            b"-----BEGIN PUBLIC KEY-----\nOLD\n-----END PUBLIC KEY-----\n".to_vec(),
            100,
        );
        std::fs::write(&public, PublicKeyTable::new(&existing).render()).unwrap();

        let mut config = Config::default();
        config.public_keys.file = Some(public.clone());
        let mut opts = options(dir.path(), &["1"]);
        opts.public_output = None;

        let (request, registry) = GenerateRequest::prepare(&opts, &config).unwrap();
        assert_eq!(request.public_output, public);
        assert_eq!(registry, existing);
    }

    #[test]
    fn prepare_reports_unparseable_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        let public = dir.path().join("configured.cxx");
        std::fs::write(&public, "garbage").unwrap();

        let mut config = Config::default();
        config.public_keys.file = Some(public);
        let mut opts = options(dir.path(), &["1"]);
        opts.public_output = None;

        let err = GenerateRequest::prepare(&opts, &config).unwrap_err();
        assert!(matches!(err, GenerateError::Registry(RegistryError::Parse { .. })));
    }

    #[test]
    fn generate_writes_private_files_then_table() {
        let dir = tempfile::tempdir().unwrap();
        let (request, mut registry) =
            GenerateRequest::prepare(&options(dir.path(), &["1", "2,pw"]), &Config::default())
                .unwrap();
        let provider = FakeProvider::default();

        let summary = generate(&request, &provider, &mut registry, 1_000).unwrap();

        assert_eq!(
            summary.private_outputs,
            vec![dir.path().join("priv.cxx"), dir.path().join("priv2.cxx")]
        );
        assert_eq!(summary.table_len, 3);

        let level2 = std::fs::read_to_string(dir.path().join("priv2.cxx")).unwrap();
        assert!(level2.contains("PRIV2:pw"));
        assert!(level2.contains("#define GENERATED_TIME 1000\n"));

        let table = std::fs::read_to_string(dir.path().join("pub.cxx")).unwrap();
        assert!(table.contains("PUB1"));
        assert!(table.contains("PUB2"));
    }

    #[test]
    fn duplicate_level_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let (request, mut registry) =
            GenerateRequest::prepare(&options(dir.path(), &["3", "3"]), &Config::default())
                .unwrap();
        let provider = FakeProvider::default();

        generate(&request, &provider, &mut registry, 1).unwrap();

        let key = registry.get(3).and_then(|e| e.public_key.clone()).unwrap();
        assert!(String::from_utf8(key).unwrap().contains("PUB2"));
        let private = std::fs::read_to_string(dir.path().join("priv3.cxx")).unwrap();
        assert!(private.contains("PRIV2:prompted"));
    }

    #[test]
    fn crypto_failure_stops_before_table() {
        let dir = tempfile::tempdir().unwrap();
        let (request, mut registry) =
            GenerateRequest::prepare(&options(dir.path(), &["1", "2"]), &Config::default())
                .unwrap();
        let provider = FakeProvider {
            fail_after: Some(1),
            ..Default::default()
        };

        let err = generate(&request, &provider, &mut registry, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Crypto);
        assert!(dir.path().join("priv.cxx").exists());
        assert!(!dir.path().join("priv2.cxx").exists());
        assert!(!dir.path().join("pub.cxx").exists());
    }

    #[test]
    fn unwritable_output_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path(), &["1"]);
        opts.private_output = Some(dir.path().join("missing").join("priv.cxx"));
        let (request, mut registry) = GenerateRequest::prepare(&opts, &Config::default()).unwrap();

        let err = generate(&request, &FakeProvider::default(), &mut registry, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("priv.cxx"));
    }
}
