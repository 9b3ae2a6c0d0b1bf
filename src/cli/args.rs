//! Clap argument types.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

use prckey::pipeline::Options;

const ABOUT: &str = "Generate public and private keys for signing prc files.";

const LONG_ABOUT: &str = "\
Generates one or more new key pairs for signing prc files, one per trust
level. The public keys are written to a single source file that is compiled
in with the runtime so it can verify signatures; each private key is written
to its own source file, which compiles to a program that signs prc files at
that trust level.

Each LEVEL argument is an integer naming one trust level to generate (hex
with 0x and octal with a leading 0 are accepted). A level may carry its own
pass phrase as LEVEL,PASS, which overrides -p for that key only. There
should be one key for each trust level required; a typical application will
only need one or two.";

const AFTER_HELP: &str = "\
If no pass phrase is given, either with -p or as LEVEL,PASS, you are
prompted for one interactively. Every user of the signing programs will need
to know it. Give an empty pass phrase (-p \"\" or LEVEL,) to store the key
unencrypted, so the signing programs run without one.

When -a is omitted, the public key file named by PRCKEY_PUBLIC_KEYS_FILE or
[public_keys] file in .prckey.toml is used; keys already in that file and not
regenerated are kept.";

/// Command line for `make-prc-key`.
#[derive(Parser, Debug)]
#[command(
    name = prckey::constants::APP_NAME,
    version = prckey::constants::VERSION,
    about = ABOUT,
    long_about = LONG_ABOUT,
    after_help = AFTER_HELP,
)]
pub struct Cli {
    /// Public key output file; must end in .cxx.
    #[arg(short = 'a', value_name = "PUB_OUTFILE.cxx")]
    pub public_output: Option<PathBuf>,

    /// Private key output files; '#' in the name is replaced by the trust level.
    ///
    /// Without '#', level 1 is written to the name as given and every other
    /// level gets its number appended before the extension.
    #[arg(short = 'b', value_name = "PRIV_OUTFILE#.cxx")]
    pub private_output: Option<PathBuf>,

    /// Pass phrase used to encrypt every private key without its own.
    #[arg(short = 'p', value_name = "PASS_PHRASE")]
    pub passphrase: Option<String>,

    /// Increase log detail (-v debug, -vv trace).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Trust levels to generate, each as LEVEL or LEVEL,PASS_PHRASE.
    #[arg(value_name = "LEVEL[,PASS]", required = true, allow_negative_numbers = true)]
    pub keys: Vec<String>,
}

impl Cli {
    /// The generation options, ready for validation.
    pub fn into_options(self) -> Options {
        Options {
            public_output: self.public_output,
            private_output: self.private_output,
            passphrase: self.passphrase,
            keys: self.keys,
        }
    }
}
