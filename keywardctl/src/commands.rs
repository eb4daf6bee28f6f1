use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use base64::{Engine, engine::general_purpose::STANDARD};
use keyward_config::{ConfigLoad, ConfigLoader};
use keyward_core::{
    HasherSettings, PasswordAlgorithm, PasswordCredential, PasswordHasher,
};
use rand::{TryRngCore, rngs::OsRng};
use tracing::{info, warn};
use zeroize::Zeroizing;

pub const DEFAULT_SECRET_BYTES: usize = 48;
const MIN_SECRET_BYTES: usize = 32;

pub fn hash_password(
    password: Option<String>,
    stdin: bool,
    algorithm: PasswordAlgorithm,
    iterations: Option<u32>,
) -> Result<ExitCode> {
    let password = read_password(password, stdin)?;

    let settings = match algorithm {
        PasswordAlgorithm::Pbkdf2Sha256 => HasherSettings::pbkdf2(
            iterations.unwrap_or(HasherSettings::DEFAULT_PBKDF2_ITERATIONS),
        ),
        PasswordAlgorithm::Argon2id => HasherSettings::argon2id(
            iterations.unwrap_or(HasherSettings::DEFAULT_ARGON2_ITERATIONS),
            HasherSettings::DEFAULT_ARGON2_MEMORY_KIB,
            1,
        ),
    };
    if algorithm == PasswordAlgorithm::Pbkdf2Sha256
        && settings.iterations < HasherSettings::MIN_PBKDF2_ITERATIONS
    {
        warn!(
            iterations = settings.iterations,
            "iteration count is below the production floor"
        );
    }

    let hasher = PasswordHasher::new(settings).context("invalid hasher settings")?;
    let credential = hasher
        .hash_raw(&password)
        .context("password rejected")?;

    println!("{}", credential.serialize()?);
    Ok(ExitCode::SUCCESS)
}

pub fn verify_password(
    credential: &str,
    password: Option<String>,
    stdin: bool,
) -> Result<ExitCode> {
    let credential = PasswordCredential::deserialize(credential)
        .context("credential is not valid JSON")?;
    let password = read_password(password, stdin)?;

    // Verification reads the cost from the credential itself.
    let hasher = PasswordHasher::new(HasherSettings::default())?;
    if hasher.verify(&password, &credential) {
        println!("match");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("no match");
        Ok(ExitCode::FAILURE)
    }
}

pub fn generate_secret(bytes: usize) -> Result<ExitCode> {
    if bytes < MIN_SECRET_BYTES {
        bail!("--bytes must be at least {MIN_SECRET_BYTES}");
    }

    let mut buffer = Zeroizing::new(vec![0u8; bytes]);
    OsRng
        .try_fill_bytes(buffer.as_mut_slice())
        .map_err(|err| anyhow!("secure random source unavailable: {err}"))?;

    println!("{}", STANDARD.encode(buffer.as_slice()));
    Ok(ExitCode::SUCCESS)
}

pub fn check_config(
    config_path: Option<PathBuf>,
    env_file: Option<PathBuf>,
) -> Result<ExitCode> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = config_path {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = env_file {
        loader = loader.with_env_file(path);
    }

    let ConfigLoad { config, warnings } =
        loader.load().context("failed to load configuration")?;

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    for warning in warnings.iter() {
        match &warning.hint {
            Some(hint) => {
                warn!(detail = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(detail = %warning.message, "configuration warning"),
        }
    }

    config
        .token_settings()
        .context("token settings rejected")?;

    println!(
        "configuration ok: issuer={} audience={} access={}m refresh={}d algorithm={} warnings={}",
        config.tokens.issuer,
        config.tokens.audience,
        config.tokens.access_token_minutes,
        config.tokens.refresh_token_days,
        config.password.algorithm,
        warnings.len()
    );
    Ok(ExitCode::SUCCESS)
}

fn read_password(arg: Option<String>, stdin: bool) -> Result<Zeroizing<String>> {
    match (arg, stdin) {
        (Some(_), true) => bail!("pass the password as an argument or via --stdin, not both"),
        (Some(password), false) => Ok(Zeroizing::new(password)),
        (None, true) => {
            let mut line = Zeroizing::new(String::new());
            io::stdin()
                .lock()
                .read_line(&mut line)
                .context("failed to read password from stdin")?;
            let trimmed = line.trim_end_matches(['\r', '\n']).to_string();
            Ok(Zeroizing::new(trimmed))
        }
        (None, false) => bail!("no password given; pass it as an argument or use --stdin"),
    }
}
