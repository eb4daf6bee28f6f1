use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use keyward_core::PasswordAlgorithm;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "keywardctl", about = "Keyward operator tooling", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Hash a password and print the serialized credential
    HashPassword {
        /// Password to hash; prefer --stdin so it stays out of shell history
        password: Option<String>,
        /// Read the password from the first line of stdin
        #[arg(long)]
        stdin: bool,
        #[arg(long, value_enum, default_value = "pbkdf2-sha256")]
        algorithm: AlgorithmArg,
        /// PBKDF2 rounds or Argon2 time cost (defaults per algorithm)
        #[arg(long)]
        iterations: Option<u32>,
    },
    /// Check a password against a serialized credential (exit 0 on match)
    VerifyPassword {
        /// Credential JSON as printed by hash-password
        #[arg(long)]
        credential: String,
        password: Option<String>,
        #[arg(long)]
        stdin: bool,
    },
    /// Print a random base64 signing secret
    GenerateSecret {
        #[arg(long, default_value_t = commands::DEFAULT_SECRET_BYTES)]
        bytes: usize,
    },
    /// Load configuration, report warnings and fail on guard-rail violations
    CheckConfig {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        env_file: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    #[value(name = "pbkdf2-sha256")]
    Pbkdf2Sha256,
    Argon2id,
}

impl From<AlgorithmArg> for PasswordAlgorithm {
    fn from(value: AlgorithmArg) -> Self {
        match value {
            AlgorithmArg::Pbkdf2Sha256 => PasswordAlgorithm::Pbkdf2Sha256,
            AlgorithmArg::Argon2id => PasswordAlgorithm::Argon2id,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays pipeable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::HashPassword {
            password,
            stdin,
            algorithm,
            iterations,
        } => commands::hash_password(password, stdin, algorithm.into(), iterations),
        Command::VerifyPassword {
            credential,
            password,
            stdin,
        } => commands::verify_password(&credential, password, stdin),
        Command::GenerateSecret { bytes } => commands::generate_secret(bytes),
        Command::CheckConfig { config, env_file } => {
            commands::check_config(config, env_file)
        }
    }
}
