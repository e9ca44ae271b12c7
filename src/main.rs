//! LINDA Signer CLI Application
//!
//! A command-line interface for keys, addresses and signatures.

use clap::{Parser, Subcommand};
use linda_signer::cli::{self, AppState};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lindasign")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Sign and verify LINDA messages and transactions", long_about = None)]
struct Cli {
    /// Signer configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Private key overriding the configured one
    #[arg(short, long, global = true)]
    key: Option<String>,

    /// Use the Ethereum message header instead of the chain header
    #[arg(long, global = true)]
    eth_header: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new key pair
    Keygen,

    /// Address operations
    Address {
        #[command(subcommand)]
        action: AddressCommands,
    },

    /// Sign a hex-encoded message
    SignMessage {
        /// Message as hex, with or without 0x
        #[arg(short, long)]
        message: String,
    },

    /// Verify a message signature
    VerifyMessage {
        /// Message as hex, with or without 0x
        #[arg(short, long)]
        message: String,

        /// Signature in wire form
        #[arg(short, long)]
        signature: String,

        /// Expected signer (defaults to the configured address)
        #[arg(short, long)]
        address: Option<String>,
    },

    /// Sign a transaction JSON file
    SignTx {
        /// Transaction file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Append to existing signatures
        #[arg(long)]
        multisig: bool,
    },

    /// Recover the signers of a transaction JSON file
    Recover {
        /// Transaction file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Hash (and optionally sign) a typed-data JSON file
    TypedHash {
        /// Typed-data file
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Subcommand)]
enum AddressCommands {
    /// Derive the address of a private or public key
    Derive {
        /// Hex key
        #[arg(long)]
        from: String,

        /// Skip malformed characters instead of failing
        #[arg(long)]
        lenient: bool,
    },

    /// Show every rendering of an address
    Convert {
        /// Address in any supported form
        address: String,
    },

    /// Check whether a string is a valid address
    Check {
        /// Candidate string
        address: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Commands that need no configuration
    match &cli.command {
        Commands::Keygen => return cli::cmd_keygen(),
        Commands::Address { action } => {
            return match action {
                AddressCommands::Derive { from, lenient } => {
                    cli::cmd_address_derive(from, *lenient)
                }
                AddressCommands::Convert { address } => cli::cmd_address_convert(address),
                AddressCommands::Check { address } => cli::cmd_address_check(address),
            };
        }
        _ => {}
    }

    // Initialize application state
    let state = AppState::new(cli.config.as_deref(), cli.key.as_deref(), cli.eth_header)?;

    // Process commands
    match cli.command {
        Commands::Keygen | Commands::Address { .. } => unreachable!(),

        Commands::SignMessage { message } => {
            cli::cmd_sign_message(&state, &message, None)?;
        }

        Commands::VerifyMessage {
            message,
            signature,
            address,
        } => {
            cli::cmd_verify_message(&state, &message, &signature, address.as_deref())?;
        }

        Commands::SignTx {
            input,
            output,
            multisig,
        } => {
            cli::cmd_sign_tx(&state, &input, output.as_deref(), None, multisig)?;
        }

        Commands::Recover { input } => {
            cli::cmd_recover(&state, &input)?;
        }

        Commands::TypedHash { input } => {
            cli::cmd_typed_hash(&state, &input, None)?;
        }
    }

    Ok(())
}
