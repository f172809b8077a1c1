use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use guarantor::dal::Dal;
use guarantor::kvstore::Mode;
use guarantor_crypto::Ed25519KeyPair;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[clap(name = "guarantor", about = "drive the guarantor data access layer from the command line")]
struct Cli {
    /// Directory backing the KV change store.
    #[clap(long)]
    store: Option<PathBuf>,
    /// Path to this node's signing keypair (a hex-encoded 32-byte seed). Created if missing.
    #[clap(long)]
    keypair: Option<PathBuf>,
    /// Proof-of-work difficulty floor for changes this command mints.
    #[clap(long)]
    difficulty: Option<u32>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new document, printing its head change id and rev.
    New {
        doctype: String,
        /// Document fields as a JSON object.
        fields: String,
    },
    /// Apply a field update to an existing document's chain.
    Update {
        /// Change id of the document's current head.
        head: String,
        /// Fields to merge, as a JSON object.
        fields: String,
    },
    /// Replay a document's chain from its head change id and print the result.
    Get { head: String },
    /// Search a doctype's declared fields for a term.
    Find { doctype: String, field: String, term: String },
}

/// Loads the keypair at `path`, generating and persisting a fresh one if it doesn't exist yet —
/// the same hex-seed-file pattern this codebase's relay node uses for its libp2p identity.
fn load_or_create_keypair(path: &PathBuf) -> Result<Ed25519KeyPair> {
    if path.is_file() {
        let seed_hex = fs::read_to_string(path).context("reading keypair file")?;
        let seed_bytes = hex::decode(seed_hex.trim()).context("decoding keypair seed")?;
        let seed: [u8; 32] = seed_bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("keypair seed must be 32 bytes"))?;
        Ed25519KeyPair::from_seed(&seed).context("restoring keypair from seed")
    } else {
        let key = Ed25519KeyPair::generate();
        fs::write(path, hex::encode(key.seed())).context("writing keypair file")?;
        tracing::info!(path = %path.display(), "generated a new keypair");
        Ok(key)
    }
}

fn main() -> Result<()> {
    guarantor::logging::init();
    let cli = Cli::parse();

    let mut config = guarantor::Config::default();
    if let Some(store) = cli.store {
        config.store_dir = store;
    }
    if let Some(keypair) = cli.keypair {
        config.keypair_path = keypair;
    }
    if let Some(difficulty) = cli.difficulty {
        config.difficulty = difficulty;
    }
    config.apply_env_overrides();

    let dal = Dal::new(guarantor_kvstore::Store::open(&config.store_dir, Mode::ReadWrite)?, config.difficulty);

    match cli.command {
        Command::New { doctype, fields } => {
            let key = load_or_create_keypair(&config.keypair_path)?;
            let fields: serde_json::Value = serde_json::from_str(&fields).context("parsing fields as JSON")?;
            let mut wrapper = dal.create(&key, &doctype, fields)?;
            wrapper.save(&dal)?;
            println!("{{\"head\": \"{}\", \"rev\": \"{}\"}}", wrapper.head(), wrapper.head_rev().as_str());
        }
        Command::Update { head, fields } => {
            let key = load_or_create_keypair(&config.keypair_path)?;
            let head_id = head.parse().context("parsing head change id")?;
            let fields: serde_json::Value = serde_json::from_str(&fields).context("parsing fields as JSON")?;
            let mut wrapper = dal.get(&head_id)?;
            wrapper.update(&dal, &key, fields)?;
            wrapper.save(&dal)?;
            println!("{{\"head\": \"{}\", \"rev\": \"{}\"}}", wrapper.head(), wrapper.head_rev().as_str());
        }
        Command::Get { head } => {
            let head_id = head.parse().context("parsing head change id")?;
            let wrapper = dal.get(&head_id)?;
            println!("{}", serde_json::to_string_pretty(wrapper.doc.fields())?);
        }
        Command::Find { doctype, field, term } => {
            let matches = dal.find(&doctype, &[(field.as_str(), term.as_str())])?;
            let documents: Vec<&serde_json::Value> = matches.iter().map(|w| w.doc.fields()).collect();
            println!("{}", serde_json::to_string_pretty(&documents)?);
        }
    }

    Ok(())
}
