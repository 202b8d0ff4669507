use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;
use vl_crypto::{ConsistencyProof, InclusionProof, ProofVerifier};
use vl_ledger::{Ledger, LedgerConfig, CONFIG_FILE};
use vl_store::{FileHashStore, SyncMode};
use vl_types::Hash;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let data = cli.data.as_path();
    let format = cli.format;
    match cli.command {
        Command::Init(args) => cmd_init(data, args, format),
        Command::Append(args) => cmd_append(data, args, format),
        Command::Head(args) => cmd_head(data, args, format),
        Command::Root(args) => cmd_root(data, args, format),
        Command::Leaves(args) => cmd_leaves(data, args, format),
        Command::ProveInclusion(args) => cmd_prove_inclusion(data, args, format),
        Command::ProveConsistency(args) => cmd_prove_consistency(data, args, format),
        Command::VerifyInclusion(args) => cmd_verify_inclusion(args, format),
        Command::VerifyConsistency(args) => cmd_verify_consistency(args, format),
        Command::Audit(_) => cmd_audit(data, format),
    }
}

fn open_ledger(data: &Path) -> anyhow::Result<Ledger<FileHashStore>> {
    let config_path = data.join(CONFIG_FILE);
    if !config_path.exists() {
        bail!(
            "no ledger in {} (run `vledger init` first)",
            data.display()
        );
    }
    let config = LedgerConfig::load(&config_path)?;
    Ledger::open_file(&config, data)
        .with_context(|| format!("opening ledger in {}", data.display()))
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_hashes(label: &str, hashes: &[Hash]) {
    if hashes.is_empty() {
        println!("  {label}: {}", "(empty)".dimmed());
        return;
    }
    println!("  {label}:");
    for (i, hash) in hashes.iter().enumerate() {
        println!("    {:>3}  {}", i, hash.to_hex().cyan());
    }
}

fn decode_entry(entry: &str, is_hex: bool) -> anyhow::Result<Vec<u8>> {
    if is_hex {
        hex::decode(entry).with_context(|| format!("entry {entry:?} is not valid hex"))
    } else {
        Ok(entry.as_bytes().to_vec())
    }
}

fn cmd_init(data: &Path, args: InitArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config_path = data.join(CONFIG_FILE);
    if config_path.exists() {
        bail!("ledger already initialized in {}", data.display());
    }

    let mut config = LedgerConfig {
        algorithm: args.algorithm,
        ..LedgerConfig::default()
    };
    if args.no_sync {
        config.store.sync_mode = SyncMode::OsDefault;
    }
    config.save(&config_path)?;
    let ledger = Ledger::open_file(&config, data)?;
    let head = ledger.tree_head()?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "data": data.display().to_string(),
            "config": config,
            "head": head,
        })),
        OutputFormat::Text => {
            println!(
                "{} Initialized ledger in {}",
                "✓".green().bold(),
                data.display().to_string().bold()
            );
            println!("  Digest: {}", config.algorithm.to_string().cyan());
            println!("  Store: {}", config.store_path(data).display());
            println!("  Empty root: {}", head.root.to_hex().yellow());
            Ok(())
        }
    }
}

fn cmd_append(data: &Path, args: AppendArgs, format: OutputFormat) -> anyhow::Result<()> {
    let entries = match &args.file {
        Some(path) => {
            vec![fs::read(path).with_context(|| format!("reading {}", path.display()))?]
        }
        None => args
            .entries
            .iter()
            .map(|e| decode_entry(e, args.hex))
            .collect::<anyhow::Result<Vec<_>>>()?,
    };

    let ledger = open_ledger(data)?;
    let mut receipts = Vec::with_capacity(entries.len());
    for entry in &entries {
        receipts.push(ledger.append(entry)?);
    }

    match format {
        OutputFormat::Json => print_json(&json!(receipts)),
        OutputFormat::Text => {
            for receipt in &receipts {
                println!(
                    "{} #{} size {} root {}",
                    "✓".green(),
                    receipt.index.to_string().bold(),
                    receipt.size,
                    receipt.root.to_hex().yellow()
                );
            }
            Ok(())
        }
    }
}

fn cmd_head(data: &Path, args: HeadArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ledger = open_ledger(data)?;
    let head = match args.size {
        Some(size) => ledger.tree_head_at(size)?,
        None => ledger.tree_head()?,
    };
    let encoded = hex::encode(head.to_bytes());

    match format {
        OutputFormat::Json => print_json(&json!({ "head": head, "encoded": encoded })),
        OutputFormat::Text => {
            println!("Digest:  {}", head.algorithm.to_string().cyan());
            println!("Size:    {}", head.size.to_string().bold());
            println!("Root:    {}", head.root.to_hex().yellow());
            println!("Encoded: {}", encoded.dimmed());
            Ok(())
        }
    }
}

fn cmd_root(data: &Path, args: RootArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ledger = open_ledger(data)?;
    let size = match args.size {
        Some(size) => size,
        None => ledger.size()?,
    };
    let root = ledger.root(size)?;

    match format {
        OutputFormat::Json => print_json(&json!({ "size": size, "root": root })),
        OutputFormat::Text => {
            println!("{}", root.to_hex());
            Ok(())
        }
    }
}

fn cmd_leaves(data: &Path, args: LeavesArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ledger = open_ledger(data)?;
    let to = match args.to {
        Some(to) => to,
        None => ledger.size()?,
    };
    let leaves = ledger.leaves(args.from, to)?;

    match format {
        OutputFormat::Json => print_json(&json!({ "from": args.from, "leaves": leaves })),
        OutputFormat::Text => {
            if leaves.is_empty() {
                println!("No leaves.");
            }
            for (index, leaf) in (args.from..).zip(&leaves) {
                println!("{:>8}  {}", index.to_string().yellow(), leaf.to_hex());
            }
            Ok(())
        }
    }
}

fn cmd_prove_inclusion(
    data: &Path,
    args: ProveInclusionArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let ledger = open_ledger(data)?;
    let size = match args.size {
        Some(size) => size,
        None => ledger.size()?,
    };
    let (leaf, proof) = ledger.inclusion_proof(args.index, size)?;
    let root = ledger.root(size)?;
    let encoded = hex::encode(proof.to_bytes());

    match format {
        OutputFormat::Json => print_json(&json!({
            "leaf": leaf,
            "root": root,
            "proof": proof,
            "encoded": encoded,
        })),
        OutputFormat::Text => {
            println!(
                "Inclusion of #{} in tree of size {}",
                proof.index.to_string().bold(),
                proof.size.to_string().bold()
            );
            println!("  Leaf: {}", leaf.to_hex().yellow());
            println!("  Root: {}", root.to_hex().yellow());
            print_hashes("Path", &proof.hashes);
            println!("  Encoded: {}", encoded.dimmed());
            Ok(())
        }
    }
}

fn cmd_prove_consistency(
    data: &Path,
    args: ProveConsistencyArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let ledger = open_ledger(data)?;
    let size2 = match args.size2 {
        Some(size) => size,
        None => ledger.size()?,
    };
    let proof = ledger.consistency_proof(args.size1, size2)?;
    let root1 = ledger.root(args.size1)?;
    let root2 = ledger.root(size2)?;
    let encoded = hex::encode(proof.to_bytes());

    match format {
        OutputFormat::Json => print_json(&json!({
            "root1": root1,
            "root2": root2,
            "proof": proof,
            "encoded": encoded,
        })),
        OutputFormat::Text => {
            println!(
                "Consistency of size {} with size {}",
                proof.size1.to_string().bold(),
                proof.size2.to_string().bold()
            );
            println!("  Root {}: {}", proof.size1, root1.to_hex().yellow());
            println!("  Root {}: {}", proof.size2, root2.to_hex().yellow());
            print_hashes("Proof", &proof.hashes);
            println!("  Encoded: {}", encoded.dimmed());
            Ok(())
        }
    }
}

fn report_verdict(valid: bool, what: &str, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&json!({ "valid": valid }))?,
        OutputFormat::Text if valid => println!("{} {what} proof verified", "✓".green().bold()),
        OutputFormat::Text => println!("{} {what} proof does not match", "✗".red().bold()),
    }
    if !valid {
        bail!("{what} verification failed");
    }
    Ok(())
}

fn cmd_verify_inclusion(args: VerifyInclusionArgs, format: OutputFormat) -> anyhow::Result<()> {
    let entry = decode_entry(&args.entry, args.hex)?;
    let proof = match &args.encoded {
        Some(encoded) => {
            let bytes = hex::decode(encoded).context("encoded proof is not valid hex")?;
            InclusionProof::from_bytes(&bytes)?
        }
        None => InclusionProof {
            algorithm: args.algorithm,
            index: args.index.context("--index is required")?,
            size: args.size.context("--size is required")?,
            hashes: args.proof,
        },
    };

    let verifier = ProofVerifier::for_algorithm(proof.algorithm);
    let valid = verifier.verify_inclusion_proof(&entry, &proof, &args.root)?;
    report_verdict(valid, "inclusion", format)
}

fn cmd_verify_consistency(
    args: VerifyConsistencyArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let proof = match &args.encoded {
        Some(encoded) => {
            let bytes = hex::decode(encoded).context("encoded proof is not valid hex")?;
            ConsistencyProof::from_bytes(&bytes)?
        }
        None => ConsistencyProof {
            algorithm: args.algorithm,
            size1: args.size1.context("--size1 is required")?,
            size2: args.size2.context("--size2 is required")?,
            hashes: args.proof,
        },
    };

    let verifier = ProofVerifier::for_algorithm(proof.algorithm);
    let valid = verifier.verify_consistency_proof(&proof, &args.root1, &args.root2)?;
    report_verdict(valid, "consistency", format)
}

fn cmd_audit(data: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let ledger = open_ledger(data)?;
    let head = ledger.audit()?;

    match format {
        OutputFormat::Json => print_json(&json!({ "ok": true, "head": head })),
        OutputFormat::Text => {
            println!("{} Ledger integrity verified", "✓".green().bold());
            println!("  Leaves: {}", head.size.to_string().bold());
            println!("  Root: {}", head.root.to_hex().yellow());
            Ok(())
        }
    }
}
