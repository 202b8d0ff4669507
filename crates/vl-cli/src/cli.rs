use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use vl_types::{DigestAlgorithm, Hash};

#[derive(Parser)]
#[command(
    name = "vledger",
    about = "Verifiable append-only ledger with Merkle inclusion and consistency proofs",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Ledger data directory
    #[arg(short, long, global = true, default_value = ".vledger")]
    pub data: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new ledger in the data directory
    Init(InitArgs),
    /// Append entries and print their receipts
    Append(AppendArgs),
    /// Show the tree head (digest, size, root)
    Head(HeadArgs),
    /// Show the root hash at a tree size
    Root(RootArgs),
    /// List leaf hashes
    Leaves(LeavesArgs),
    /// Build an inclusion proof for one entry
    ProveInclusion(ProveInclusionArgs),
    /// Build a consistency proof between two tree sizes
    ProveConsistency(ProveConsistencyArgs),
    /// Check an inclusion proof offline against a trusted root
    VerifyInclusion(VerifyInclusionArgs),
    /// Check a consistency proof offline against two trusted roots
    VerifyConsistency(VerifyConsistencyArgs),
    /// Re-read the store and compare it with the recorded tree
    Audit(AuditArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Digest for leaf and node hashes (sha256 or blake3)
    /// Digest of the tree (an encoded proof carries its own)
    #[arg(long, default_value = "sha256")]
    pub algorithm: DigestAlgorithm,
    /// Let the OS buffer appends instead of syncing each one
    #[arg(long)]
    pub no_sync: bool,
}

#[derive(Args)]
pub struct AppendArgs {
    /// Entries to append, one per argument
    #[arg(required_unless_present = "file")]
    pub entries: Vec<String>,
    /// Decode each entry argument as hex
    #[arg(long)]
    pub hex: bool,
    /// Append the raw contents of a file as one entry
    #[arg(long, conflicts_with = "entries")]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct HeadArgs {
    /// Historical tree size (defaults to the current size)
    #[arg(long)]
    pub size: Option<u64>,
}

#[derive(Args)]
pub struct RootArgs {
    /// Tree size (defaults to the current size)
    pub size: Option<u64>,
}

#[derive(Args)]
pub struct LeavesArgs {
    #[arg(long, default_value = "0")]
    pub from: u64,
    /// Exclusive upper bound (defaults to the current size)
    #[arg(long)]
    pub to: Option<u64>,
}

#[derive(Args)]
pub struct ProveInclusionArgs {
    pub index: u64,
    /// Tree size to prove against (defaults to the current size)
    #[arg(long)]
    pub size: Option<u64>,
}

#[derive(Args)]
pub struct ProveConsistencyArgs {
    pub size1: u64,
    /// Newer tree size (defaults to the current size)
    pub size2: Option<u64>,
}

#[derive(Args)]
pub struct VerifyInclusionArgs {
    /// The entry whose inclusion is claimed
    #[arg(long)]
    pub entry: String,
    /// Decode the entry as hex
    #[arg(long)]
    pub hex: bool,
    /// Trusted root hash at the proof's tree size
    #[arg(long)]
    pub root: Hash,
    /// Hex of an encoded inclusion proof (replaces the options below)
    #[arg(long, conflicts_with_all = ["index", "size", "proof", "algorithm"])]
    pub encoded: Option<String>,
    #[arg(long, required_unless_present = "encoded")]
    pub index: Option<u64>,
    #[arg(long, required_unless_present = "encoded")]
    pub size: Option<u64>,
    /// Comma-separated proof hashes, leaf-adjacent first
    #[arg(long, value_delimiter = ',')]
    pub proof: Vec<Hash>,
    /// Digest of the tree (an encoded proof carries its own)
    #[arg(long, default_value = "sha256")]
    pub algorithm: DigestAlgorithm,
}

#[derive(Args)]
pub struct VerifyConsistencyArgs {
    /// Trusted root at the older size
    #[arg(long)]
    pub root1: Hash,
    /// Trusted root at the newer size
    #[arg(long)]
    pub root2: Hash,
    /// Hex of an encoded consistency proof (replaces the options below)
    #[arg(long, conflicts_with_all = ["size1", "size2", "proof", "algorithm"])]
    pub encoded: Option<String>,
    #[arg(long, required_unless_present = "encoded")]
    pub size1: Option<u64>,
    #[arg(long, required_unless_present = "encoded")]
    pub size2: Option<u64>,
    /// Comma-separated proof hashes
    #[arg(long, value_delimiter = ',')]
    pub proof: Vec<Hash>,
    /// Digest of the tree (an encoded proof carries its own)
    #[arg(long, default_value = "sha256")]
    pub algorithm: DigestAlgorithm,
}

#[derive(Args)]
pub struct AuditArgs {}
