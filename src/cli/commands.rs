use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "utxo-ledger", about = "Single-node UTXO ledger")]
pub struct Opt {
    #[arg(long = "config", help = "TOML file with ledger parameters")]
    pub config: Option<PathBuf>,
    #[arg(long = "difficulty", help = "Override the proof-of-work difficulty")]
    pub difficulty: Option<u32>,
    #[arg(long = "block-reward", help = "Override the coinbase reward")]
    pub block_reward: Option<u64>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    #[command(name = "demo", about = "Run the scripted four-wallet scenario")]
    Demo,
    #[command(name = "shell", about = "Read ledger commands from standard input")]
    Shell,
}

/// One line typed into the shell, parsed without a binary name.
#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_help_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    #[command(name = "createblockchain", about = "Create a new blockchain")]
    Createblockchain {
        #[arg(help = "The address to send genesis block reward to")]
        address: String,
    },
    #[command(name = "createwallet", about = "Create a new wallet")]
    Createwallet,
    #[command(
        name = "getbalance",
        about = "Get the wallet balance of the target address"
    )]
    GetBalance {
        #[arg(help = "The wallet address")]
        address: String,
    },
    #[command(name = "listaddresses", about = "Print local wallet addresses")]
    ListAddresses,
    #[command(name = "send", about = "Send value and mine it into a new block")]
    Send {
        #[arg(help = "Source wallet address")]
        from: String,
        #[arg(help = "Destination wallet address")]
        to: String,
        #[arg(help = "Amount to send")]
        amount: u64,
        #[arg(help = "Address that receives the block reward")]
        miner: String,
    },
    #[command(name = "printchain", about = "Print all blocks in the blockchain")]
    Printchain {
        #[arg(long = "json", help = "Emit the blocks as JSON")]
        json: bool,
    },
    #[command(name = "printtx", about = "Print every transaction, block by block")]
    Printtx,
    #[command(name = "validatechain", about = "Check the integrity of every block")]
    Validatechain,
    #[command(name = "exit", about = "Leave the shell")]
    Exit,
}

impl ShellCommand {
    /// Parses one shell line; blank lines yield `None`.
    pub fn parse_line(line: &str) -> Option<Result<ShellCommand, clap::Error>> {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            return None;
        }
        Some(ShellLine::try_parse_from(words).map(|parsed| parsed.command))
    }
}
