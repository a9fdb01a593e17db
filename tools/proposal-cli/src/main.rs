use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dao_governance::{
    AssetType, GovernanceConfig, InMemoryGovernance, OptionCode, Proposal, ProposalStatus,
};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "proposal-cli")]
#[command(about = "DAO proposal and voting CLI")]
struct Cli {
    /// JSON file holding DAOs, members and proposals
    #[arg(long, global = true, default_value = "governance-state.json")]
    state: PathBuf,

    /// Optional governance TOML config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new DAO
    CreateDao {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        admin: String,
    },

    /// Credit a DAO's treasury balance
    Deposit {
        #[arg(short, long)]
        dao: String,

        #[arg(short, long)]
        amount: u64,
    },

    /// Add a member to a DAO (admin only)
    AddMember {
        #[arg(short, long)]
        dao: String,

        #[arg(short, long)]
        address: String,

        #[arg(short, long)]
        caller: String,
    },

    /// Remove a member from a DAO (admin only)
    RemoveMember {
        #[arg(short, long)]
        dao: String,

        #[arg(short, long)]
        member: String,

        #[arg(short, long)]
        caller: String,
    },

    /// Create a generic proposal
    ProposeGeneric {
        #[arg(short, long)]
        dao: String,

        #[arg(short, long)]
        title: String,

        #[arg(long, default_value = "")]
        text: String,

        #[arg(short, long)]
        caller: String,
    },

    /// Create a poll proposal
    ProposePoll {
        #[arg(short, long)]
        dao: String,

        #[arg(long, default_value = "")]
        text: String,

        /// Poll option, repeat for each option
        #[arg(short, long = "option")]
        options: Vec<String>,

        #[arg(short, long)]
        caller: String,
    },

    /// Create a coin transfer proposal
    ProposeTransfer {
        #[arg(short, long)]
        dao: String,

        #[arg(long, default_value = "")]
        text: String,

        #[arg(short, long)]
        amount: u64,

        #[arg(short, long)]
        recipient: String,

        #[arg(long, default_value = "native")]
        asset: String,

        #[arg(short, long)]
        caller: String,
    },

    /// Vote on a proposal
    Vote {
        #[arg(short, long)]
        dao: String,

        #[arg(short, long)]
        proposal: String,

        /// Member id; looked up from the caller's address when omitted
        #[arg(short, long)]
        member: Option<String>,

        #[arg(short, long)]
        option: u64,

        #[arg(short, long)]
        caller: String,
    },

    /// Record the outcome of a proposal (admin only)
    Resolve {
        #[arg(short, long)]
        dao: String,

        #[arg(short, long)]
        proposal: String,

        #[arg(short, long, value_enum)]
        outcome: Outcome,

        #[arg(short, long)]
        caller: String,
    },

    /// Get proposal details
    Show {
        #[arg(short, long)]
        proposal: String,
    },

    /// List DAOs, or the proposals of one DAO
    List {
        #[arg(short, long)]
        dao: Option<String>,
    },

    /// Show per-option vote counts
    Tally {
        #[arg(short, long)]
        proposal: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Outcome {
    Approved,
    Rejected,
}

impl From<Outcome> for ProposalStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Approved => ProposalStatus::Approved,
            Outcome::Rejected => ProposalStatus::Rejected,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => GovernanceConfig::from_file(path)?,
        None => GovernanceConfig::default(),
    };
    let gov = InMemoryGovernance::load(&cli.state, config)
        .with_context(|| format!("Failed to load {}", cli.state.display()))?;

    let modified = run(&gov, cli.command)?;

    if modified {
        gov.save(&cli.state)
            .with_context(|| format!("Failed to save {}", cli.state.display()))?;
        info!("State written to {}", cli.state.display());
    }
    Ok(())
}

/// Returns true when the state changed and must be saved
fn run(gov: &InMemoryGovernance, command: Commands) -> Result<bool> {
    match command {
        Commands::CreateDao { name, admin } => {
            let id = gov.create_dao(name, admin)?;
            println!("{}", id);
        }
        Commands::Deposit { dao, amount } => {
            let balance = gov.deposit(&dao, amount)?;
            println!("Treasury balance: {}", balance);
        }
        Commands::AddMember {
            dao,
            address,
            caller,
        } => {
            let id = gov.add_member(&dao, address, &caller)?;
            println!("{}", id);
        }
        Commands::RemoveMember {
            dao,
            member,
            caller,
        } => {
            let removed = gov.remove_member(&dao, &member, &caller)?;
            println!("Removed {}", removed.address);
        }
        Commands::ProposeGeneric {
            dao,
            title,
            text,
            caller,
        } => {
            let id = gov.create_generic_proposal(&dao, title, text, &caller)?;
            println!("{}", id);
        }
        Commands::ProposePoll {
            dao,
            text,
            options,
            caller,
        } => {
            let id = gov.create_poll_proposal(&dao, text, options, &caller)?;
            println!("{}", id);
        }
        Commands::ProposeTransfer {
            dao,
            text,
            amount,
            recipient,
            asset,
            caller,
        } => {
            let id = gov.create_coin_transfer_proposal_with_asset(
                AssetType::new(asset),
                &dao,
                text,
                amount,
                recipient,
                &caller,
            )?;
            println!("{}", id);
        }
        Commands::Vote {
            dao,
            proposal,
            member,
            option,
            caller,
        } => {
            let member = match member {
                Some(member) => member,
                None => gov
                    .member_id_of(&dao, &caller)
                    .ok_or_else(|| anyhow!("{} is not a member of {}", caller, dao))?,
            };
            gov.vote_proposal(&dao, &proposal, &member, option, &caller)?;
            println!(
                "Vote recorded: option {} now has {} vote(s)",
                option,
                gov.tally_for(&proposal, option)?
            );
        }
        Commands::Resolve {
            dao,
            proposal,
            outcome,
            caller,
        } => {
            let status = ProposalStatus::from(outcome);
            gov.resolve_proposal(&dao, &proposal, status, &caller)?;
            println!("{} -> {}", proposal, status);
        }
        Commands::Show { proposal } => {
            let proposal = gov.proposal(&proposal)?;
            println!("{}", serde_json::to_string_pretty(&proposal)?);
            return Ok(false);
        }
        Commands::List { dao: Some(dao) } => {
            for proposal in gov.proposals_for(&dao)? {
                println!(
                    "#{:<4} {:<12} {:<8} {} ({})",
                    proposal.sequence(),
                    format!("{:?}", proposal.kind()),
                    proposal.status(),
                    proposal.title(),
                    proposal.id()
                );
            }
            return Ok(false);
        }
        Commands::List { dao: None } => {
            for dao in gov.daos() {
                println!(
                    "{}  {}  admin={} proposals={}",
                    dao.id, dao.name, dao.admin, dao.proposals_count
                );
            }
            return Ok(false);
        }
        Commands::Tally { proposal } => {
            let proposal = gov.proposal(&proposal)?;
            print_tally(&proposal);
            return Ok(false);
        }
    }
    Ok(true)
}

fn print_tally(proposal: &Proposal) {
    println!("{} [{}]", proposal.title(), proposal.status());

    if let Some(options) = proposal.poll_options() {
        for (code, label) in options.iter().enumerate() {
            println!("  {} {:<20} {}", code, label, proposal.tally_for(code as u64));
        }
        for (code, count) in unlisted_tallies(proposal, options.len()) {
            println!("  {} {:<20} {}", code, "(unlisted)", count);
        }
    } else {
        for (code, count) in proposal.tallies() {
            println!("  {} {}", code, count);
        }
    }

    println!("  voters: {}", proposal.votes().voter_count());
}

/// Votes cast for codes outside a poll's option list
fn unlisted_tallies(proposal: &Proposal, listed: usize) -> Vec<(OptionCode, u64)> {
    proposal
        .tallies()
        .iter()
        .filter(|(code, _)| **code >= listed as u64)
        .map(|(code, count)| (*code, *count))
        .collect()
}
