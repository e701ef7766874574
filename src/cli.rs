use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "muskyfit", version, about = "Coaching CLI: run workout sessions, track personal bests")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Emit machine-readable JSON instead of colorful text.
    #[arg(global = true, long)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(global = true, short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Client management
    #[command(subcommand, visible_alias = "c")]
    Client(ClientCmd),

    /// Workout split management
    #[command(subcommand, visible_alias = "p")]
    Plan(PlanCmd),

    /// Session-scoped commands
    #[command(subcommand, visible_alias = "s")]
    Session(SessionCmd),

    /// Personal bests
    #[command(subcommand)]
    Pb(PbCmd),

    /// Show logged workouts in a calendar view
    #[command(visible_alias = "cal")]
    Calendar {
        /// Year to show (defaults to current year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Month to show (1-12, defaults to current month)
        #[arg(short, long)]
        month: Option<u32>,

        /// Client index or name (defaults to the active client)
        #[arg(short, long)]
        client: Option<String>,
    },

    /// View or edit muskyfit config
    #[command(subcommand)]
    Config(ConfigCmd),

    /// Db operations
    #[command(subcommand)]
    Db(DbCmd),
}

//
// Commands
//

#[derive(Subcommand)]
pub enum ClientCmd {
    /// Register a new client
    #[command(visible_alias = "a")]
    Add {
        name: String,

        #[arg(short, long)]
        email: Option<String>,
    },

    /// List clients
    #[command(visible_alias = "l")]
    List,

    /// Show a client's rotation, progress and recent sessions
    #[command(visible_alias = "s")]
    Show {
        /// Client index (from `client list`) or name
        client: Option<String>,
    },

    /// Make a client the default for other commands
    #[command(visible_alias = "u")]
    Use { client: String },
}

#[derive(Subcommand)]
pub enum PlanCmd {
    /// Import a workout split from a TOML file
    #[command(visible_alias = "i")]
    Import {
        file: String,

        #[arg(short, long)]
        client: Option<String>,
    },

    /// Show the client's workout split
    #[command(visible_alias = "s")]
    Show {
        #[arg(short, long)]
        client: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SessionCmd {
    /// Start the next workout in the rotation
    #[command(visible_alias = "s")]
    Start {
        #[arg(short, long)]
        client: Option<String>,

        /// Train a specific day of the split instead (1-based). The rotation
        /// then continues from the day after it.
        #[arg(short, long)]
        day: Option<usize>,
    },

    /// Show current session details
    #[command(visible_alias = "i")]
    Show {
        #[arg(short, long)]
        client: Option<String>,
    },

    /// Edit an unlocked set - Usage: session edit EXERCISE SET [--weight W] [--reps R] [--rpe N]
    #[command(visible_alias = "e")]
    #[command(override_usage = "session edit <EXERCISE> <SET> [--weight <KG>] [--reps <N>] [--rpe <6-10>]")]
    Edit {
        /// Exercise index (1-based, as shown in `session show`)
        #[arg(value_name = "EXERCISE")]
        exercise: usize,

        /// Set index (1-based)
        #[arg(value_name = "SET")]
        set: usize,

        #[arg(short, long)]
        weight: Option<f32>,

        #[arg(short, long)]
        reps: Option<u32>,

        #[arg(long)]
        rpe: Option<u8>,

        #[arg(short, long)]
        client: Option<String>,
    },

    /// Toggle a set as completed; completing starts the rest countdown
    #[command(visible_alias = "d")]
    #[command(override_usage = "session done <EXERCISE> <SET> [--no-rest]")]
    Done {
        #[arg(value_name = "EXERCISE")]
        exercise: usize,

        #[arg(value_name = "SET")]
        set: usize,

        /// Don't run the rest countdown
        #[arg(long)]
        no_rest: bool,

        #[arg(short, long)]
        client: Option<String>,
    },

    /// Finish the session and record it
    #[command(visible_alias = "f")]
    Finish {
        #[arg(short, long)]
        client: Option<String>,
    },

    /// Discard the current session
    #[command(visible_alias = "c")]
    Cancel {
        #[arg(short, long)]
        client: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PbCmd {
    /// Show tracked lifts with their recent history
    #[command(visible_alias = "l")]
    List {
        #[arg(short, long)]
        client: Option<String>,
    },

    /// Start tracking another lift
    #[command(visible_alias = "t")]
    Track {
        lift: String,

        #[arg(short, long)]
        client: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Show all config keys
    List,

    /// Get the value of a key
    Get { key: String },

    /// Set or override a key
    Set { key: String, val: String },

    /// Remove a key
    Unset { key: String },
}

#[derive(Subcommand)]
pub enum DbCmd {
    /// Export all client records to a JSON file
    Export {
        /// Output file path (defaults to muskyfit_clients.json)
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Import client records from a JSON file
    Import {
        /// Input JSON file path
        file: String,
    },
}
