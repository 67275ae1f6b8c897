use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// tourdash: tour-booking dashboard client
#[derive(Parser)]
#[command(name = "tourdash", version, about)]
pub struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store a bearer token as the current session
    Login {
        #[arg(long, env = "TOURDASH_TOKEN")]
        token: String,
    },

    /// Show dashboard statistics
    Stats {
        /// week, month, year or custom
        #[arg(long)]
        period: Option<String>,
        #[arg(long)]
        start_date: Option<NaiveDate>,
        #[arg(long)]
        end_date: Option<NaiveDate>,
        /// Number of top hosts to list
        #[arg(long, default_value = "5")]
        top: u32,
    },

    /// Manage notifications
    Notifications {
        #[command(subcommand)]
        command: NotificationCommands,
    },

    /// Read chat conversations
    Chat {
        #[command(subcommand)]
        command: ChatCommands,
    },

    /// Host payments and role upgrades
    Payment {
        #[command(subcommand)]
        command: PaymentCommands,
    },

    /// Follow notifications and account changes until interrupted
    Watch {
        /// Skip the push channel and rely on polling only
        #[arg(long)]
        no_push: bool,
    },
}

#[derive(Subcommand)]
pub enum NotificationCommands {
    /// List notifications, newest first
    List,
    /// Show the unread count
    Unread,
    /// Mark one notification as read
    Read { id: String },
    /// Mark every notification as read
    ReadAll,
    /// Remove a notification
    Remove { id: String },
}

#[derive(Subcommand)]
pub enum ChatCommands {
    /// List conversations
    Conversations,
    /// Print a conversation transcript
    Show { conversation_id: String },
    /// Send a message
    Send {
        conversation_id: String,
        content: String,
    },
}

#[derive(Subcommand)]
pub enum PaymentCommands {
    /// Show a host's balance and transactions
    Host { host_id: String },
    /// Request an upgrade to a more privileged role
    Upgrade {
        /// Target role (host, admin)
        #[arg(long, default_value = "host")]
        role: String,
        #[arg(long)]
        return_url: Option<String>,
    },
    /// Check an upgrade request
    Status { request_id: String },
}
