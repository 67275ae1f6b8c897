use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tokio::sync::{mpsc, Notify};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tourdash::api::{ApiClient, StatsQuery};
use tourdash::config::{self, Config};
use tourdash::grouping;
use tourdash::jobs;
use tourdash::models::{Message, Role};
use tourdash::notification::hub;
use tourdash::reconcile::{AccountChange, AccountWatch, NotificationFeed, Reconciler, Update};
use tourdash::session::Session;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tourdash=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = run(cfg, args).await;
    if let Err(ref e) = result {
        eprintln!("Error: {:#}", e);
    }
    result
}

async fn run(cfg: Config, args: cli::Cli) -> anyhow::Result<()> {
    if let cli::Commands::Login { token } = &args.command {
        let session = Session::new(token.clone());
        session.save(&cfg.session_file)?;
        println!(
            "Session saved to {} (user: {}, role: {})",
            cfg.session_file.display(),
            session.user_id.as_deref().unwrap_or("unknown"),
            session.role.map(|r| r.to_string()).unwrap_or_else(|| "unknown".into()),
        );
        return Ok(());
    }

    let session = Arc::new(
        Session::load(&cfg.session_file).context("no usable session, run `tourdash login` first")?,
    );
    let client = ApiClient::from_config(&cfg, session.clone())?;
    let json = args.json;

    match args.command {
        cli::Commands::Login { .. } => Ok(()),
        cli::Commands::Stats { period, start_date, end_date, top } => {
            let query = StatsQuery { period, start_date, end_date };
            let overview = client.load_dashboard(&query, top).await?;
            if json {
                return print_json(&overview);
            }
            let s = &overview.stats;
            println!("Users      {:>10}  (+{} new)", s.total_users, s.new_users);
            println!("Hosts      {:>10}", s.total_hosts);
            println!("Tours      {:>10}  ({} active)", s.total_tours, s.active_tours);
            println!("Bookings   {:>10}  ({} pending)", s.total_bookings, s.pending_bookings);
            println!("Revenue    {:>10}", s.total_revenue);
            println!(
                "Pending    hosts {} / tours {} / reports {} / payments {}",
                overview.badges.pending_host_requests,
                overview.badges.pending_tours,
                overview.badges.pending_reports,
                overview.badges.pending_payments,
            );
            println!(
                "Posts      {} ({} comments, {} reactions, {} pending)",
                overview.post_stats.total_posts,
                overview.post_stats.total_comments,
                overview.post_stats.total_reactions,
                overview.post_stats.pending_posts,
            );
            for (i, h) in overview.top_hosts.iter().enumerate() {
                println!(
                    "  {}. {}: {} bookings, {} revenue, rating {:.1}",
                    i + 1,
                    h.name,
                    h.total_bookings,
                    h.total_revenue,
                    h.rating
                );
            }
            if !overview.degraded.is_empty() {
                println!("(unavailable: {})", overview.degraded.join(", "));
            }
            Ok(())
        }
        cli::Commands::Notifications { command } => notifications(&client, command, json).await,
        cli::Commands::Chat { command } => chat(&client, &session, command, json).await,
        cli::Commands::Payment { command } => payment(&client, command, json).await,
        cli::Commands::Watch { no_push } => watch(&cfg, client, session, no_push).await,
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn notifications(client: &ApiClient, command: cli::NotificationCommands, json: bool) -> anyhow::Result<()> {
    match command {
        cli::NotificationCommands::List => {
            let mut feed = NotificationFeed::new();
            feed.merge(client.notifications().await?);
            if json {
                return print_json(&feed.items());
            }
            for n in feed.items() {
                let mark = if n.is_read { " " } else { "*" };
                let at = n
                    .created_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!("{} [{}] {:<16} {}: {}", mark, n.id, at, n.title, n.message);
            }
        }
        cli::NotificationCommands::Unread => {
            println!("{}", client.unread_notifications().await?);
        }
        cli::NotificationCommands::Read { id } => {
            client.mark_notification_read(&id).await?;
            println!("Marked {} as read", id);
        }
        cli::NotificationCommands::ReadAll => {
            client.mark_all_notifications_read().await?;
            println!("All notifications marked as read");
        }
        cli::NotificationCommands::Remove { id } => {
            client.remove_notification(&id).await?;
            println!("Removed {}", id);
        }
    }
    Ok(())
}

async fn chat(client: &ApiClient, session: &Session, command: cli::ChatCommands, json: bool) -> anyhow::Result<()> {
    match command {
        cli::ChatCommands::Conversations => {
            let conversations = client.conversations().await?;
            if json {
                return print_json(&conversations);
            }
            for c in conversations {
                let unread = if c.unread_count > 0 {
                    format!(" ({} unread)", c.unread_count)
                } else {
                    String::new()
                };
                println!("[{}] {}{}: {}", c.id, c.title, unread, c.last_message);
            }
        }
        cli::ChatCommands::Show { conversation_id } => {
            let messages = client.messages(&conversation_id).await?;
            let me = session.user_id.as_deref().unwrap_or_default();
            if json {
                #[derive(Serialize)]
                struct Row<'a> {
                    message: &'a Message,
                    display: grouping::GroupingResult,
                }
                let flags = grouping::grouping_all(&messages, me);
                let rows: Vec<Row<'_>> = messages
                    .iter()
                    .zip(flags)
                    .map(|(message, display)| Row { message, display })
                    .collect();
                return print_json(&rows);
            }
            print_transcript(&messages, me);
        }
        cli::ChatCommands::Send { conversation_id, content } => {
            let sent = client.send_message(&conversation_id, &content).await?;
            println!("Sent message {}", sent.id);
        }
    }
    Ok(())
}

fn print_transcript(messages: &[Message], me: &str) {
    for line in transcript_lines(messages, me) {
        println!("{}", line);
    }
}

/// One block per visual group: a blank separator, the sender header, then
/// the message lines with the timestamp where the grouping flags ask for it.
fn transcript_lines(messages: &[Message], me: &str) -> Vec<String> {
    let flags = grouping::grouping_all(messages, me);
    let mut lines = Vec::new();
    for run in grouping::group_runs(messages) {
        let first = &messages[run.start];
        lines.push(String::new());
        if flags[run.start].show_name {
            lines.push(first.sender_name.clone());
        } else if first.sender_id == me {
            lines.push("you".to_string());
        }
        for (msg, display) in messages[run.clone()].iter().zip(&flags[run]) {
            let mut line = format!("  {}", msg.content);
            if !msg.reactions.is_empty() {
                let total: i64 = msg.reactions.iter().map(|r| r.count).sum();
                line.push_str(&format!("  ({} reactions)", total));
            }
            if display.show_timestamp {
                if let Some(t) = msg.timestamp {
                    line.push_str(&format!("  · {}", t.format("%H:%M")));
                }
            }
            lines.push(line);
        }
    }
    lines
}

async fn payment(client: &ApiClient, command: cli::PaymentCommands, json: bool) -> anyhow::Result<()> {
    match command {
        cli::PaymentCommands::Host { host_id } => {
            let p = client.host_payment(&host_id).await?;
            if json {
                return print_json(&p);
            }
            println!("Balance  {} {}", p.balance, p.currency);
            println!("Pending  {} {}", p.pending_amount, p.currency);
            println!("Earned   {} {}", p.total_earned, p.currency);
            for t in &p.transactions {
                let at = t.created_at.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
                println!("  [{}] {:<10} {:>12} {} {}", t.id, t.status, t.amount, at, t.description);
            }
        }
        cli::PaymentCommands::Upgrade { role, return_url } => {
            let target: Role = role.parse().map_err(anyhow::Error::msg)?;
            let req = client.request_upgrade(target, return_url).await?;
            if json {
                return print_json(&req);
            }
            println!("Upgrade request {} is {}", req.id, req.status);
            if let Some(url) = &req.payment_url {
                println!("Complete the payment at {}", url);
            }
        }
        cli::PaymentCommands::Status { request_id } => {
            let req = client.upgrade_status(&request_id).await?;
            if json {
                return print_json(&req);
            }
            println!("Upgrade request {} ({} → {}) is {}", req.id, req.user_id, req.target_role, req.status);
        }
    }
    Ok(())
}

async fn watch(cfg: &Config, client: ApiClient, session: Arc<Session>, no_push: bool) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::channel(64);
    let recheck = Arc::new(Notify::new());

    let mut handles = vec![
        jobs::notification_poll::spawn(client.clone(), cfg.notification_poll_interval(), tx.clone()),
        jobs::account_poll::spawn(client.clone(), cfg.poll_interval(), recheck.clone(), tx.clone()),
    ];
    if !no_push {
        handles.push(hub::spawn(cfg.hub_url()?, session.clone(), tx.clone()));
    }
    drop(tx);

    tracing::info!(jobs = handles.len(), "watching for notifications and account changes");

    let reconciler = Reconciler::new(NotificationFeed::new(), AccountWatch::with_role(session.role))
        .with_recheck(recheck);
    let consumer = reconciler.run(rx, |update| match update {
        Update::NewNotifications(items) => {
            for n in items {
                println!("🔔 [{}] {}: {}", n.id, n.title, n.message);
            }
        }
        Update::Account(AccountChange::RoleUpgraded { from, to }) => {
            println!("⬆️  Your role was upgraded from {} to {}", from, to);
        }
        Update::Account(AccountChange::RoleChanged { from, to }) => {
            println!("Your role changed from {} to {}", from, to);
        }
        Update::Account(AccountChange::Deactivated) => {
            println!("⚠️  Your account has been deactivated");
        }
        Update::Account(AccountChange::Reactivated) => {
            println!("Your account is active again");
        }
    });

    tokio::select! {
        _ = consumer => {
            tracing::warn!("all producers stopped");
        }
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for ctrl-c")?;
            tracing::info!("shutting down");
        }
    }

    for handle in handles {
        tracing::debug!(job = handle.name(), "stopping job");
        handle.shutdown().await;
    }
    Ok(())
}
