use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    terminal,
};
use engine::Engine;
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use server::credentials;

#[derive(Parser, Debug)]
#[command(name = "splitledger_admin")]
#[command(about = "Admin utilities for SplitLedger (bootstrap users/groups, inspect balances)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./splitledger.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Group(Group),
    /// Print the personal balances of a user.
    Balances(BalancesArgs),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct Group {
    #[command(subcommand)]
    command: GroupCommand,
}

#[derive(Subcommand, Debug)]
enum GroupCommand {
    Create(GroupCreateArgs),
    AddMembers(GroupAddMembersArgs),
}

#[derive(Args, Debug)]
struct GroupCreateArgs {
    #[arg(long)]
    name: String,
    /// Username of the creator, who becomes the group admin.
    #[arg(long)]
    admin: String,
    /// Usernames of the other members.
    #[arg(long, value_delimiter = ',')]
    members: Vec<String>,
}

#[derive(Args, Debug)]
struct GroupAddMembersArgs {
    #[arg(long)]
    group: i32,
    /// Username of a group admin.
    #[arg(long)]
    admin: String,
    #[arg(long, value_delimiter = ',', required = true)]
    members: Vec<String>,
}

#[derive(Args, Debug)]
struct BalancesArgs {
    #[arg(long)]
    user: String,
}

async fn user_ids(
    engine: &Engine,
    usernames: &[String],
) -> Result<Vec<i32>, Box<dyn Error + Send + Sync>> {
    let mut ids = Vec::with_capacity(usernames.len());
    for username in usernames {
        ids.push(engine.user_by_username(username).await?.id);
    }
    Ok(ids)
}

struct RawModeGuard;

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Reads a line from the terminal without echoing it.
fn read_hidden(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    eprint!("{prompt}");
    std::io::stderr().flush()?;
    terminal::enable_raw_mode()?;
    let _raw = RawModeGuard;

    let mut buf = String::new();
    loop {
        if let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        {
            match code {
                KeyCode::Enter => break,
                KeyCode::Backspace => {
                    buf.pop();
                }
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    eprint!("\r\n");
                    return Err("interrupted".into());
                }
                KeyCode::Char(ch) => buf.push(ch),
                _ => {}
            }
        }
    }
    eprint!("\r\n");
    Ok(buf)
}

fn confirmed(first: String, second: &str) -> Result<String, &'static str> {
    if first.is_empty() {
        Err("password must not be empty")
    } else if first != second {
        Err("passwords do not match")
    } else {
        Ok(first)
    }
}

fn new_password() -> Result<String, Box<dyn Error + Send + Sync>> {
    let first = read_hidden("Password: ")?;
    let second = read_hidden("Confirm password: ")?;
    Ok(confirmed(first, &second)?)
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = new_password()?;
            let hash = credentials::hash_password(&password)?;
            let user_id = engine.new_user(&args.username, &args.email, &hash).await?;
            println!("created user: {} ({user_id})", args.username);
        }
        Command::Group(Group {
            command: GroupCommand::Create(args),
        }) => {
            let admin = engine.user_by_username(&args.admin).await?;
            let members = user_ids(&engine, &args.members).await?;
            let group_id = engine.new_group(&args.name, admin.id, &members).await?;
            println!("created group: {} ({group_id})", args.name);
        }
        Command::Group(Group {
            command: GroupCommand::AddMembers(args),
        }) => {
            let admin = engine.user_by_username(&args.admin).await?;
            let members = user_ids(&engine, &args.members).await?;
            let added = engine
                .add_group_members(args.group, &members, admin.id)
                .await?;
            println!("added {added} member(s) to group {}", args.group);
        }
        Command::Balances(args) => {
            let user = engine.user_by_username(&args.user).await?;
            let dashboard = engine.dashboard_balances(user.id).await?;
            for row in &dashboard.counterparties {
                println!(
                    "{:<20} owed {:>10.2}  due {:>10.2}  net {:>10.2}",
                    row.username, row.amount_owed, row.amount_due, row.net_balance
                );
            }
            println!(
                "{:<20} owed {:>10.2}  due {:>10.2}  net {:>10.2}",
                "total", dashboard.total_owed, dashboard.total_due, dashboard.net_balance
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::confirmed;

    #[test]
    fn password_confirmation() {
        assert_eq!(confirmed("hunter2".into(), "hunter2"), Ok("hunter2".into()));
        assert!(confirmed("hunter2".into(), "hunter3").is_err());
        assert!(confirmed(String::new(), "").is_err());
    }
}
