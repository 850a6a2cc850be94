use clap::ValueEnum;
use lnatprep_shared::Metadata;
use lnatprep_user::{Command, SqliteStore, User};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Role {
    User,
    Admin,
    Suspend,
}

async fn find_user(command: &Command<SqliteStore>, email: &str) -> anyhow::Result<User> {
    match command.find_by_email(email).await? {
        Some(user) => Ok(user),
        None => anyhow::bail!("user {email} not found"),
    }
}

pub async fn set_role(config: lnatprep::Config, email: String, role: Role) -> anyhow::Result<()> {
    let command = super::command(&config).await?;
    let user = find_user(&command, &email).await?;

    match role {
        Role::User => {
            command
                .set_role(&user.id, lnatprep_shared::user::Role::User)
                .await?;
            command.activate(&user.id).await?;
        }
        Role::Admin => {
            command
                .set_role(&user.id, lnatprep_shared::user::Role::Admin)
                .await?;
            command.activate(&user.id).await?;
        }
        Role::Suspend => command.suspend(&user.id).await?,
    }

    tracing::info!(user_id = %user.id, "{email} updated");

    Ok(())
}

pub async fn grant_trial(
    config: lnatprep::Config,
    email: String,
    reason: Option<String>,
) -> anyhow::Result<()> {
    let command = super::command(&config).await?;
    let user = find_user(&command, &email).await?;

    let trial = command
        .grant_trial(&user.id, reason, &Metadata::system("cli"))
        .await?;

    println!("{}", serde_json::to_string_pretty(&trial)?);

    Ok(())
}

pub async fn token(config: lnatprep::Config, email: String) -> anyhow::Result<()> {
    let command = super::command(&config).await?;
    let user = find_user(&command, &email).await?;

    let token = lnatprep::auth::generate_token(&config.jwt, user.id, user.role)?;
    println!("{token}");

    Ok(())
}
