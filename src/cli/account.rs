//! Account and session commands.

use clap::Subcommand;

use super::output::print_result;
use crate::client::{ApiClient, Theme};

#[derive(Subcommand, Debug, Clone)]
pub enum AccountCommand {
    /// Create an account and sign in
    Register {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "SITECOST_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign in with a username or email
    Login {
        #[arg(long)]
        username: String,

        #[arg(long, env = "SITECOST_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the saved session
    Logout,

    /// Show the signed-in user
    Profile {
        #[arg(long)]
        json: bool,
    },

    /// Change the account password
    ChangePassword {
        #[arg(long)]
        current: String,

        #[arg(long)]
        new: String,
    },

    /// Show or set the preferred theme (light or dark)
    Theme { theme: Option<Theme> },
}

/// Run an account command.
pub async fn run_account_command(cmd: AccountCommand, client: &ApiClient) -> anyhow::Result<()> {
    match cmd {
        AccountCommand::Register {
            username,
            email,
            password,
        } => {
            let user = client.register(&username, &email, &password).await?;
            println!("Registered and signed in as {}", user.username);
        }
        AccountCommand::Login { username, password } => {
            let user = client.login(&username, &password).await?;
            println!("Signed in as {}", user.username);
        }
        AccountCommand::Logout => {
            client.logout()?;
            println!("Signed out");
        }
        AccountCommand::Profile { json } => {
            let user = client.profile().await?;
            print_result(&user, json)?;
        }
        AccountCommand::ChangePassword { current, new } => {
            let message = client.change_password(&current, &new).await?;
            println!("{}", message);
        }
        AccountCommand::Theme { theme: Some(theme) } => {
            client.session().set_theme(theme)?;
            println!("Theme set to {}", theme);
        }
        AccountCommand::Theme { theme: None } => {
            println!("{}", client.session().theme());
        }
    }
    Ok(())
}
