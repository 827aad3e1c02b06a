use crate::cli::context::CliContext;
use crate::config::ClientConfig;
use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run_login(config: ClientConfig, email: &str, password: Option<String>) -> Result<()> {
    let password = match password.or_else(|| std::env::var("CRUCIBAI_PASSWORD").ok()) {
        Some(password) => password,
        None => read_password().await?,
    };
    if password.is_empty() {
        bail!("Password is empty");
    }

    let context = CliContext::new(config)?;
    let user = context
        .auth
        .login(email, &password)
        .await
        .context("Sign-in failed")?;

    println!("Signed in as {}", user.email);
    if let Some(balance) = user.token_balance {
        println!("Token balance: {balance}");
    }
    Ok(())
}

pub async fn run_logout(config: ClientConfig) -> Result<()> {
    let context = CliContext::new(config)?;
    context.auth.logout().await?;
    println!("Signed out");
    Ok(())
}

pub async fn run_whoami(config: ClientConfig) -> Result<()> {
    let context = CliContext::new(config)?;
    match context.auth.restore().await? {
        Some(user) => {
            println!("{}", user.name.as_deref().unwrap_or(&user.email));
            println!("  email:  {}", user.email);
            if let Some(plan) = &user.plan {
                println!("  plan:   {plan}");
            }
            if let Some(balance) = user.token_balance {
                println!("  tokens: {balance}");
            }
        }
        None if context.auth.is_signed_in() => {
            println!("A token is stored but the backend could not be reached to verify it")
        }
        None => println!("Not signed in"),
    }
    Ok(())
}

async fn read_password() -> Result<String> {
    eprint!("Password: ");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
