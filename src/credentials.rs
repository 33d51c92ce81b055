//! Credential acquisition: environment first, interactive prompt as the
//! fallback. Must succeed before any navigation starts.

use std::env;
use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use unban_core::Credentials;

const USERNAME_VAR: &str = "FACEBOOK_USERNAME";
const PASSWORD_VAR: &str = "FACEBOOK_PASSWORD";

pub fn acquire() -> Result<Credentials> {
    let username = match nonempty_var(USERNAME_VAR) {
        Some(value) => value,
        None => prompt_line("Enter Facebook username (email): ")?,
    };
    let password = match nonempty_var(PASSWORD_VAR) {
        Some(value) => value,
        None => rpassword::prompt_password("Enter Facebook password: ")
            .context("failed to read password")?,
    };

    if username.is_empty() || password.is_empty() {
        bail!("credentials must be provided before any navigation starts");
    }

    Ok(Credentials { username, password })
}

pub fn prompt_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush().context("failed to flush stdout")?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("failed to read input")?;
    Ok(line.trim().to_string())
}

fn nonempty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
