//! OAuth authorization-code flow.

use std::io::{self, BufRead, Write};

use crate::client::MovesApi;
use crate::config::{Config, ConfigStore};
use crate::error::Result;

/// Asks the user to authorize the app and hand back the resulting code.
pub trait AuthorizationPrompter {
    /// Returns `None` if the user chose not to continue.
    fn request_code(&self, authorize_url: &str) -> Result<Option<String>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState {
    MissingCredentials,
    Aborted,
    Ready(String),
}

/// Makes sure `config` carries an access token, running the OAuth exchange
/// when it does not.
///
/// A successful exchange is persisted through `store`. A failed exchange is
/// returned as [`crate::Error::TokenExchange`] and leaves the config untouched.
pub fn ensure_access_token(
    config: &mut Config,
    store: &impl ConfigStore,
    api: &impl MovesApi,
    prompter: &impl AuthorizationPrompter,
) -> Result<TokenState> {
    let Some((client_id, client_secret)) = config.client_credentials() else {
        return Ok(TokenState::MissingCredentials);
    };

    if let Some(token) = config.access_token() {
        return Ok(TokenState::Ready(token.to_string()));
    }

    let url = api.authorize_url(client_id);
    let code = match prompter.request_code(&url)? {
        Some(code) if !code.trim().is_empty() => code.trim().to_string(),
        _ => return Ok(TokenState::Aborted),
    };

    let token = api.exchange_code(client_id, client_secret, &code)?;
    config.access_token = token.clone();
    store.save(config)?;
    tracing::info!("Access token saved");

    Ok(TokenState::Ready(token))
}

/// Interactive prompter reading from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn read_line(prompt: &str) -> io::Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

impl AuthorizationPrompter for TerminalPrompter {
    fn request_code(&self, authorize_url: &str) -> Result<Option<String>> {
        println!(
            "
No access token is set in the config file, so we'll have to request one.
Open the Moves authorization page below in your web browser and follow the
instructions there to get your auth code. Once you have it, paste it into
the next prompt.
"
        );

        let answer = Self::read_line("Press Enter to continue or 'q' to quit. ")?;
        if answer.eq_ignore_ascii_case("q") {
            return Ok(None);
        }

        println!("\n{authorize_url}\n");
        let code = Self::read_line("Enter the authorization code: ")?;
        Ok((!code.is_empty()).then_some(code))
    }
}
