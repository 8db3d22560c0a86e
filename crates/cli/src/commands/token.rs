//! Development bearer tokens.
//!
//! Signs with `STRIDE_TOKEN_SECRET`, validated exactly as the API validates
//! it, so a minted token is accepted by a server sharing the environment.

use stride_api::config::ApiConfig;
use stride_api::middleware::TokenKey;
use stride_core::{Role, UserId};

use super::CommandError;

/// Print a token for `user` with `role` on stdout.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the user ID is not positive.
pub fn mint(user: i32, role: Role) -> Result<(), CommandError> {
    if user <= 0 {
        return Err(CommandError::Invalid(format!(
            "user ID must be positive (got {user})"
        )));
    }

    let config = ApiConfig::from_env()?;
    let token = TokenKey::new(config.token_secret)
        .mint(UserId::new(user), role)
        .map_err(|e| CommandError::Invalid(e.to_string()))?;

    #[allow(clippy::print_stdout)]
    {
        println!("{token}");
    }
    Ok(())
}
