//! Per-session token guarding the admin delete form.

use tower_sessions::Session;

use crate::error::ComicError;

const CSRF_TOKEN_KEY: &str = "csrf_token";

fn generate_token() -> String {
    format!(
        "{:016x}{:016x}",
        rand::random::<u64>(),
        rand::random::<u64>()
    )
}

/// The session's token, minted on first use.
pub(crate) async fn csrf_token(session: &Session) -> Result<String, ComicError> {
    if let Some(token) = session.get::<String>(CSRF_TOKEN_KEY).await? {
        return Ok(token);
    }
    let token = generate_token();
    session.insert(CSRF_TOKEN_KEY, token.clone()).await?;
    Ok(token)
}

pub(crate) async fn validate_csrf(session: &Session, token: &str) -> Result<(), ComicError> {
    match session.get::<String>(CSRF_TOKEN_KEY).await? {
        Some(expected) if !token.is_empty() && expected == token => Ok(()),
        _ => Err(ComicError::Unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::generate_token;

    #[test]
    fn tokens_are_hex_and_unique() {
        let first = generate_token();
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, generate_token());
    }
}
