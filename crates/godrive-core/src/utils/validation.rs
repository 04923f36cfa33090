//! Boundary checks for user-supplied values.
//!
//! These return the message to show; callers wrap it in the error type that
//! fits their layer.

const URL_SCHEMES: [&str; 2] = ["http://", "https://"];

/// Accepts absolute `http`/`https` URLs with a non-empty host.
pub fn validate_url(url: &str) -> Result<(), String> {
    if url.trim().is_empty() {
        return Err("URL cannot be empty".to_string());
    }

    let rest = URL_SCHEMES
        .iter()
        .find_map(|scheme| url.strip_prefix(scheme))
        .ok_or_else(|| format!("Invalid URL '{}': expected http:// or https://", url))?;

    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() || host.contains(char::is_whitespace) {
        return Err(format!("Invalid URL '{}': missing host", url));
    }

    Ok(())
}

/// Loose shape check: one `@`, a local part, and a dotted domain.
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(format!("Invalid email '{}': missing '@'", email));
    };
    if local.is_empty() || domain.contains('@') {
        return Err(format!("Invalid email '{}': malformed address", email));
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(format!("Invalid email '{}': domain is not valid", email));
    }

    Ok(())
}
