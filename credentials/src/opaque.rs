use rand::distributions::Alphanumeric;
use rand::thread_rng;
use rand::Rng;

/// Length of generated opaque token values.
pub const OPAQUE_TOKEN_LENGTH: usize = 64;

/// Generate a cryptographically random, URL-safe opaque token.
///
/// Used for refresh and password-reset tokens, which are persisted
/// server-side and looked up by value. Alphanumeric output needs no
/// percent-encoding when embedded in links.
///
/// Uniqueness is not guaranteed here; callers that persist tokens must
/// check for collisions against existing rows and regenerate.
pub fn generate_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(OPAQUE_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
