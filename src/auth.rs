use password_auth::{generate_hash, verify_password};
use rand::distributions::Alphanumeric;
use rand::Rng;

const TOKEN_LEN: usize = 32;

pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Salted argon2 hash in PHC string form.
pub fn hash_password(password: &str) -> String {
    generate_hash(password)
}

pub fn check_password(password: &str, hash: &str) -> bool {
    verify_password(password, hash).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_alphanumeric_and_distinct() {
        let first = generate_token();
        let second = generate_token();
        assert_eq!(first.len(), TOKEN_LEN);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
    }

    #[test]
    fn hash_round_trips_and_hides_plaintext() {
        let hash = hash_password("pw1");
        assert!(!hash.contains("pw1"));
        assert!(check_password("pw1", &hash));
        assert!(!check_password("pw2", &hash));
    }

    #[test]
    fn malformed_hash_never_matches() {
        assert!(!check_password("pw1", "not-a-phc-string"));
    }
}
