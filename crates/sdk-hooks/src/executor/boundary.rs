use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Produces the token that delimits a hook's response on stdout.
///
/// A fresh token is requested for every invocation. Closures returning a
/// `String` implement this trait, which keeps tests deterministic.
pub trait BoundaryGenerator: Send + Sync {
    fn generate(&self) -> String;
}

impl<F> BoundaryGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn generate(&self) -> String {
        self()
    }
}

/// SHA-256 of ten random alphanumeric characters, hex encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomBoundary;

impl BoundaryGenerator for RandomBoundary {
    fn generate(&self) -> String {
        let seed: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(10)
            .map(char::from)
            .collect();
        Sha256::digest(seed.as_bytes())
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_boundary_is_hex_and_fresh() {
        let a = RandomBoundary.generate();
        let b = RandomBoundary.generate();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn closures_are_generators() {
        let fixed = || "fixed-token".to_string();
        assert_eq!(fixed.generate(), "fixed-token");
    }
}
