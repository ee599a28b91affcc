//! Throwaway identities so repeated runs never collide

use rand::Rng;

/// `len` random lowercase ASCII letters.
pub fn random_string(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

pub fn random_email() -> String {
    format!("{}@agrored.com", random_string(5))
}

pub fn random_product_name() -> String {
    format!("{} Producto Test", random_string(5))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_string_is_lowercase() {
        let s = random_string(32);
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_email_shape() {
        let email = random_email();
        let (local, domain) = email.split_once('@').unwrap();
        assert_eq!(local.len(), 5);
        assert_eq!(domain, "agrored.com");
    }
}
