//! Password hashing and captcha codes

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Marks a stored password that was seeded in clear text
pub const PLAIN_PASSWORD_PREFIX: &str = "plain:";

const CAPTCHA_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Hashes a password into its stored form
pub fn hash_password(password: &str) -> String {
    STANDARD.encode(blake3::hash(password.as_bytes()).as_bytes())
}

/// Checks a password against its stored form in constant time
pub fn verify_password(password: &str, stored: &str) -> bool {
    let expected = match stored.strip_prefix(PLAIN_PASSWORD_PREFIX) {
        Some(plain) => plain.to_string(),
        None => {
            let candidate = hash_password(password);
            return candidate.as_bytes().ct_eq(stored.as_bytes()).into();
        }
    };
    password.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Generates a 6 or 7 character alphanumeric captcha code
pub fn generate_captcha() -> String {
    let entropy = Uuid::new_v4();
    let bytes = entropy.as_bytes();
    let length = 6 + usize::from(bytes[0] & 1);
    bytes[1..=length]
        .iter()
        .map(|b| CAPTCHA_ALPHABET[usize::from(*b) % CAPTCHA_ALPHABET.len()] as char)
        .collect()
}

/// Compares an entered captcha with the generated one
pub fn verify_captcha(entered: &str, generated: &str) -> bool {
    !generated.is_empty() && entered == generated
}
