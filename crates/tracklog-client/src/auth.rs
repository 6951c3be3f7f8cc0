//! Password hashing for the realtime handshake.

use crc::{Crc, CRC_64_XZ};

// CRC-64 over the ECMA-182 polynomial, reflected, with all-ones init and
// xorout. The server computes the digest over bit-reversed UTF-16LE code
// units and bit-reverses the result.
const CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_XZ);

/// Hash a password for the realtime handshake. The empty password hashes
/// to zero.
pub fn hash_password(password: &str) -> u64 {
    let mut bytes = Vec::with_capacity(password.len() * 2);
    for unit in password.encode_utf16() {
        bytes.push((unit as u8).reverse_bits());
        bytes.push(((unit >> 8) as u8).reverse_bits());
    }
    CRC64.checksum(&bytes).reverse_bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_vectors() {
        assert_eq!(hash_password(""), 0x0000000000000000);
        assert_eq!(hash_password("pass"), 0x5e1e445fd60ac2e0);
        assert_eq!(hash_password("password"), 0x3c0e55f1cfff14c4);
        assert_eq!(hash_password("abc"), 0xfc99a9ae7dfa5bfc);
        assert_eq!(hash_password("abc123"), 0x2bd464b05d7103f1);
        assert_eq!(hash_password("12345"), 0x6b40207b495297f4);
    }

    #[test]
    fn test_hash_password_hex_form() {
        assert_eq!(format!("{:x}", hash_password("")), "0");
        assert_eq!(format!("{:x}", hash_password("pass")), "5e1e445fd60ac2e0");
    }
}
