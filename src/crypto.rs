use anyhow::Context;
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha512;

/// Length of user, module and server keys.
pub const KEY_LENGTH: usize = 16;

type HmacSha512 = Hmac<Sha512>;

pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    OsRng.fill_bytes(&mut buf);
    buf
}

pub fn random_key() -> Vec<u8> {
    random_bytes(KEY_LENGTH)
}

pub fn hmac_sha512(key: &[u8], message: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut mac = HmacSha512::new_from_slice(key).context("initialize hmac-sha512")?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}
