use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine as _;
use rand::RngCore;
use sha2::{Digest, Sha256};

pub mod master_key;

const VERSION_PREFIX: &str = "v1:";

fn derive_key(secret: &str) -> Key<Aes256Gcm> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    let out = hasher.finalize();
    let mut k = [0u8; 32];
    k.copy_from_slice(&out);
    Key::<Aes256Gcm>::from_slice(&k).clone()
}

/// `v1:<nonce b64>:<ciphertext b64>` with a fresh 96-bit nonce per call.
pub fn encrypt_string(secret: &str, plaintext: &str) -> anyhow::Result<String> {
    let key = derive_key(secret);
    let cipher = Aes256Gcm::new(&key);
    let mut nonce_bytes = [0u8; 12];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ct = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| anyhow::anyhow!("encrypt failed: {}", e))?;
    let n_b64 = base64::engine::general_purpose::STANDARD.encode(nonce_bytes);
    let c_b64 = base64::engine::general_purpose::STANDARD.encode(ct);
    Ok(format!("{}{}:{}", VERSION_PREFIX, n_b64, c_b64))
}

pub fn decrypt_string(secret: &str, ciphertext: &str) -> anyhow::Result<String> {
    // Values stored before encryption was enabled
    if !is_encrypted(ciphertext) {
        return Ok(ciphertext.to_string());
    }
    let parts: Vec<&str> = ciphertext.splitn(3, ':').collect();
    if parts.len() != 3 {
        anyhow::bail!("invalid format");
    }
    let nonce_bytes = base64::engine::general_purpose::STANDARD
        .decode(parts[1])
        .map_err(|e| anyhow::anyhow!("b64 decode nonce: {}", e))?;
    if nonce_bytes.len() != 12 {
        anyhow::bail!("invalid nonce length {}", nonce_bytes.len());
    }
    let ct_bytes = base64::engine::general_purpose::STANDARD
        .decode(parts[2])
        .map_err(|e| anyhow::anyhow!("b64 decode ct: {}", e))?;
    let key = derive_key(secret);
    let cipher = Aes256Gcm::new(&key);
    let nonce = Nonce::from_slice(&nonce_bytes);
    let pt = cipher
        .decrypt(nonce, ct_bytes.as_ref())
        .map_err(|e| anyhow::anyhow!("decrypt failed: {}", e))?;
    Ok(String::from_utf8(pt)?)
}

pub fn is_encrypted(value: &str) -> bool {
    value.starts_with(VERSION_PREFIX)
}
