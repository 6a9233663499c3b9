use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use base64::Engine as _;
use rand::RngCore;
use tracing::info;

/// 32 random bytes, standard base64 (44 chars).
pub fn generate_master_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Returns the key stored at `path`, creating it first when the file does not
/// exist. An existing file is never rewritten. When several processes race to
/// create the file, exactly one key wins and every caller returns it.
pub fn load_or_generate(path: &Path) -> anyhow::Result<String> {
    if let Some(key) = read_existing(path)? {
        return Ok(key);
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let key = generate_master_key();
    match publish(path, &key) {
        Ok(()) => {
            info!(path = %path.display(), "master_key_generated");
            Ok(key)
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            info!(path = %path.display(), "master_key_created_concurrently");
            read_existing(path)?
                .ok_or_else(|| anyhow::anyhow!("master key file {} vanished", path.display()))
        }
        Err(e) => Err(e.into()),
    }
}

fn read_existing(path: &Path) -> anyhow::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let key = contents.trim();
            if key.is_empty() {
                anyhow::bail!("master key file {} is empty", path.display());
            }
            Ok(Some(key.to_string()))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// The key is written to a private temp file and hard-linked into place, so
// `path` only ever appears fully written and the link fails if it already exists.
fn publish(path: &Path, key: &str) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("master.key");
    let tmp = path.with_file_name(format!(".{}.{:016x}.tmp", file_name, rand::random::<u64>()));
    let linked = write_new(&tmp, key).and_then(|()| fs::hard_link(&tmp, path));
    if let Err(e) = fs::remove_file(&tmp) {
        if e.kind() != ErrorKind::NotFound {
            tracing::warn!(path = %tmp.display(), error = ?e, "master_key_tmp_cleanup_failed");
        }
    }
    linked
}

fn write_new(path: &Path, key: &str) -> std::io::Result<()> {
    let mut file = open_new(path)?;
    file.write_all(key.as_bytes())?;
    file.sync_all()
}

#[cfg(unix)]
fn open_new(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_new(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new().write(true).create_new(true).open(path)
}
