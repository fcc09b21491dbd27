//! One-shot key generation and persistence.

use crate::error::{IssuerError, IssuerResult};
use auth_caep::{KeyGenParams, KeySet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

/// Where the generated key set goes.
#[derive(Debug, Clone)]
pub struct KeygenRequest {
    /// Generation parameters
    pub params: KeyGenParams,
    /// Public key set file (safe to publish)
    pub public_path: PathBuf,
    /// Private key set file (mode 0600 on Unix)
    pub private_path: PathBuf,
    /// Overwrite existing key set files
    pub force: bool,
}

/// Result of a key generation run.
#[derive(Debug, Clone)]
pub struct KeygenOutcome {
    /// Generated keys
    pub keys: KeySet,
    /// Public key set file written
    pub public_path: PathBuf,
    /// Private key set file written
    pub private_path: PathBuf,
}

/// Generate one key and write both key set files.
///
/// Without `force`, either file already existing refuses the run and leaves
/// both untouched. Existence is checked again when the files are opened
/// (`create_new`). If any open or write fails, the files this run opened are
/// removed so the pair never disagrees.
///
/// # Errors
///
/// Returns [`IssuerError::AlreadyExists`], key generation failures, or the
/// I/O error of the file that could not be written.
#[instrument(skip_all, fields(bits = request.params.bits, alg = %request.params.algorithm))]
pub async fn generate_key_files(request: KeygenRequest) -> IssuerResult<KeygenOutcome> {
    if !request.force {
        for path in [&request.private_path, &request.public_path] {
            if tokio::fs::try_exists(path).await.map_err(|e| IssuerError::io(path, e))? {
                return Err(IssuerError::AlreadyExists(path.clone()));
            }
        }
    }

    let params = request.params.clone();
    let keys = tokio::task::spawn_blocking(move || KeySet::generate(&params))
        .await
        .map_err(|e| IssuerError::Task(e.to_string()))??;
    let private_json = keys.export_full()?;
    let public_json = keys.export_public()?;

    let mut private = open_key_file(&request.private_path, request.force, true).await?;
    let mut public = match open_key_file(&request.public_path, request.force, false).await {
        Ok(file) => file,
        Err(e) => {
            discard(&[request.private_path.as_path()]).await;
            return Err(e);
        }
    };

    let written = match write_all(&mut private, &request.private_path, &private_json).await {
        Ok(()) => write_all(&mut public, &request.public_path, &public_json).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        discard(&[request.private_path.as_path(), request.public_path.as_path()]).await;
        return Err(e);
    }

    info!(
        kid = %keys.keys()[0].kid(),
        public = %request.public_path.display(),
        private = %request.private_path.display(),
        "key set files written"
    );
    Ok(KeygenOutcome { keys, public_path: request.public_path, private_path: request.private_path })
}

/// Read and parse a key set file.
///
/// # Errors
///
/// Returns the I/O error or [`auth_caep::CaepError::KeyLoad`].
pub async fn read_key_set(path: &Path) -> IssuerResult<KeySet> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| IssuerError::io(path, e))?;
    Ok(KeySet::load(&text)?)
}

async fn open_key_file(path: &Path, force: bool, private: bool) -> IssuerResult<File> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    #[cfg(unix)]
    {
        if private {
            options.mode(0o600);
        }
    }

    let file = options.open(path).await.map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => IssuerError::AlreadyExists(path.to_path_buf()),
        _ => IssuerError::io(path, e),
    })?;

    // `mode` only applies on creation; tighten a file that already existed.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if private {
            if let Err(e) = file.set_permissions(std::fs::Permissions::from_mode(0o600)).await {
                discard(&[path]).await;
                return Err(IssuerError::io(path, e));
            }
        }
    }
    #[cfg(not(unix))]
    let _ = private;
    Ok(file)
}

async fn write_all(file: &mut File, path: &Path, contents: &str) -> IssuerResult<()> {
    file.write_all(contents.as_bytes()).await.map_err(|e| IssuerError::io(path, e))?;
    file.flush().await.map_err(|e| IssuerError::io(path, e))
}

async fn discard(paths: &[&Path]) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "failed to remove partial key file");
        }
    }
}
