//! Content-addressed publishing of generated files.
//!
//! Files land at `{output_dir}/{category}/{sha256}.{ext}` and are served
//! at `{public_base_url}/{category}/{sha256}.{ext}`. Identical output maps
//! to the same URL, so republishing is idempotent.

use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::config::MediaConfig;
use crate::error::MediaResult;

/// Hex SHA-256 of a file, read in chunks.
pub async fn hash_file(path: &Path) -> MediaResult<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Copy `source` into the published tree and return its public URL.
pub async fn publish_file(
    config: &MediaConfig,
    category: &str,
    extension: &str,
    source: &Path,
) -> MediaResult<String> {
    let digest = hash_file(source).await?;
    let name = format!("{}.{}", digest, extension);

    let dir = config.output_dir.join(category);
    tokio::fs::create_dir_all(&dir).await?;
    let dest = dir.join(&name);

    if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
        debug!("{} already published", dest.display());
    } else {
        // Copy to a sibling temp name first so readers never see a partial file.
        let partial = dir.join(format!(".{}.partial", name));
        tokio::fs::copy(source, &partial).await?;
        tokio::fs::rename(&partial, &dest).await?;
        debug!("Published {}", dest.display());
    }

    Ok(format!("{}/{}/{}", config.public_base_url, category, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_content_same_url() {
        let out = tempfile::tempdir().unwrap();
        let src = tempfile::tempdir().unwrap();
        let config = MediaConfig {
            output_dir: out.path().to_path_buf(),
            public_base_url: "https://cdn.test/media".to_string(),
            ..MediaConfig::default()
        };

        let a = src.path().join("a.jpg");
        let b = src.path().join("b.jpg");
        std::fs::write(&a, b"frame").unwrap();
        std::fs::write(&b, b"frame").unwrap();

        let url_a = publish_file(&config, "thumbnails", "jpg", &a).await.unwrap();
        let url_b = publish_file(&config, "thumbnails", "jpg", &b).await.unwrap();
        assert_eq!(url_a, url_b);
        assert!(url_a.starts_with("https://cdn.test/media/thumbnails/"));
        assert!(url_a.ends_with(".jpg"));

        let name = url_a.rsplit('/').next().unwrap();
        assert_eq!(std::fs::read(out.path().join("thumbnails").join(name)).unwrap(), b"frame");
    }

    #[tokio::test]
    async fn hash_is_hex_sha256() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();
        assert_eq!(
            hash_file(&path).await.unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
