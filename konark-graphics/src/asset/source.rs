use std::path::{Path, PathBuf};

use tokio::io::AsyncReadExt;

use super::{LoadProgress, ProgressSender};

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Location every asset name is resolved against: a local directory or an
/// http(s) base URL.
#[derive(Debug, Clone)]
pub enum AssetSource {
    Directory(PathBuf),
    Remote {
        base: reqwest::Url,
        client: reqwest::Client,
    },
}

impl AssetSource {
    pub fn new(base_path: &str) -> anyhow::Result<Self> {
        if base_path.starts_with("http://") || base_path.starts_with("https://") {
            // Url::join drops the last segment unless the base ends with '/'
            let base = if base_path.ends_with('/') {
                reqwest::Url::parse(base_path)?
            } else {
                reqwest::Url::parse(&format!("{}/", base_path))?
            };
            Ok(Self::Remote {
                base,
                client: reqwest::Client::new(),
            })
        } else {
            Ok(Self::Directory(Path::new(base_path).to_path_buf()))
        }
    }

    /// Full location of `name`, used for fetching and in error reports.
    pub fn resolve(&self, name: &str) -> String {
        match self {
            Self::Directory(dir) => dir.join(name).to_string_lossy().to_string(),
            Self::Remote { base, .. } => base
                .join(name)
                .map(|url| url.to_string())
                .unwrap_or_else(|_| format!("{}{}", base, name)),
        }
    }

    pub async fn fetch(
        &self,
        name: &str,
        progress: Option<&ProgressSender>,
    ) -> anyhow::Result<Vec<u8>> {
        match self {
            Self::Directory(dir) => Self::read_file(&dir.join(name), progress).await,
            Self::Remote { base, client } => {
                Self::download(client, base.join(name)?, progress).await
            }
        }
    }

    async fn read_file(path: &Path, progress: Option<&ProgressSender>) -> anyhow::Result<Vec<u8>> {
        let mut file = tokio::fs::File::open(path).await?;
        let total = file.metadata().await?.len();
        let mut buf = Vec::with_capacity(total as usize);
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];

        loop {
            let read = file.read(&mut chunk).await?;
            if read == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..read]);
            LoadProgress::report(progress, buf.len() as u64, Some(total));
        }

        Ok(buf)
    }

    async fn download(
        client: &reqwest::Client,
        url: reqwest::Url,
        progress: Option<&ProgressSender>,
    ) -> anyhow::Result<Vec<u8>> {
        let mut response = client.get(url).send().await?.error_for_status()?;
        let total = response.content_length();
        let mut buf = Vec::with_capacity(total.unwrap_or(0) as usize);

        while let Some(chunk) = response.chunk().await? {
            buf.extend_from_slice(&chunk);
            LoadProgress::report(progress, buf.len() as u64, total);
        }

        Ok(buf)
    }
}

/// Name of `uri` relative to the asset `name` it was referenced from.
pub fn sibling_asset_name(name: &str, uri: &str) -> String {
    match name.rsplit_once('/') {
        Some((dir, _)) => format!("{}/{}", dir, uri),
        None => uri.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_base_keeps_last_segment() {
        let source = AssetSource::new("https://example.com/konark-new").unwrap();

        assert_eq!(
            source.resolve("cloudy.hdr"),
            "https://example.com/konark-new/cloudy.hdr"
        );
    }

    #[test]
    fn directory_source_joins_path() {
        let source = AssetSource::new("assets").unwrap();

        assert!(matches!(source, AssetSource::Directory(_)));
        assert_eq!(
            source.resolve("konark_8k.glb"),
            Path::new("assets").join("konark_8k.glb").to_string_lossy()
        );
    }

    #[test]
    fn sibling_names_follow_parent_directory() {
        assert_eq!(sibling_asset_name("models/a.gltf", "a.bin"), "models/a.bin");
        assert_eq!(sibling_asset_name("a.gltf", "a.bin"), "a.bin");
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let source = AssetSource::new("definitely/not/here").unwrap();

        assert!(source.fetch("nothing.glb", None).await.is_err());
    }

    #[tokio::test]
    async fn local_fetch_reports_progress() {
        let dir = std::env::temp_dir().join(format!("konark-source-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("blob.bin"), vec![7u8; 100]).await.unwrap();

        let source = AssetSource::Directory(dir.clone());
        let (sender, receiver) = LoadProgress::channel();
        let data = source.fetch("blob.bin", Some(&sender)).await.unwrap();

        assert_eq!(data.len(), 100);
        assert_eq!(receiver.borrow().loaded, 100);
        assert_eq!(receiver.borrow().total, Some(100));
        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
