use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;

/// Resolves a stored image descriptor to raw bytes.
pub async fn retrieve(cfg: &glossa_config::ImageStoreConfig, descriptor: &str) -> Result<Vec<u8>> {
	fetch(cfg, &cfg.image_path, descriptor).await
}

/// Thumbnail variant served by the image service; rendering happens there.
pub async fn retrieve_thumbnail(
	cfg: &glossa_config::ImageStoreConfig,
	descriptor: &str,
) -> Result<Vec<u8>> {
	fetch(cfg, &cfg.thumbnail_path, descriptor).await
}

async fn fetch(
	cfg: &glossa_config::ImageStoreConfig,
	path: &str,
	descriptor: &str,
) -> Result<Vec<u8>> {
	let descriptor = descriptor.trim();

	if descriptor.is_empty() {
		return Err(eyre::eyre!("Image descriptor is empty."));
	}

	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}/{}", cfg.api_base, path, descriptor);
	let mut request = client.get(url);

	if let Some(api_key) = cfg.api_key.as_deref() {
		request = request.bearer_auth(api_key);
	}

	let bytes = request.send().await?.error_for_status()?.bytes().await?;

	Ok(bytes.to_vec())
}
