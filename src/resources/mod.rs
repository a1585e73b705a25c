//! Loading of external files: raw bytes, textures, OBJ meshes and glTF documents.
//!
//! On native targets a URL is a file system path relative to the working
//! directory. On the web it is resolved against the page origin and fetched.

use crate::data_structures::texture;

pub mod gltf;
pub mod obj;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(target_arch = "wasm32")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[cfg(target_arch = "wasm32")]
    #[error("invalid URL {0}")]
    Url(String),
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> Result<reqwest::Url, FetchError> {
    let origin = web_sys::window()
        .and_then(|window| window.location().origin().ok())
        .ok_or_else(|| FetchError::Url(file_name.to_string()))?;
    let base = reqwest::Url::parse(&format!("{}/", origin))
        .map_err(|_| FetchError::Url(origin.clone()))?;
    base.join(file_name)
        .map_err(|_| FetchError::Url(file_name.to_string()))
}

pub async fn load_binary(file_name: &str) -> Result<Vec<u8>, FetchError> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url)
            .await?
            .error_for_status()?
            .bytes()
            .await?
            .to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = tokio::fs::read(file_name).await?;

    log::debug!("Loaded {} ({} bytes)", file_name, data.len());
    Ok(data)
}

pub async fn load_texture(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<texture::Texture> {
    let data = load_binary(file_name).await?;
    let format = file_name.rsplit_once('.').map(|(_, ext)| ext);
    texture::Texture::from_bytes(device, queue, &data, file_name, format)
}

/// Resolve `uri` relative to the document at `base`.
///
/// Absolute URIs (with a scheme) are returned unchanged. Paths are
/// percent-decoded, and rooted ones are not joined.
pub fn resolve_uri(base: &str, uri: &str) -> String {
    if uri.contains("://") {
        return uri.to_string();
    }
    let path = urlencoding::decode(uri).map_or_else(|_| uri.to_string(), |path| path.into_owned());
    if path.starts_with('/') {
        return path;
    }
    match base.rfind(['/', '\\']) {
        Some(idx) => format!("{}/{}", &base[..idx], path),
        None => path,
    }
}
