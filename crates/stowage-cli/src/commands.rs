use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use serde_json::json;
use stowage_core::app::{FileUpload, Storage, Uploader};
use stowage_core::domain::{ObjectKey, Payload};
use stowage_core::ports::{ObjectStore, UrlSigner};
use tokio::io::AsyncWriteExt;

use crate::cli::Command;

pub(crate) async fn run(command: Command, storage: Storage) -> anyhow::Result<ExitCode> {
    let store = storage.store.clone();

    match command {
        Command::Validate { file, content_type } => {
            let payload = match file {
                Some(path) => Some(read_payload(&path, content_type).await?),
                None => None,
            };
            let result = storage.policy.validate(payload.as_ref());
            print_json(&result)?;
            Ok(status(result.valid))
        }
        Command::Put {
            key,
            file,
            content_type,
        } => {
            let key = ObjectKey::new(key)?;
            let payload = read_payload(&file, content_type).await?;
            let result = storage.policy.validate(Some(&payload));
            if !result.valid {
                print_json(&result)?;
                return Ok(ExitCode::FAILURE);
            }
            print_json(&store.put(&key, payload).await?)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Get { key, out } => {
            let key = ObjectKey::new(key)?;
            let Some(payload) = store.get(&key).await? else {
                print_json(&json!({ "key": key, "found": false }))?;
                return Ok(ExitCode::FAILURE);
            };
            match out {
                Some(path) => {
                    tokio::fs::write(&path, payload.as_bytes())
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    print_json(&json!({ "key": key, "found": true, "bytes": payload.len() }))?;
                }
                None => {
                    let mut stdout = tokio::io::stdout();
                    stdout.write_all(payload.as_bytes()).await?;
                    stdout.flush().await?;
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Delete { key } => {
            let key = ObjectKey::new(key)?;
            store.delete(&key).await?;
            print_json(&json!({ "key": key, "deleted": true }))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Exists { key } => {
            let key = ObjectKey::new(key)?;
            let exists = store.exists(&key).await?;
            print_json(&json!({ "key": key, "exists": exists }))?;
            Ok(status(exists))
        }
        Command::Sign { key, ttl_secs } => {
            let key = ObjectKey::new(key)?;
            let signed = store
                .signed_url(&key, ttl_secs.map(Duration::from_secs))
                .await?;
            print_json(&signed)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify { url } => match storage.signer.verify(&url) {
            Ok(key) => {
                print_json(&json!({ "valid": true, "key": key }))?;
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                print_json(&json!({ "valid": false, "error": e.to_string() }))?;
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Upload { files } => {
            let mut uploads = Vec::with_capacity(files.len());
            for path in &files {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                let payload = read_payload(path, None).await?;
                uploads.push(FileUpload {
                    file_name,
                    payload: Some(payload),
                });
            }

            let uploader = Uploader::new(store).with_policy(storage.policy);
            let receipts = uploader.upload_many(uploads).await?;
            print_json(&receipts)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn read_payload(path: &Path, content_type: Option<String>) -> anyhow::Result<Payload> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let content_type = content_type.or_else(|| guess_content_type(path).map(str::to_string));
    let payload = Payload::new(data);
    Ok(match content_type {
        Some(ct) => payload.with_content_type(ct),
        None => payload,
    })
}

/// 拡張子からの簡易推定
fn guess_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "txt" => "text/plain",
        _ => return None,
    };
    Some(content_type)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn status(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn guesses_common_media_types() {
        assert_eq!(guess_content_type(&PathBuf::from("a.PNG")), Some("image/png"));
        assert_eq!(guess_content_type(&PathBuf::from("clip.mp4")), Some("video/mp4"));
        assert_eq!(guess_content_type(&PathBuf::from("README")), None);
        assert_eq!(guess_content_type(&PathBuf::from("x.unknown")), None);
    }

    #[tokio::test]
    async fn explicit_content_type_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, b"x").unwrap();

        let payload = read_payload(&path, Some("image/x-custom".to_string()))
            .await
            .unwrap();
        assert_eq!(payload.content_type(), Some("image/x-custom"));

        let payload = read_payload(&path, None).await.unwrap();
        assert_eq!(payload.content_type(), Some("image/png"));
    }
}
