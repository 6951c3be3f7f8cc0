//! Transparent `.zip.acmi` container handling.
//!
//! A `.zip.acmi` file is a ZIP archive holding exactly one entry, the
//! text recording. Reading inflates that entry; writing produces a fresh
//! archive with a single `<basename>.txt.acmi` entry.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, BufReader};

const ZIP_SUFFIX: &str = ".zip.acmi";

pub fn is_zip_path(path: &Path) -> bool {
    path.to_string_lossy().ends_with(ZIP_SUFFIX)
}

/// Open a recording for reading, unwrapping a `.zip.acmi` container
/// transparently.
pub async fn open_input(path: &Path) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    if is_zip_path(path) {
        let path = path.to_path_buf();
        let data = tokio::task::spawn_blocking(move || read_zip_entry(&path)).await??;
        return Ok(Box::new(std::io::Cursor::new(data)));
    }
    let file = File::open(path)
        .await
        .with_context(|| format!("failed to open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn read_zip_entry(path: &Path) -> Result<Vec<u8>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("{} is not a valid zip archive", path.display()))?;
    if archive.len() != 1 {
        bail!(
            "expected a single entry in {}, found {}; is it a valid ACMI container?",
            path.display(),
            archive.len()
        );
    }
    let mut entry = archive.by_index(0)?;
    let mut data = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut data)?;
    Ok(data)
}

/// Write `data` as the single `<basename>.txt.acmi` entry of a fresh
/// archive at `path`.
pub fn write_zip_acmi(path: &Path, data: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let base = file_name.strip_suffix(ZIP_SUFFIX).unwrap_or(&file_name);
    let entry_name = format!("{base}.txt.acmi");

    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut archive = zip::ZipWriter::new(file);
    archive.start_file(entry_name, zip::write::SimpleFileOptions::default())?;
    std::io::Write::write_all(&mut archive, data)?;
    archive.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_zip_path() {
        assert!(is_zip_path(Path::new("/tmp/sortie.zip.acmi")));
        assert!(!is_zip_path(Path::new("/tmp/sortie.txt.acmi")));
        assert!(!is_zip_path(Path::new("/tmp/sortie.acmi")));
    }

    #[tokio::test]
    async fn test_zip_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sortie.zip.acmi");
        let payload = b"FileType=text/acmi/tacview\nFileVersion=2.2\n";

        write_zip_acmi(&path, payload).unwrap();

        // The archive holds a single renamed entry.
        let file = std::fs::File::open(&path).unwrap();
        let archive = zip::ZipArchive::new(file).unwrap();
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.file_names().next(), Some("sortie.txt.acmi"));

        // And reading it back inflates the payload.
        use tokio::io::AsyncReadExt;
        let mut input = open_input(&path).await.unwrap();
        let mut data = Vec::new();
        input.read_to_end(&mut data).await.unwrap();
        assert_eq!(data, payload);
    }

    #[test]
    fn test_read_rejects_multi_entry_archives() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.zip.acmi");
        let file = std::fs::File::create(&path).unwrap();
        let mut archive = zip::ZipWriter::new(file);
        archive
            .start_file("one.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        archive
            .start_file("two.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        archive.finish().unwrap();

        assert!(read_zip_entry(&path).is_err());
    }
}
