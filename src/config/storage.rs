use crate::core::Storage;
use crate::utils::error::Result;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
        let full_path = Path::new(&self.base_path).join(path);
        let parent = full_path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        // 先寫入同目錄的暫存檔再改名，失敗時不會留下半份檔案
        let mut staged = NamedTempFile::new_in(parent)?;
        staged.write_all(data)?;
        staged.as_file().sync_all()?;
        staged.persist(&full_path).map_err(|e| e.error)?;

        Ok(full_path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_string_lossy().into_owned());

        let written = storage.write_file("nested/a.svg", b"<svg/>").await.unwrap();
        assert!(written.ends_with("a.svg"));
        assert_eq!(fs::read(dir.path().join("nested/a.svg")).unwrap(), b"<svg/>");
    }

    #[tokio::test]
    async fn test_overwrite_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_string_lossy().into_owned());

        storage.write_file("X.svg", b"first").await.unwrap();
        storage.write_file("X.svg", b"second").await.unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(fs::read(dir.path().join("X.svg")).unwrap(), b"second");
    }
}
