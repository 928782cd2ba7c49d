use crate::config::constants;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs as async_fs;
use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Check if the file has one of the source extensions
pub fn is_source_file(path: &Path) -> bool {
    if let Some(extension) = path.extension() {
        let ext_str = extension.to_string_lossy().to_lowercase();
        return constants::SOURCE_EXTENSIONS.contains(&ext_str.as_str());
    }
    false
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

/// Where the escaped copy of `source` is written inside `output_dir`
pub fn output_path_for(source: &Path, output_dir: &Path) -> PathBuf {
    let file_name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stdin".to_string());
    output_dir.join(format!("{file_name}.{}", constants::OUTPUT_EXTENSION))
}

/// Read a whole file, or stdin when no path is given
pub async fn read_input(path: Option<&Path>) -> Result<String, std::io::Error> {
    match path {
        Some(path) => {
            debug!("Reading input file: {:?}", path);
            async_fs::read_to_string(path).await
        }
        None => {
            debug!("Reading input from stdin");
            let mut content = String::new();
            tokio::io::stdin().read_to_string(&mut content).await?;
            Ok(content)
        }
    }
}

/// Recursively collect all source files from given paths.
///
/// Files named explicitly are kept whatever their extension; files found
/// while walking directories must have a source extension.
pub async fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, std::io::Error> {
    info!("Starting file collection, path count: {}", paths.len());

    let mut set = JoinSet::new();
    let files = Arc::new(Mutex::new(Vec::<PathBuf>::new()));

    for path in paths {
        let path = path.clone();
        let files_clone = Arc::clone(&files);
        set.spawn(async move {
            let metadata = async_fs::metadata(&path).await?;
            if metadata.is_dir() {
                debug!("Processing directory: {:?}", path);
                process_directory(path, files_clone).await?
            } else {
                debug!("Found source file: {:?}", path);
                files_clone.lock().await.push(path);
            }
            Ok::<_, std::io::Error>(())
        });
    }

    while let Some(result) = set.join_next().await {
        result.map_err(std::io::Error::other)??;
    }

    let mut result = std::mem::take(&mut *files.lock().await);
    result.sort();
    result.dedup();
    info!("File collection completed, found {} source files", result.len());
    Ok(result)
}

fn process_path(
    path: PathBuf,
    files: Arc<Mutex<Vec<PathBuf>>>,
) -> std::pin::Pin<Box<dyn Future<Output = Result<(), std::io::Error>> + Send>> {
    Box::pin(async move {
        let metadata = tokio::fs::metadata(&path).await?;

        if metadata.is_file() {
            if is_source_file(&path) {
                debug!("Adding source file: {:?}", path);
                files.lock().await.push(path);
            }
        } else if metadata.is_dir() {
            // Roots named by the caller are always walked; only nested
            // hidden directories are skipped
            if is_hidden(&path) {
                debug!("Skipping hidden directory: {:?}", path);
                return Ok(());
            }
            debug!("Recursively processing directory: {:?}", path);
            process_directory(path, files).await?;
        }

        Ok(())
    })
}

fn process_directory(
    dir: PathBuf,
    files: Arc<Mutex<Vec<PathBuf>>>,
) -> std::pin::Pin<Box<dyn Future<Output = Result<(), std::io::Error>> + Send>> {
    Box::pin(async move {
        let mut read_dir = tokio::fs::read_dir(&dir).await?;
        let mut child_tasks = JoinSet::new();
        let mut entry_count = 0;

        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            entry_count += 1;
            let files_clone = Arc::clone(&files);
            child_tasks.spawn(async move { process_path(path, files_clone).await });
        }

        debug!("Found {} entries in directory {:?}", entry_count, dir);

        while let Some(result) = child_tasks.join_next().await {
            result.map_err(std::io::Error::other)??;
        }

        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_source_file() {
        assert!(is_source_file(Path::new("page.html")));
        assert!(is_source_file(Path::new("NOTES.TXT")));
        assert!(is_source_file(Path::new("page.HTM")));
        assert!(!is_source_file(Path::new("layout.haml")));
        assert!(!is_source_file(Path::new("image.png")));
        assert!(!is_source_file(Path::new("Makefile")));
    }

    #[test]
    fn test_output_path_for() {
        let out = output_path_for(Path::new("/src/docs/notes.txt"), Path::new("/out"));
        assert_eq!(out, PathBuf::from("/out/notes.txt.html"));
    }

    #[tokio::test]
    async fn test_collect_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("nested/deeper")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::write(root.join("nested/b.html"), "b").unwrap();
        fs::write(root.join("nested/deeper/c.htm"), "c").unwrap();
        fs::write(root.join("nested/deeper/layout.haml"), "%p").unwrap();
        fs::write(root.join("nested/skip.png"), "x").unwrap();
        fs::write(root.join(".hidden/d.txt"), "d").unwrap();

        let files = collect_files(&[root.to_path_buf()]).await.unwrap();

        assert_eq!(
            files,
            vec![
                root.join("a.txt"),
                root.join("nested/b.html"),
                root.join("nested/deeper/c.htm"),
            ]
        );
    }

    #[tokio::test]
    async fn test_collect_named_hidden_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join(".site");
        fs::create_dir_all(root.join(".cache")).unwrap();
        fs::write(root.join("index.html"), "<p>").unwrap();
        fs::write(root.join(".cache/old.html"), "x").unwrap();

        let files = collect_files(&[root.clone()]).await.unwrap();
        assert_eq!(files, vec![root.join("index.html")]);
    }

    #[tokio::test]
    async fn test_collect_explicit_file_any_extension() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("snippet.md");
        fs::write(&file, "# hi").unwrap();

        let files = collect_files(&[file.clone()]).await.unwrap();
        assert_eq!(files, vec![file]);
    }

    #[tokio::test]
    async fn test_collect_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        assert!(collect_files(&[missing]).await.is_err());
    }

    #[tokio::test]
    async fn test_read_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("in.txt");
        fs::write(&file, "<x>").unwrap();
        assert_eq!(read_input(Some(&file)).await.unwrap(), "<x>");
    }
}
