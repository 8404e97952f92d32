use std::ffi::OsStr;
use std::fs;
use std::io::{Error as IoError, ErrorKind as IoErrorKind, Result as IoResult, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, Serializer};
use serde_json::{Value, json};
use tracing::debug;
use walkdir::WalkDir;

use crate::observer::{NoopObserver, ToolObserver};
use crate::tool::{
    Tool, ToolError, ToolInput, ToolOutput, ToolResult, parse_params, run_blocking,
};

/// Leading character that marks an entry as hidden.
pub const HIDDEN_MARKER: char = '.';

/// Separator used in listed paths and appended to directory entries.
const SEPARATOR: char = '/';

/// Arguments for `list_files`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListFilesParams {
    /// Base directory to list, relative to the working directory
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_path() -> String {
    ".".to_owned()
}

impl Default for ListFilesParams {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

/// One entry found under the base directory.
struct FileEntry {
    path: PathBuf,
    is_dir: bool,
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with(HIDDEN_MARKER)
}

/// JSON formatter that puts `", "` between array items and writes non-ASCII
/// text as `\uXXXX` escapes.
struct ListingFormatter;

impl Formatter for ListingFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> IoResult<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> IoResult<()>
    where
        W: ?Sized + Write,
    {
        let mut units = [0_u16; 2];
        for character in fragment.chars() {
            if character.is_ascii() {
                writer.write_all(character.encode_utf8(&mut [0; 4]).as_bytes())?;
            } else {
                for unit in character.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

/// Serialize a listing as a JSON array of strings with `", "` separators.
fn format_listing(files: &[String]) -> IoResult<String> {
    let mut buffer = Vec::new();
    files.serialize(&mut Serializer::with_formatter(&mut buffer, ListingFormatter))?;
    String::from_utf8(buffer).map_err(IoError::other)
}

/// Render `path` relative to `base`, using `/` between components and after directories.
fn render(base: &Path, entry: &FileEntry) -> Result<String, IoError> {
    let relative = entry.path.strip_prefix(base).map_err(IoError::other)?;
    let mut rendered = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join(&SEPARATOR.to_string());
    if entry.is_dir {
        rendered.push(SEPARATOR);
    }
    Ok(rendered)
}

/// List every non-hidden entry under a directory, recursively.
///
/// Hidden directories are pruned before descent. Entries are sorted by their
/// full path string, files and directories interleaved, and directory entries
/// end with `/`. A base path with a hidden component yields an empty listing.
///
/// # Errors
/// Returns `ListFailed` when the base path is missing, is not a directory or
/// cannot be read. Unreadable subdirectories are skipped.
pub fn list_files(params: &ListFilesParams) -> ToolResult<Vec<String>> {
    let base_str = if params.path.is_empty() {
        "."
    } else {
        params.path.as_str()
    };
    let base = Path::new(base_str);
    let fail = |source: IoError| ToolError::ListFailed {
        path: params.path.clone(),
        source,
    };

    let metadata = fs::metadata(base).map_err(fail)?;
    if !metadata.is_dir() {
        return Err(fail(IoError::new(
            IoErrorKind::NotADirectory,
            "Not a directory",
        )));
    }

    let base_is_hidden = base.components().any(|component| match component {
        Component::Normal(name) => is_hidden(name),
        Component::ParentDir => true,
        Component::Prefix(_) | Component::RootDir | Component::CurDir => false,
    });
    if base_is_hidden {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    let walker = WalkDir::new(base)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry.file_name()));
    for result in walker {
        match result {
            Ok(entry) => entries.push(FileEntry {
                is_dir: entry.file_type().is_dir()
                    || (entry.path_is_symlink() && entry.path().is_dir()),
                path: entry.into_path(),
            }),
            Err(err) if err.depth() == 0 => return Err(fail(err.into())),
            Err(err) => debug!("Skipping unreadable entry under {base_str}: {err}"),
        }
    }

    // Component-wise, so `a/b` stays with `a/` ahead of `a-b` and `a.txt`.
    entries.sort_by(|left, right| left.path.cmp(&right.path));

    entries
        .iter()
        .map(|entry| render(base, entry).map_err(fail))
        .collect()
}

/// Tool that lists a directory tree, skipping hidden entries.
pub struct ListFilesTool {
    observer: Arc<dyn ToolObserver>,
}

impl ListFilesTool {
    /// Create a `ListFilesTool` that reports to no one.
    #[must_use]
    pub fn new() -> Self {
        Self::with_observer(Arc::new(NoopObserver))
    }

    /// Create a `ListFilesTool` that notifies `observer` about each call.
    #[must_use]
    pub fn with_observer(observer: Arc<dyn ToolObserver>) -> Self {
        Self { observer }
    }
}

impl Default for ListFilesTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &'static str {
        "list_files"
    }

    fn description(&self) -> &'static str {
        "List files and directories at a given path, recursively. Hidden entries are \
         skipped and directories end with '/'."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "default": ".",
                    "description": "Optional relative path to list files from. Defaults to current directory."
                }
            },
            "additionalProperties": false
        })
    }

    async fn execute(&self, input: ToolInput) -> ToolResult<ToolOutput> {
        let params: ListFilesParams = parse_params(self.name(), input)?;
        let path = params.path.clone();
        self.observer
            .on_start(self.name(), &format!("Listing files in directory: {path}"));

        let listed = run_blocking(move || {
            let files = list_files(&params)?;
            let text = format_listing(&files).map_err(|source| ToolError::ListFailed {
                path: params.path.clone(),
                source,
            })?;
            Ok((files, text))
        })
        .await;

        match listed {
            Ok((files, text)) => {
                self.observer.on_success(
                    self.name(),
                    &format!("Successfully listed {} files in {path}", files.len()),
                );
                Ok(ToolOutput::success_with_data(text, Value::from(files)))
            }
            Err(err) => {
                self.observer.on_failure(self.name(), &err);
                Ok(ToolOutput::from_error(&err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::from_str;
    use tempfile::TempDir;

    fn list(path: &Path) -> ToolResult<Vec<String>> {
        list_files(&ListFilesParams {
            path: path.to_string_lossy().into_owned(),
        })
    }

    /// `TempDir::new` names directories `.tmpXXXX`, which would hide the whole base.
    fn visible_temp_dir() -> TempDir {
        TempDir::with_prefix("toolbelt-list-").unwrap()
    }

    fn project() -> TempDir {
        let temp_dir = visible_temp_dir();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("visible/nested")).unwrap();
        fs::create_dir_all(root.join(".hidden/deeper")).unwrap();
        fs::create_dir_all(root.join("visible/.cache")).unwrap();
        fs::write(root.join("visible/public.txt"), "public").unwrap();
        fs::write(root.join("visible/nested/deep.rs"), "fn main() {}").unwrap();
        fs::write(root.join("visible/.cache/blob"), "cached").unwrap();
        fs::write(root.join(".hidden/secret.txt"), "secret").unwrap();
        fs::write(root.join(".hidden/deeper/more.txt"), "more").unwrap();
        fs::write(root.join(".env"), "KEY=1").unwrap();
        fs::write(root.join("README.md"), "# readme").unwrap();
        temp_dir
    }

    #[test]
    fn test_lists_recursively_sorted_with_directory_suffix() {
        let temp_dir = project();
        let files = list(temp_dir.path()).unwrap();
        assert_eq!(
            files,
            vec![
                "README.md",
                "visible/",
                "visible/nested/",
                "visible/nested/deep.rs",
                "visible/public.txt",
            ]
        );
    }

    #[test]
    fn test_hidden_entries_excluded_at_any_depth() {
        let temp_dir = project();
        let files = list(temp_dir.path()).unwrap();
        assert!(files.iter().all(|file| {
            file.split(SEPARATOR)
                .all(|component| !component.starts_with(HIDDEN_MARKER))
        }));
    }

    #[test]
    fn test_only_directories_carry_separator() {
        let temp_dir = project();
        for file in list(temp_dir.path()).unwrap() {
            let on_disk = temp_dir.path().join(file.trim_end_matches(SEPARATOR));
            assert_eq!(file.ends_with(SEPARATOR), on_disk.is_dir(), "{file}");
        }
    }

    #[test]
    fn test_directory_children_sort_before_similar_siblings() {
        let temp_dir = visible_temp_dir();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a-b"), "").unwrap();
        fs::write(root.join("a.txt"), "").unwrap();

        assert_eq!(list(root).unwrap(), vec!["a/", "a/b/", "a-b", "a.txt"]);
    }

    #[test]
    fn test_parent_component_in_base_yields_empty_listing() {
        let temp_dir = project();
        let through_parent = temp_dir.path().join("visible/nested/..");
        assert!(list(&through_parent).unwrap().is_empty());

        let bare_parent = temp_dir.path().join("visible/..");
        assert!(list(&bare_parent).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_is_suffixed_but_not_entered() {
        let temp_dir = project();
        std::os::unix::fs::symlink(
            temp_dir.path().join("visible/nested"),
            temp_dir.path().join("visible/link"),
        )
        .unwrap();

        let files = list(&temp_dir.path().join("visible")).unwrap();
        assert_eq!(
            files,
            vec!["link/", "nested/", "nested/deep.rs", "public.txt"]
        );
    }

    #[test]
    fn test_listing_text_uses_spaced_separators_and_ascii_escapes() {
        let files = vec!["caf\u{e9}/".to_owned(), "a/b.txt".to_owned()];
        assert_eq!(
            format_listing(&files).unwrap(),
            r#"["caf\u00e9/", "a/b.txt"]"#
        );
        assert_eq!(format_listing(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_hidden_base_yields_empty_listing() {
        let temp_dir = project();
        let files = list(&temp_dir.path().join(".hidden")).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_empty_directory() {
        let temp_dir = visible_temp_dir();
        assert!(list(temp_dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_base_is_error() {
        let temp_dir = visible_temp_dir();
        let missing = temp_dir.path().join("missing");
        let err = list(&missing).unwrap_err();
        assert!(matches!(err, ToolError::ListFailed { .. }));
        assert!(err.to_string().starts_with(&format!(
            "Error: Failed to list files in '{}': ",
            missing.display()
        )));
    }

    #[test]
    fn test_file_base_is_error() {
        let temp_dir = project();
        let err = list(&temp_dir.path().join("README.md")).unwrap_err();
        assert!(err.to_string().ends_with("Not a directory"));
    }

    #[tokio::test]
    async fn test_tool_serializes_listing_as_json_array() {
        let temp_dir = project();
        let tool = ListFilesTool::new();
        let output = tool
            .execute(ToolInput::new(json!({ "path": temp_dir.path().join("visible") })))
            .await
            .unwrap();
        assert!(output.success);

        assert_eq!(
            output.message,
            r#"["nested/", "nested/deep.rs", "public.txt"]"#
        );
        let files: Vec<String> = from_str(&output.message).unwrap();
        assert_eq!(Some(Value::from(files)), output.data);
    }

    #[test]
    fn test_path_defaults_to_current_directory() {
        let params: ListFilesParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(params.path, ".");
    }
}
