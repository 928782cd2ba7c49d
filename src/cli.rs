use crate::config::constants;
use crate::error::{CliError, CliResult};
use crate::util::file::{collect_files, is_source_file, output_path_for, read_input};
use clap::{Parser, Subcommand, ValueEnum};
use hamly_core::api::{EscapeMode, escape, render_json_attrs, render_template, soft_text};
use notify::{EventKind, RecursiveMode};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

/// Characters to replace
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Replace `"`, `'`, `&`, `<` and `>`
    #[default]
    Full,
    /// Replace `&`, `<` and `>` only
    Minimal,
}

impl From<ModeArg> for EscapeMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Full => EscapeMode::Full,
            ModeArg::Minimal => EscapeMode::Minimal,
        }
    }
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
pub enum Commands {
    /// Escape text files (or stdin) for HTML output
    Escape {
        /// Files or directories; stdin when empty
        sources: Vec<PathBuf>,
        /// Output directory, stdout when absent
        #[clap(short = 'o', long)]
        output_dir: Option<PathBuf>,
        /// Escape mode
        #[clap(short, long, value_enum, default_value_t = ModeArg::Full)]
        mode: ModeArg,
        /// Watch sources and re-escape on change
        #[clap(short, long)]
        watch: bool,
    },

    /// Escape JSON values, printing one result per line
    Values {
        /// JSON file, stdin when absent
        input: Option<PathBuf>,
        /// Convert to text without escaping
        #[clap(long)]
        soft: bool,
    },

    /// Render a JSON attribute list
    Attrs {
        /// JSON file, stdin when absent
        input: Option<PathBuf>,
    },

    /// Render a static HAML template
    Render {
        /// Template file
        template: PathBuf,
        /// JSON object supplying the values of `=` lines
        #[clap(short, long)]
        context: Option<PathBuf>,
        /// Output file, stdout when absent
        #[clap(short = 'o', long)]
        output: Option<PathBuf>,
    },
}

/// hamly Command
#[derive(Parser, Debug)]
#[command(about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

/// State kept between runs of the escape command
#[derive(Debug, Clone)]
pub struct EscapeContext {
    pub mode: EscapeMode,
    pub output_dir: Option<PathBuf>,
    /// Modification time of each file at its last escape
    pub file_cache: HashMap<PathBuf, SystemTime>,
}

impl EscapeContext {
    pub fn new(mode: EscapeMode, output_dir: Option<PathBuf>) -> Self {
        Self {
            mode,
            output_dir,
            file_cache: HashMap::new(),
        }
    }

    /// Check if file has been modified since last cache
    pub fn is_file_modified(&self, path: &Path) -> Result<bool, std::io::Error> {
        let modified = std::fs::metadata(path)?.modified()?;
        Ok(self.file_cache.get(path) != Some(&modified))
    }

    /// Record the current modification time of a file
    pub fn update_cache(&mut self, path: PathBuf) -> Result<(), std::io::Error> {
        let modified = std::fs::metadata(&path)?.modified()?;
        self.file_cache.insert(path, modified);
        Ok(())
    }

    /// Files inside the output directory are never treated as sources
    fn is_output(&self, path: &Path) -> bool {
        let Some(output_dir) = &self.output_dir else {
            return false;
        };
        match (std::fs::canonicalize(path), std::fs::canonicalize(output_dir)) {
            (Ok(path), Ok(dir)) => path.starts_with(dir),
            _ => false,
        }
    }
}

pub async fn escape_command(
    sources: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    mode: EscapeMode,
    watch: bool,
) -> CliResult<()> {
    debug!("Starting escape command");
    debug!("Sources: {:?}", sources);
    debug!("Output: {:?}", output_dir);
    debug!("Mode: {:?}", mode);
    debug!("Watch mode: {}", watch);

    if sources.is_empty() {
        if watch {
            return Err(CliError::missing_input("sources (required by --watch)"));
        }
        let input = read_input(None).await?;
        return write_stdout(&mode.apply(&input)).await;
    }

    if watch && output_dir.is_none() {
        return Err(CliError::invalid_config("--watch requires --output-dir"));
    }

    if let Some(dir) = &output_dir {
        tokio::fs::create_dir_all(dir).await?;
    }

    let mut context = EscapeContext::new(mode, output_dir);
    escape_once(&sources, &mut context, false).await?;

    if watch {
        info!("Entering watch mode...");
        watch_and_escape(sources, context).await?;
    }

    Ok(())
}

/// Escape every source file once; on reruns only modified files are written
async fn escape_once(
    sources: &[PathBuf],
    context: &mut EscapeContext,
    is_rerun: bool,
) -> CliResult<usize> {
    let files = collect_files(sources).await?;
    let mut written = 0;

    for file in files {
        if context.is_output(&file) {
            debug!("Skipping output file: {:?}", file);
            continue;
        }
        if is_rerun && !context.is_file_modified(&file)? {
            continue;
        }

        let content = read_input(Some(&file)).await?;
        let escaped = context.mode.apply(&content);

        match &context.output_dir {
            Some(dir) => {
                let target = output_path_for(&file, dir);
                tokio::fs::write(&target, escaped.as_bytes()).await?;
                debug!("Wrote {:?}", target);
            }
            None => write_stdout(&escaped).await?,
        }

        context.update_cache(file)?;
        written += 1;
    }

    if is_rerun {
        debug!("Re-escaped {} files", written);
    } else {
        info!("Escaped {} files", written);
    }

    Ok(written)
}

/// Watch for file changes and re-escape
async fn watch_and_escape(sources: Vec<PathBuf>, mut context: EscapeContext) -> CliResult<()> {
    use notify::{Config, RecommendedWatcher, Watcher};
    use tokio::sync::mpsc;

    // notify calls back on its own thread; the unbounded sender never blocks it
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            if let Err(e) = tx.send(res) {
                error!("Failed to send watch event: {}", e);
            }
        },
        Config::default(),
    )?;

    for source in &sources {
        if source.is_dir() {
            watcher.watch(source, RecursiveMode::Recursive)?;
            debug!("Watching directory: {:?}", source);
        } else if source.is_file()
            && let Some(parent) = source.parent()
        {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            watcher.watch(parent, RecursiveMode::NonRecursive)?;
            debug!("Watching file parent directory: {:?}", parent);
        }
    }

    debug!("File watcher initialized. Waiting for changes...");

    let mut pending_changes: HashSet<PathBuf> = HashSet::new();
    let mut last_event_time = std::time::Instant::now();

    loop {
        match tokio::time::timeout(constants::WATCH_POLL_INTERVAL, rx.recv()).await {
            Ok(Some(Ok(event))) => {
                if let EventKind::Create(_) | EventKind::Modify(_) = event.kind {
                    let relevant_paths: Vec<_> = event
                        .paths
                        .iter()
                        .filter(|path| is_source_file(path) && !context.is_output(path))
                        .cloned()
                        .collect();

                    if !relevant_paths.is_empty() {
                        pending_changes.extend(relevant_paths);
                        last_event_time = std::time::Instant::now();
                    }
                }
            }
            Ok(Some(Err(e))) => {
                warn!("Watch error: {}", e);
            }
            Err(_elapsed) => {
                if !pending_changes.is_empty()
                    && last_event_time.elapsed() >= constants::WATCH_DEBOUNCE
                {
                    let changed_files: Vec<_> = pending_changes.drain().collect();
                    info!("Detected changes in source files: {:?}", changed_files);

                    match escape_once(&sources, &mut context, true).await {
                        Ok(count) => debug!("Rerun completed, {} files written", count),
                        Err(e) => error!("Rerun failed: {}", e),
                    }
                }
            }
            Ok(None) => {
                error!("Watch channel disconnected");
                break;
            }
        }
    }

    Ok(())
}

pub async fn values_command(input: Option<PathBuf>, soft: bool) -> CliResult<()> {
    debug!("Starting values command, input: {:?}, soft: {}", input, soft);

    let content = read_input(input.as_deref()).await?;
    let values = parse_values(&content)?;
    let output = render_values(&values, soft)?;
    write_stdout(&output).await
}

pub async fn attrs_command(input: Option<PathBuf>) -> CliResult<()> {
    debug!("Starting attrs command, input: {:?}", input);

    let content = read_input(input.as_deref()).await?;
    let json: serde_json::Value = serde_json::from_str(&content)?;
    let mut output = render_json_attrs(&json)?;
    output.push('\n');
    write_stdout(&output).await
}

pub async fn render_command(
    template: PathBuf,
    context: Option<PathBuf>,
    output: Option<PathBuf>,
) -> CliResult<()> {
    debug!("Starting render command");
    debug!("Template: {:?}", template);
    debug!("Context: {:?}", context);

    let source = read_input(Some(&template)).await?;
    let context = match context {
        Some(path) => serde_json::from_str(&read_input(Some(&path)).await?)?,
        None => serde_json::Value::Object(serde_json::Map::new()),
    };
    let html = render_template(&source, &context)?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, html.as_bytes()).await?;
            info!("Rendered {:?} to {:?}", template, path);
            Ok(())
        }
        None => write_stdout(&html).await,
    }
}

/// Read whitespace separated JSON values; a lone top-level array is expanded
/// into its items.
pub fn parse_values(content: &str) -> CliResult<Vec<serde_json::Value>> {
    let mut values = serde_json::Deserializer::from_str(content)
        .into_iter::<serde_json::Value>()
        .collect::<Result<Vec<_>, _>>()?;

    if matches!(values.as_slice(), [serde_json::Value::Array(_)])
        && let Some(serde_json::Value::Array(items)) = values.pop()
    {
        return Ok(items);
    }
    Ok(values)
}

/// One escaped (or soft text) result per line
pub fn render_values(values: &[serde_json::Value], soft: bool) -> CliResult<String> {
    let mut output = String::new();
    for value in values {
        let text = if soft { soft_text(value)? } else { escape(value)? };
        output.push_str(&text);
        output.push('\n');
    }
    Ok(output)
}

async fn write_stdout(text: &str) -> CliResult<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_escape_command() {
        let cli = Cli::try_parse_from([
            "hamly", "escape", "a.txt", "docs", "-o", "out", "-m", "minimal", "-w",
        ])
        .unwrap();

        match cli.cmd {
            Commands::Escape {
                sources,
                output_dir,
                mode,
                watch,
            } => {
                assert_eq!(sources, vec![PathBuf::from("a.txt"), PathBuf::from("docs")]);
                assert_eq!(output_dir, Some(PathBuf::from("out")));
                assert_eq!(mode, ModeArg::Minimal);
                assert!(watch);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_escape_defaults() {
        let cli = Cli::try_parse_from(["hamly", "escape"]).unwrap();
        match cli.cmd {
            Commands::Escape {
                sources,
                output_dir,
                mode,
                watch,
            } => {
                assert!(sources.is_empty());
                assert!(output_dir.is_none());
                assert_eq!(mode, ModeArg::Full);
                assert!(!watch);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_values_command() {
        let cli = Cli::try_parse_from(["hamly", "values", "--soft", "in.json"]).unwrap();
        assert!(matches!(
            cli.cmd,
            Commands::Values { input: Some(_), soft: true }
        ));
    }

    #[test]
    fn test_mode_conversion() {
        assert_eq!(EscapeMode::from(ModeArg::Full), EscapeMode::Full);
        assert_eq!(EscapeMode::from(ModeArg::Minimal), EscapeMode::Minimal);
    }

    #[test]
    fn test_parse_values_array() {
        let values = parse_values(r#"["<a>", 1, null]"#).unwrap();
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_parse_values_lines() {
        let values = parse_values("\"x\"\n2\ntrue\n").unwrap();
        assert_eq!(values.len(), 3);
        let nested = parse_values("[1]\n[2]").unwrap();
        assert_eq!(nested.len(), 2);
    }

    #[test]
    fn test_parse_values_invalid() {
        assert!(matches!(parse_values("[1,"), Err(CliError::Json(_))));
    }

    #[test]
    fn test_render_values() {
        let values = parse_values(r#"["<a>", 1, 2.5, null, true, {"k": "'"}]"#).unwrap();
        assert_eq!(
            render_values(&values, false).unwrap(),
            "&lt;a&gt;\n1\n2.5\nNone\ntrue\n{&#34;k&#34;:&#34;&#39;&#34;}\n"
        );
        assert_eq!(
            render_values(&values, true).unwrap(),
            "<a>\n1\n2.5\nNone\ntrue\n{\"k\":\"'\"}\n"
        );
    }

    #[tokio::test]
    async fn test_escape_once_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let out = dir.path().join("out");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(src.join("page.txt"), "1 < 2 & \"q\"").unwrap();

        let mut context = EscapeContext::new(EscapeMode::Full, Some(out.clone()));
        let written = escape_once(&[src.clone()], &mut context, false).await.unwrap();

        assert_eq!(written, 1);
        let escaped = std::fs::read_to_string(out.join("page.txt.html")).unwrap();
        assert_eq!(escaped, "1 &lt; 2 &amp; &#34;q&#34;");

        // Nothing changed, so a rerun writes nothing
        let rerun = escape_once(&[src], &mut context, true).await.unwrap();
        assert_eq!(rerun, 0);
    }

    #[tokio::test]
    async fn test_escape_once_skips_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(dir.path().join("a.txt"), "<").unwrap();
        std::fs::write(out.join("old.html"), "&lt;").unwrap();

        let mut context = EscapeContext::new(EscapeMode::Minimal, Some(out.clone()));
        let written = escape_once(&[dir.path().to_path_buf()], &mut context, false)
            .await
            .unwrap();

        assert_eq!(written, 1);
        assert_eq!(std::fs::read_to_string(out.join("a.txt.html")).unwrap(), "&lt;");
        assert_eq!(std::fs::read_to_string(out.join("old.html")).unwrap(), "&lt;");
    }

    #[tokio::test]
    async fn test_escape_once_named_hidden_dir() {
        let dir = tempfile::tempdir().unwrap();
        let site = dir.path().join(".site");
        let out = dir.path().join("out");
        std::fs::create_dir_all(&site).unwrap();
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(site.join("a.txt"), "a & b").unwrap();

        let mut context = EscapeContext::new(EscapeMode::Full, Some(out.clone()));
        let written = escape_once(&[site], &mut context, false).await.unwrap();

        assert_eq!(written, 1);
        assert_eq!(std::fs::read_to_string(out.join("a.txt.html")).unwrap(), "a &amp; b");
    }

    #[test]
    fn test_parse_render_command() {
        let cli = Cli::try_parse_from(["hamly", "render", "page.haml", "-c", "ctx.json", "-o", "page.html"])
            .unwrap();
        match cli.cmd {
            Commands::Render {
                template,
                context,
                output,
            } => {
                assert_eq!(template, PathBuf::from("page.haml"));
                assert_eq!(context, Some(PathBuf::from("ctx.json")));
                assert_eq!(output, Some(PathBuf::from("page.html")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_render_command_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("page.haml");
        let context = dir.path().join("ctx.json");
        let output = dir.path().join("page.html");
        std::fs::write(&template, "%h1.title= title
%p
  static <b>markup</b>").unwrap();
        std::fs::write(&context, r#"{"title": "Q&A"}"#).unwrap();

        render_command(template, Some(context), Some(output.clone())).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(output).unwrap(),
            "<h1 class='title'>\nQ&amp;A\n</h1>\n<p>\nstatic <b>markup</b>\n</p>\n"
        );
    }

    #[tokio::test]
    async fn test_render_command_undefined_value() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("page.haml");
        std::fs::write(&template, "= title").unwrap();

        let result = render_command(template, None, Some(dir.path().join("out.html"))).await;
        assert!(matches!(
            result,
            Err(CliError::Escape(hamly_core::HamlyError::Undefined(_)))
        ));
    }

    #[tokio::test]
    async fn test_watch_requires_output_dir() {
        let result = escape_command(vec![PathBuf::from("a.txt")], None, EscapeMode::Full, true).await;
        assert!(matches!(result, Err(CliError::InvalidConfig(_))));
    }
}
