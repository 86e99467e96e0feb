use crate::prelude::*;
use codeprompt_core::source::SourceFile;
use tokio::io::AsyncReadExt;

#[derive(Debug, clap::Args)]
pub struct PasteOptions {
    /// Name recorded for the pasted code
    #[arg(long, default_value = "pasted_code.txt")]
    pub path: String,
}

pub async fn run(options: PasteOptions, _global: &crate::Global) -> Result<Vec<SourceFile>> {
    let mut content = String::new();
    tokio::io::stdin()
        .read_to_string(&mut content)
        .await
        .context("Failed to read code from stdin")?;

    pasted_file(options.path, content)
}

/// Pasted code becomes a single file; blank input is rejected.
pub fn pasted_file(path: String, content: String) -> Result<Vec<SourceFile>> {
    if content.trim().is_empty() {
        return Err(codeprompt_core::Error::EmptyImport("stdin".to_string()).into());
    }
    Ok(vec![SourceFile::new(path, content)])
}
