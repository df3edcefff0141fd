use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::load_config;
use crate::utils::inputs::load_scope;
use colored::Colorize;
use ld_extract::Listfile;
use miette::Result;

pub struct ShowScopeArgs {
    pub config_path: Option<String>,
}

/// Prints every listfile entry the scope rules select, without touching the archive.
pub async fn show_scope(args: ShowScopeArgs) -> Result<()> {
    let config = load_config(args.config_path.as_deref().map(camino::Utf8Path::new))?;

    let (listfile, scope) = tokio::try_join!(Listfile::load(&config.listfile), load_scope(&config))
        .map_err(CliError::from)?;
    let candidates = scope.candidates(listfile.entries());

    println_pad!(
        "{} {}",
        "📂 Root:".bright_blue().bold(),
        config.scope.root.bright_cyan().bold()
    );
    println_pad!(
        "{} {} {}",
        "➕ Explicit includes:".bright_green(),
        scope.sets().includes.len().to_string().bright_white().bold(),
        format!("({} explicit excludes)", scope.sets().excludes.len()).dimmed()
    );

    for entry in &candidates {
        if let Some(id) = entry.id {
            println_pad!("{} {}", format!("{:>10}", id).dimmed(), entry.name);
        }
    }

    println_pad!(
        "{} {} {}",
        "✅".bright_green(),
        candidates.len().to_string().bright_white().bold(),
        format!("of {} entries in scope", listfile.len()).bright_green()
    );

    Ok(())
}
