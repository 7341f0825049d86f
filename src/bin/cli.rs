use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, Level};

use covergen_lib::{config, paths, raster, BuildSettings, CoverBuilder, CoverError};

#[derive(Parser)]
#[command(name = "covergen", about = "Automação de capa de podcast: template + fundo + arte → JPEG")]
struct Cli {
    /// Nome do convidado, usado nos nomes de arquivo (<convidado>-bg.jpg, ...)
    guest: Option<String>,

    /// Diretório com template, fundos e artes (sobrescreve covergen.toml)
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// Diretório das capas finalizadas (sobrescreve covergen.toml)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Diretório de configuração (default: ./config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verificar configuração, biblioteca de ações e template
    #[arg(long)]
    check: bool,

    /// Log detalhado
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .without_time()
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !already_reported(&e) {
                error!("Erro: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Erros do gerador já saem no log no ponto em que acontecem.
fn already_reported(err: &anyhow::Error) -> bool {
    err.downcast_ref::<CoverError>().is_some()
}

fn run(cli: Cli) -> Result<()> {
    let config_dir = cli.config.clone().unwrap_or_else(|| {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));
        covergen_lib::find_config_dir(&exe_dir)
    });

    let mut cover_config = config::load_config(&config_dir)?;
    if let Some(assets) = cli.assets {
        cover_config.assets_root = assets;
    }
    if let Some(output) = cli.output {
        cover_config.output_root = output;
    }

    if cli.check {
        return check_setup(&config_dir, &cover_config);
    }

    build_cover(cli.guest.as_deref(), &config_dir, &cover_config)
}

fn build_cover(
    guest: Option<&str>,
    config_dir: &Path,
    cover_config: &config::CoverConfig,
) -> Result<()> {
    // Argumento é validado antes de qualquer acesso a disco
    let guest = match paths::GuestId::parse(guest) {
        Ok(guest) => guest,
        Err(e) => {
            error!("Erro: {e}");
            return Err(e.into());
        }
    };

    let library = config::load_action_library(&config_dir.join(&cover_config.actions_file))?;

    std::fs::create_dir_all(&cover_config.output_root).with_context(|| {
        format!(
            "Não foi possível criar diretório: {}",
            cover_config.output_root.display()
        )
    })?;

    let host = raster::RasterHost::new(library);
    let mut builder = CoverBuilder::new(host, BuildSettings::from_config(cover_config));
    let report = builder.build(Some(guest.as_str()))?;

    println!("{}", report.paths.output.display());
    Ok(())
}

fn check_setup(config_dir: &Path, cover_config: &config::CoverConfig) -> Result<()> {
    let mut problems = Vec::new();

    println!("Configuração: {}", config_dir.display());
    println!("  Assets: {}", cover_config.assets_root.display());
    println!("  Saída: {}", cover_config.output_root.display());

    let actions_path = config_dir.join(&cover_config.actions_file);
    match config::load_action_library(&actions_path) {
        Ok(library) => {
            match library.find(&cover_config.action_set, &cover_config.action_name) {
                Some(action) => println!(
                    "  Ação: {} > {} ({} etapas)",
                    cover_config.action_set,
                    cover_config.action_name,
                    action.steps.len()
                ),
                None => problems.push(format!(
                    "Ação {} > {} não existe em {}",
                    cover_config.action_set,
                    cover_config.action_name,
                    actions_path.display()
                )),
            }
        }
        Err(e) => problems.push(format!("{e:#}")),
    }

    let template = cover_config.assets_root.join(&cover_config.template_file);
    if template.exists() {
        println!(
            "  {}: {}",
            paths::InputRole::Template.label(),
            template.display()
        );
    } else {
        problems.push(format!("Arquivo não encontrado: {}", template.display()));
    }

    if problems.is_empty() {
        println!("Tudo pronto.");
        return Ok(());
    }

    for problem in &problems {
        eprintln!("ERRO: {problem}");
    }
    bail!("{} problema(s) na configuração", problems.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_errors_are_reported_once() {
        let err = anyhow::Error::from(CoverError::MissingArgument);
        assert!(already_reported(&err));

        let err = anyhow::Error::from(CoverError::FileNotFound {
            path: PathBuf::from("Guest1-bg.jpg"),
        });
        assert!(already_reported(&err));
    }

    #[test]
    fn test_config_errors_are_reported_here() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(config::CONFIG_FILE), "assets_root = [").unwrap();
        let err = config::load_config(dir.path()).unwrap_err();
        assert!(!already_reported(&err));
    }
}
