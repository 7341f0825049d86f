use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::actions::ActionLibrary;
use crate::paths::CoverRoots;

pub const CONFIG_FILE: &str = "covergen.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoverConfig {
    pub assets_root: PathBuf,
    pub output_root: PathBuf,
    pub template_file: String,
    pub action_set: String,
    pub action_name: String,
    /// Relativo ao diretório de configuração.
    pub actions_file: PathBuf,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from("assets"),
            output_root: PathBuf::from("output"),
            template_file: "UCCoverTemplate.psd".to_string(),
            action_set: "PodcastArt".to_string(),
            action_name: "Action 2".to_string(),
            actions_file: PathBuf::from("actions.toml"),
        }
    }
}

impl CoverConfig {
    pub fn roots(&self) -> CoverRoots {
        CoverRoots {
            assets: self.assets_root.clone(),
            output: self.output_root.clone(),
        }
    }
}

/// Lê `covergen.toml`. Arquivo ausente = valores padrão.
pub fn load_config(config_dir: &Path) -> Result<CoverConfig> {
    let path = config_dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(CoverConfig::default());
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Não foi possível ler {}", path.display()))?;
    let config: CoverConfig =
        toml::from_str(&content).with_context(|| format!("Erro ao parsear {}", path.display()))?;
    Ok(config)
}

/// Carrega a biblioteca de ações. Fontes relativas são resolvidas a partir
/// do diretório do próprio arquivo.
pub fn load_action_library(path: &Path) -> Result<ActionLibrary> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Não foi possível ler {}", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    ActionLibrary::from_toml_str(&content, base_dir)
        .map_err(|e| anyhow::anyhow!("Erro ao parsear {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.template_file, "UCCoverTemplate.psd");
        assert_eq!(config.action_set, "PodcastArt");
        assert_eq!(config.action_name, "Action 2");
        assert_eq!(config.output_root, PathBuf::from("output"));
    }

    #[test]
    fn test_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "assets_root = \"/capas/Assets\"\naction_name = \"Action 3\"\n",
        )
        .unwrap();

        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.assets_root, PathBuf::from("/capas/Assets"));
        assert_eq!(config.action_name, "Action 3");
        assert_eq!(config.action_set, "PodcastArt");
        assert_eq!(config.roots().output, PathBuf::from("output"));
    }

    #[test]
    fn test_invalid_config_names_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "assets_root = [").unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains(CONFIG_FILE));
    }

    #[test]
    fn test_load_action_library() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actions.toml");
        std::fs::write(
            &path,
            "[sets.PodcastArt.\"Action 2\"]\nsteps = [{ op = \"place\", from = \"-bg\", x = 0, y = 0 }]\n",
        )
        .unwrap();

        let library = load_action_library(&path).unwrap();
        assert!(library.find("PodcastArt", "Action 2").is_some());
        assert!(load_action_library(&dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn test_fonts_resolved_from_actions_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("config");
        std::fs::create_dir_all(config_dir.join("fonts")).unwrap();
        std::fs::write(
            config_dir.join("fonts/Title.ttf"),
            include_bytes!("../tests/fixtures/fonts/DejaVuSansMono-Bold.ttf"),
        )
        .unwrap();
        let path = config_dir.join("actions.toml");
        std::fs::write(
            &path,
            "[sets.Capa.Titulo]\nsteps = [{ op = \"text\", text = \"UC\", font = \"fonts/Title.ttf\", size = 24.0, x = 2, y = 2 }]\n",
        )
        .unwrap();

        let library = load_action_library(&path).unwrap();
        let mut canvas = image::RgbaImage::from_pixel(64, 32, image::Rgba([0, 0, 0, 255]));
        library.run("Capa", "Titulo", &mut canvas, &[]).unwrap();
        assert!(canvas.pixels().any(|p| p.0 != [0, 0, 0, 255]));
    }
}
