use ab_glyph::{FontVec, PxScale};
use image::imageops::{self, FilterType};
use image::{Pixel, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::host::HostError;

/// Biblioteca de ações gravadas, agrupadas por conjunto.
///
/// ```toml
/// [sets.PodcastArt."Action 2"]
/// steps = [
///   { op = "place", from = "-bg", x = 0, y = 0, width = 3000, height = 3000 },
///   { op = "place", from = "-art", x = 750, y = 600 },
/// ]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionLibrary {
    #[serde(default)]
    sets: HashMap<String, HashMap<String, Action>>,

    /// Base para caminhos relativos de fontes.
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Cola outro documento aberto, escolhido pelo sufixo do nome.
    Place {
        from: String,
        x: i64,
        y: i64,
        width: Option<u32>,
        height: Option<u32>,
    },
    Fill {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        color: [u8; 4],
    },
    Text {
        text: String,
        font: PathBuf,
        size: f32,
        x: i32,
        y: i32,
        #[serde(default = "default_text_color")]
        color: [u8; 4],
    },
}

fn default_text_color() -> [u8; 4] {
    [255, 255, 255, 255]
}

/// Outro documento aberto que uma ação pode referenciar.
pub struct SourceDocument<'a> {
    /// Nome do arquivo sem extensão, ex: "Guest1-bg".
    pub stem: &'a str,
    pub image: &'a RgbaImage,
}

impl ActionLibrary {
    pub fn from_toml_str(content: &str, base_dir: &Path) -> Result<Self, toml::de::Error> {
        let mut library: ActionLibrary = toml::from_str(content)?;
        library.base_dir = base_dir.to_path_buf();
        Ok(library)
    }

    pub fn find(&self, set_name: &str, action_name: &str) -> Option<&Action> {
        self.sets.get(set_name).and_then(|set| set.get(action_name))
    }

    /// Aplica a ação `set_name > action_name` sobre `canvas`.
    pub fn run(
        &self,
        set_name: &str,
        action_name: &str,
        canvas: &mut RgbaImage,
        sources: &[SourceDocument<'_>],
    ) -> Result<(), HostError> {
        let action = self
            .find(set_name, action_name)
            .ok_or_else(|| HostError::UnknownAction {
                set: set_name.to_string(),
                action: action_name.to_string(),
            })?;

        for (i, step) in action.steps.iter().enumerate() {
            self.apply_step(step, canvas, sources)
                .map_err(|message| HostError::Step { step: i + 1, message })?;
        }
        Ok(())
    }

    fn apply_step(
        &self,
        step: &Step,
        canvas: &mut RgbaImage,
        sources: &[SourceDocument<'_>],
    ) -> Result<(), String> {
        match step {
            Step::Place {
                from,
                x,
                y,
                width,
                height,
            } => {
                let source = find_source(sources, from)?;
                match target_size(source.image, *width, *height) {
                    Some((w, h)) => {
                        let resized = imageops::resize(source.image, w, h, FilterType::Lanczos3);
                        imageops::overlay(canvas, &resized, *x, *y);
                    }
                    None => imageops::overlay(canvas, source.image, *x, *y),
                }
                Ok(())
            }
            Step::Fill {
                x,
                y,
                width,
                height,
                color,
            } => {
                fill_rect(canvas, *x, *y, *width, *height, Rgba(*color));
                Ok(())
            }
            Step::Text {
                text,
                font,
                size,
                x,
                y,
                color,
            } => {
                let font_path = self.base_dir.join(font);
                let font_bytes = std::fs::read(&font_path)
                    .map_err(|e| format!("Fonte não encontrada: {} ({e})", font_path.display()))?;
                let font = FontVec::try_from_vec(font_bytes)
                    .map_err(|_| format!("Fonte inválida: {}", font_path.display()))?;
                draw_text_mut(canvas, Rgba(*color), *x, *y, PxScale::from(*size), &font, text);
                Ok(())
            }
        }
    }
}

fn find_source<'a>(
    sources: &'a [SourceDocument<'a>],
    suffix: &str,
) -> Result<&'a SourceDocument<'a>, String> {
    let mut matches = sources.iter().filter(|s| s.stem.ends_with(suffix));
    match (matches.next(), matches.next()) {
        (Some(found), None) => Ok(found),
        (None, _) => Err(format!("nenhum documento aberto termina com \"{suffix}\"")),
        (Some(_), Some(_)) => Err(format!(
            "mais de um documento aberto termina com \"{suffix}\""
        )),
    }
}

/// Só uma dimensão informada: mantém a proporção.
fn target_size(image: &RgbaImage, width: Option<u32>, height: Option<u32>) -> Option<(u32, u32)> {
    let (w, h) = image.dimensions();
    match (width, height) {
        (Some(tw), Some(th)) => Some((tw, th)),
        (Some(tw), None) if w > 0 => Some((tw, (h as u64 * tw as u64 / w as u64).max(1) as u32)),
        (None, Some(th)) if h > 0 => Some(((w as u64 * th as u64 / h as u64).max(1) as u32, th)),
        _ => None,
    }
}

fn fill_rect(canvas: &mut RgbaImage, x: i64, y: i64, width: u32, height: u32, color: Rgba<u8>) {
    let (cw, ch) = canvas.dimensions();
    let x0 = x.clamp(0, cw as i64) as u32;
    let y0 = y.clamp(0, ch as i64) as u32;
    let x1 = x.saturating_add(width as i64).clamp(0, cw as i64) as u32;
    let y1 = y.saturating_add(height as i64).clamp(0, ch as i64) as u32;

    for py in y0..y1 {
        for px in x0..x1 {
            canvas.get_pixel_mut(px, py).blend(&color);
        }
    }
}
