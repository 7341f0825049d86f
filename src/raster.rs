use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader, RgbaImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::actions::{ActionLibrary, SourceDocument};
use crate::host::{DocumentId, ExportFormat, ExportOptions, HostError, HostEditor, ImageCompositor};

struct Document {
    path: PathBuf,
    stem: String,
    image: RgbaImage,
}

/// Editor embutido: documentos são buffers RGBA em memória e as ações vêm
/// de uma [`ActionLibrary`].
pub struct RasterHost {
    library: ActionLibrary,
    documents: HashMap<DocumentId, Document>,
    active: Option<DocumentId>,
    next_id: u32,
}

impl RasterHost {
    pub fn new(library: ActionLibrary) -> Self {
        Self {
            library,
            documents: HashMap::new(),
            active: None,
            next_id: 0,
        }
    }

    pub fn open_count(&self) -> usize {
        self.documents.len()
    }

    pub fn document(&self, doc: DocumentId) -> Option<&RgbaImage> {
        self.documents.get(&doc).map(|d| &d.image)
    }

    fn get(&self, doc: DocumentId) -> Result<&Document, HostError> {
        self.documents.get(&doc).ok_or(HostError::UnknownDocument(doc))
    }
}

impl HostEditor for RasterHost {
    fn open(&mut self, path: &Path) -> Result<DocumentId, HostError> {
        // Formato pelo conteúdo, não pela extensão
        let image = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()?
            .to_rgba8();

        self.next_id += 1;
        let id = DocumentId(self.next_id);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        debug!(
            "{} carregado como {id} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        self.documents.insert(
            id,
            Document {
                path: path.to_path_buf(),
                stem,
                image,
            },
        );
        Ok(id)
    }

    fn set_active(&mut self, doc: DocumentId) -> Result<(), HostError> {
        self.get(doc)?;
        self.active = Some(doc);
        Ok(())
    }

    fn active(&self) -> Option<DocumentId> {
        self.active
    }

    fn export(
        &mut self,
        doc: DocumentId,
        path: &Path,
        options: &ExportOptions,
    ) -> Result<(), HostError> {
        let document = self.get(doc)?;
        match options.format {
            ExportFormat::Jpeg => {
                // JPEG não tem alfa
                let rgb = DynamicImage::ImageRgba8(document.image.clone()).to_rgb8();
                // Codifica em memória: falha no encoder não apaga a capa anterior
                let mut bytes = Vec::new();
                JpegEncoder::new_with_quality(&mut bytes, options.quality).encode_image(&rgb)?;
                std::fs::write(path, &bytes)?;
            }
        }
        debug!("{} exportado para {}", document.path.display(), path.display());
        Ok(())
    }

    fn close(&mut self, doc: DocumentId) -> Result<(), HostError> {
        self.documents
            .remove(&doc)
            .ok_or(HostError::UnknownDocument(doc))?;
        if self.active == Some(doc) {
            self.active = None;
        }
        Ok(())
    }
}

impl ImageCompositor for RasterHost {
    fn apply_named_transform(
        &mut self,
        active: DocumentId,
        set_name: &str,
        action_name: &str,
    ) -> Result<(), HostError> {
        // Retira o alvo do mapa para poder ler os outros documentos ao mesmo tempo
        let mut target = self
            .documents
            .remove(&active)
            .ok_or(HostError::UnknownDocument(active))?;

        let sources: Vec<SourceDocument<'_>> = self
            .documents
            .values()
            .map(|d| SourceDocument {
                stem: &d.stem,
                image: &d.image,
            })
            .collect();
        let result = self
            .library
            .run(set_name, action_name, &mut target.image, &sources);

        self.documents.insert(active, target);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn write_png(dir: &Path, name: &str, color: [u8; 4]) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(8, 8, Rgba(color)).save(&path).unwrap();
        path
    }

    fn library() -> ActionLibrary {
        ActionLibrary::from_toml_str(
            r#"
[sets.PodcastArt."Action 2"]
steps = [{ op = "place", from = "-art", x = 0, y = 0 }]
"#,
            Path::new("."),
        )
        .unwrap()
    }

    #[test]
    fn test_open_sniffs_content() {
        let dir = tempfile::tempdir().unwrap();
        // PNG salvo com extensão .psd
        let png = write_png(dir.path(), "t.png", [10, 20, 30, 255]);
        let psd = dir.path().join("UCCoverTemplate.psd");
        std::fs::rename(&png, &psd).unwrap();

        let mut host = RasterHost::new(ActionLibrary::default());
        let id = host.open(&psd).unwrap();
        assert_eq!(*host.document(id).unwrap().get_pixel(0, 0), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_open_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x-bg.jpg");
        std::fs::write(&path, b"not an image").unwrap();

        let mut host = RasterHost::new(ActionLibrary::default());
        assert!(host.open(&path).is_err());
        assert_eq!(host.open_count(), 0);
    }

    #[test]
    fn test_transform_then_export_leaves_inputs_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let template = write_png(dir.path(), "template.png", [0, 0, 0, 255]);
        let art = write_png(dir.path(), "g-art.png", [255, 255, 255, 255]);
        let before = std::fs::read(&template).unwrap();

        let mut host = RasterHost::new(library());
        let t = host.open(&template).unwrap();
        let a = host.open(&art).unwrap();
        host.set_active(t).unwrap();
        host.apply_named_transform(t, "PodcastArt", "Action 2").unwrap();
        assert_eq!(*host.document(t).unwrap().get_pixel(4, 4), Rgba([255, 255, 255, 255]));

        let out = dir.path().join("cover.jpg");
        host.export(t, &out, &ExportOptions::maximum()).unwrap();
        host.close(t).unwrap();
        host.close(a).unwrap();

        let exported = image::open(&out).unwrap();
        assert_eq!(exported.width(), 8);
        assert_eq!(std::fs::read(&template).unwrap(), before);
        assert_eq!(host.open_count(), 0);
        assert_eq!(host.active(), None);
    }

    #[test]
    fn test_unknown_documents() {
        let mut host = RasterHost::new(library());
        let ghost = DocumentId(42);
        assert!(matches!(host.set_active(ghost), Err(HostError::UnknownDocument(_))));
        assert!(matches!(host.close(ghost), Err(HostError::UnknownDocument(_))));
        assert!(matches!(
            host.apply_named_transform(ghost, "PodcastArt", "Action 2"),
            Err(HostError::UnknownDocument(_))
        ));
    }

    #[test]
    fn test_failed_transform_keeps_document_open() {
        let dir = tempfile::tempdir().unwrap();
        let template = write_png(dir.path(), "template.png", [0, 0, 0, 255]);

        let mut host = RasterHost::new(library());
        let t = host.open(&template).unwrap();
        assert!(host.apply_named_transform(t, "PodcastArt", "Action 9").is_err());
        assert!(host.document(t).is_some());
    }
}
