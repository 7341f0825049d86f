//! Interface com o editor de imagens hospedeiro.
//!
//! O editor é um serviço injetado: o gerador só abre, ativa, exporta e fecha
//! documentos através de [`HostEditor`], e delega a ação gravada a
//! [`ImageCompositor`].

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

/// Handle de um documento carregado na memória do editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(pub u32);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Qualidade JPEG máxima aceita pelo encoder.
pub const MAX_JPEG_QUALITY: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Jpeg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub quality: u8,
}

impl ExportOptions {
    /// JPEG na qualidade máxima. Única configuração usada pelo gerador.
    pub fn maximum() -> Self {
        Self {
            format: ExportFormat::Jpeg,
            quality: MAX_JPEG_QUALITY,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("documento desconhecido: {0}")]
    UnknownDocument(DocumentId),

    #[error("nenhum documento ativo")]
    NoActiveDocument,

    #[error("ação não encontrada: {set} > {action}")]
    UnknownAction { set: String, action: String },

    #[error("etapa {step} da ação falhou: {message}")]
    Step { step: usize, message: String },

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub trait HostEditor {
    /// Carrega o arquivo como documento editável.
    fn open(&mut self, path: &Path) -> Result<DocumentId, HostError>;

    fn set_active(&mut self, doc: DocumentId) -> Result<(), HostError>;

    fn active(&self) -> Option<DocumentId>;

    /// Grava o documento em `path`, sobrescrevendo sem perguntar.
    fn export(&mut self, doc: DocumentId, path: &Path, options: &ExportOptions)
        -> Result<(), HostError>;

    /// Fecha descartando edições. Nunca grava no arquivo original.
    fn close(&mut self, doc: DocumentId) -> Result<(), HostError>;
}

pub trait ImageCompositor {
    /// Executa a ação gravada `set_name > action_name` sobre o documento ativo.
    fn apply_named_transform(
        &mut self,
        active: DocumentId,
        set_name: &str,
        action_name: &str,
    ) -> Result<(), HostError>;
}

/// Documentos abertos durante uma execução.
///
/// Tudo que é aberto pela sessão é fechado (sem salvar) quando ela sai de
/// escopo, inclusive nos caminhos de erro. Falhas ao fechar só geram aviso.
pub struct DocumentSession<'h, H: HostEditor> {
    host: &'h mut H,
    open: Vec<(DocumentId, PathBuf)>,
}

impl<'h, H: HostEditor> DocumentSession<'h, H> {
    pub fn new(host: &'h mut H) -> Self {
        Self {
            host,
            open: Vec::new(),
        }
    }

    pub fn open(&mut self, path: &Path) -> Result<DocumentId, HostError> {
        let id = self.host.open(path)?;
        debug!("Documento {id} aberto: {}", path.display());
        self.open.push((id, path.to_path_buf()));
        Ok(id)
    }

    pub fn host(&mut self) -> &mut H {
        &mut *self.host
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Fecha tudo agora (caminho de sucesso).
    pub fn close_all(&mut self) {
        info!("Fechando documentos...");
        self.release();
    }

    fn release(&mut self) {
        // Ordem inversa da abertura
        while let Some((id, path)) = self.open.pop() {
            if let Err(e) = self.host.close(id) {
                warn!("Falha ao fechar {}: {e}", path.display());
            }
        }
    }
}

impl<H: HostEditor> Drop for DocumentSession<'_, H> {
    fn drop(&mut self) {
        if !self.open.is_empty() {
            debug!("Liberando {} documento(s) após falha", self.open.len());
            self.release();
        }
    }
}
