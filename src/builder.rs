use std::path::Path;
use tracing::{error, info};

use crate::config::CoverConfig;
use crate::error::CoverError;
use crate::host::{DocumentId, DocumentSession, ExportOptions, HostEditor, HostError, ImageCompositor};
use crate::paths::{CoverPaths, CoverRoots, GuestId};

/// Parâmetros fixos de uma execução.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub roots: CoverRoots,
    pub template_file: String,
    pub action_set: String,
    pub action_name: String,
}

impl BuildSettings {
    pub fn from_config(config: &CoverConfig) -> Self {
        Self {
            roots: config.roots(),
            template_file: config.template_file.clone(),
            action_set: config.action_set.clone(),
            action_name: config.action_name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoverReport {
    pub guest: GuestId,
    pub paths: CoverPaths,
}

/// Monta a capa de um convidado: abre template, fundo e arte, roda a ação
/// gravada sobre o template e exporta o JPEG final.
pub struct CoverBuilder<H> {
    host: H,
    settings: BuildSettings,
}

impl<H: HostEditor + ImageCompositor> CoverBuilder<H> {
    pub fn new(host: H, settings: BuildSettings) -> Self {
        Self { host, settings }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Erros são registrados no log e devolvidos ao chamador.
    pub fn build(&mut self, guest: Option<&str>) -> Result<CoverReport, CoverError> {
        let result = self.run(guest);
        if let Err(e) = &result {
            error!("Erro: {e}");
        }
        result
    }

    fn run(&mut self, guest: Option<&str>) -> Result<CoverReport, CoverError> {
        let settings = &self.settings;

        // 1. Validar argumento
        let guest = GuestId::parse(guest)?;

        // 2. Resolver caminhos
        let paths = CoverPaths::resolve(&settings.roots, &settings.template_file, &guest);

        // 3. Verificar entradas antes de abrir qualquer uma
        for (_, path) in paths.inputs() {
            if !path.exists() {
                return Err(CoverError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
        }

        // 4. Abrir documentos (fechados ao sair de escopo em qualquer caminho)
        let mut session = DocumentSession::new(&mut self.host);
        let mut opened = Vec::with_capacity(3);
        for (role, path) in paths.inputs() {
            info!("Abrindo {}...", role.label());
            opened.push(open_document(&mut session, path)?);
        }
        // Template é sempre a primeira entrada
        let template = opened[0];

        // 5. Template como documento ativo
        let (set, action) = (&settings.action_set, &settings.action_name);
        let action_failed = |source: HostError| CoverError::ActionFailed {
            set: set.clone(),
            action: action.clone(),
            source,
        };
        session.host().set_active(template).map_err(action_failed)?;
        let active = active_document(session.host()).map_err(action_failed)?;

        // 6. Ação gravada
        info!("Executando ação: {set} > {action}");
        session
            .host()
            .apply_named_transform(active, set, action)
            .map_err(action_failed)?;

        // 7. Exportar
        info!("Exportando capa final...");
        session
            .host()
            .export(active, &paths.output, &ExportOptions::maximum())
            .map_err(|source| CoverError::ExportFailed {
                path: paths.output.clone(),
                source,
            })?;

        // 8. Fechar sem salvar
        session.close_all();
        drop(session);

        info!("Capa exportada com sucesso: {}", paths.output.display());
        Ok(CoverReport { guest, paths })
    }
}

fn open_document<H: HostEditor>(
    session: &mut DocumentSession<'_, H>,
    path: &Path,
) -> Result<DocumentId, CoverError> {
    session.open(path).map_err(|source| CoverError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })
}

fn active_document<H: HostEditor>(host: &H) -> Result<DocumentId, HostError> {
    host.active().ok_or(HostError::NoActiveDocument)
}
