use std::path::PathBuf;

use crate::host::HostError;

/// Falhas de uma execução do gerador de capa. Todas são fatais.
#[derive(Debug, thiserror::Error)]
pub enum CoverError {
    #[error("Nome do convidado não informado. Uso: covergen <convidado>")]
    MissingArgument,

    #[error("Arquivo não encontrado: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Não foi possível abrir {}: {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: HostError,
    },

    #[error("Falha na ação {set} > {action}: {source}")]
    ActionFailed {
        set: String,
        action: String,
        #[source]
        source: HostError,
    },

    #[error("Falha ao exportar capa para {}: {source}", path.display())]
    ExportFailed {
        path: PathBuf,
        #[source]
        source: HostError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found_names_the_path() {
        let err = CoverError::FileNotFound {
            path: PathBuf::from("/capas/Guest1-bg.jpg"),
        };
        assert!(err.to_string().contains("/capas/Guest1-bg.jpg"));
    }

    #[test]
    fn action_failed_keeps_source() {
        let err = CoverError::ActionFailed {
            set: "PodcastArt".to_string(),
            action: "Action 2".to_string(),
            source: HostError::UnknownAction {
                set: "PodcastArt".to_string(),
                action: "Action 2".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("PodcastArt > Action 2"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
