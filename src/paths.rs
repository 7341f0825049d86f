use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::CoverError;

/// Identificador do convidado, usado literalmente nos nomes de arquivo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestId(String);

impl GuestId {
    /// Vazio ou só espaços conta como ausente.
    pub fn parse(raw: Option<&str>) -> Result<Self, CoverError> {
        match raw {
            Some(s) if !s.trim().is_empty() => Ok(Self(s.to_string())),
            _ => Err(CoverError::MissingArgument),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Diretórios raiz injetados pela configuração.
#[derive(Debug, Clone)]
pub struct CoverRoots {
    pub assets: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRole {
    Template,
    Background,
    Art,
}

impl InputRole {
    pub fn label(self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Background => "fundo",
            Self::Art => "arte",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverPaths {
    pub template: PathBuf,
    pub background: PathBuf,
    pub art: PathBuf,
    pub output: PathBuf,
}

impl CoverPaths {
    pub fn resolve(roots: &CoverRoots, template_file: &str, guest: &GuestId) -> Self {
        let id = guest.as_str();
        Self {
            template: roots.assets.join(template_file),
            background: roots.assets.join(format!("{id}-bg.jpg")),
            art: roots.assets.join(format!("{id}-art.jpg")),
            output: roots.output.join(format!("{id}-cover.jpg")),
        }
    }

    /// Entradas na ordem em que são verificadas e abertas.
    pub fn inputs(&self) -> [(InputRole, &Path); 3] {
        [
            (InputRole::Template, self.template.as_path()),
            (InputRole::Background, self.background.as_path()),
            (InputRole::Art, self.art.as_path()),
        ]
    }
}
