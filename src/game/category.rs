//! The fixed set of answer categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Nome,
    Animal,
    Cidade,
    Objeto,
    Fruta,
    Cor,
    Profissao,
}

impl Category {
    /// All categories in table order.
    pub const ALL: [Category; 7] = [
        Category::Nome,
        Category::Animal,
        Category::Cidade,
        Category::Objeto,
        Category::Fruta,
        Category::Cor,
        Category::Profissao,
    ];

    /// Wire key, also the input id on the lobby page.
    pub fn key(self) -> &'static str {
        match self {
            Category::Nome => "nome",
            Category::Animal => "animal",
            Category::Cidade => "cidade",
            Category::Objeto => "objeto",
            Category::Fruta => "fruta",
            Category::Cor => "cor",
            Category::Profissao => "profissao",
        }
    }

    /// Heading shown above the input.
    pub fn label(self) -> &'static str {
        match self {
            Category::Nome => "Nome",
            Category::Animal => "Animal",
            Category::Cidade => "Cidade",
            Category::Objeto => "Objeto",
            Category::Fruta => "Fruta",
            Category::Cor => "Cor",
            Category::Profissao => "Profissão",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.key() == s)
            .ok_or_else(|| GameError::UnknownCategory(s.to_string()))
    }
}
