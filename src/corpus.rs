use include_dir::{include_dir, Dir};
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;

static CORPUS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/corpus");

/// Name of the corpus bundled with the binary.
pub const BUILTIN_CORPUS: &str = "paragraphs";

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus file {0} not found")]
    NotFound(String),
    #[error("corpus file {0} is not valid utf-8")]
    NotUtf8(String),
    #[error("unable to deserialize corpus: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("corpus has no paragraphs")]
    Empty,
}

#[derive(Deserialize)]
struct CorpusFile {
    name: String,
    paragraphs: Vec<String>,
}

/// Fixed, ordered list of reference paragraphs. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    pub name: String,
    paragraphs: Vec<String>,
}

impl Corpus {
    pub fn builtin() -> Result<Self, CorpusError> {
        Self::load(BUILTIN_CORPUS)
    }

    pub fn load(name: &str) -> Result<Self, CorpusError> {
        let file_name = format!("{name}.json");
        let file = CORPUS_DIR
            .get_file(&file_name)
            .ok_or_else(|| CorpusError::NotFound(file_name.clone()))?;
        let contents = file
            .contents_utf8()
            .ok_or(CorpusError::NotUtf8(file_name))?;

        Self::from_json(contents)
    }

    pub fn from_json(json: &str) -> Result<Self, CorpusError> {
        let file: CorpusFile = serde_json::from_str(json)?;
        let mut corpus = Self::from_paragraphs(file.paragraphs)?;
        corpus.name = file.name;
        Ok(corpus)
    }

    pub fn from_paragraphs(paragraphs: Vec<String>) -> Result<Self, CorpusError> {
        let paragraphs: Vec<String> = paragraphs
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();

        if paragraphs.is_empty() {
            return Err(CorpusError::Empty);
        }

        Ok(Self {
            name: String::from("custom"),
            paragraphs,
        })
    }

    /// Uniformly random paragraph.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        let idx = rng.gen_range(0..self.paragraphs.len());
        &self.paragraphs[idx]
    }

    pub fn contains(&self, text: &str) -> bool {
        self.paragraphs.iter().any(|p| p == text)
    }

    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }
}
