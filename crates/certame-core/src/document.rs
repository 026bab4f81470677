//! Uploaded procurement documents and the text extracted from them.

/// Largest upload accepted by the pipeline (50 MiB).
pub const MAX_DOCUMENT_BYTES: usize = 50 * 1024 * 1024;

/// A document as received from the presentation layer.
///
/// Immutable once constructed; the pipeline never persists it beyond the
/// request that received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    bytes: Vec<u8>,
    media_type: String,
}

impl Document {
    pub fn new(bytes: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Declared media type, exactly as supplied by the caller.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Media type lowercased with any parameters (`; charset=...`) removed.
    pub fn essence(&self) -> String {
        self.media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    pub fn is_pdf(&self) -> bool {
        self.essence() == "application/pdf"
    }
}

/// The part a document plays in an analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentRole {
    /// Tender notice (edital).
    Notice,
    /// Winning bid (proposta vencedora).
    Bid,
}

impl DocumentRole {
    /// Minimum trimmed character count before a model call is worth making.
    pub fn min_chars(&self) -> usize {
        match self {
            Self::Notice => 100,
            Self::Bid => 50,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notice => "edital",
            Self::Bid => "proposta",
        }
    }

    /// Portuguese noun phrase with article, used in user-facing messages.
    pub fn with_article(&self) -> &'static str {
        match self {
            Self::Notice => "do edital",
            Self::Bid => "da proposta",
        }
    }
}

impl std::fmt::Display for DocumentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plain text recovered from a [`Document`].
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub content: String,
    pub source: Document,
}

impl ExtractedText {
    /// Character count after trimming surrounding whitespace.
    pub fn trimmed_chars(&self) -> usize {
        self.content.trim().chars().count()
    }

    /// Whether the trimmed text meets the minimum for `role`.
    pub fn is_sufficient_for(&self, role: DocumentRole) -> bool {
        self.trimmed_chars() >= role.min_chars()
    }
}
