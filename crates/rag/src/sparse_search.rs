//! Sparse search using Tantivy (BM25)
//!
//! One in-RAM index per collection. The same registered analyzer tokenizes
//! documents at index time and queries at search time, and queries are built
//! from analyzer tokens directly, so no query syntax is ever parsed.

use parking_lot::Mutex;
use tantivy::{
    collector::TopDocs,
    query::{BooleanQuery, Occur, Query, TermQuery},
    schema::{
        Field, IndexRecordOption, OwnedValue, Schema, TextFieldIndexing, TextOptions, STORED,
        STRING,
    },
    tokenizer::{Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, TextAnalyzer, TokenStream},
    Index, IndexReader, IndexWriter, TantivyDocument, Term,
};

use postal_assistant_config::constants::retrieval;
use postal_assistant_core::Document;

use crate::ukrainian::UkrainianStemmer;
use crate::RagError;

const ANALYZER_NAME: &str = "postal";
const WRITER_MEMORY_BYTES: usize = 50_000_000;

/// Sparse search configuration
#[derive(Debug, Clone)]
pub struct SparseConfig {
    /// "ukrainian", or a snowball stemmer language such as "english"
    pub stemmer: Option<String>,
    /// Tokens longer than this are dropped
    pub max_token_length: usize,
}

impl Default for SparseConfig {
    fn default() -> Self {
        Self {
            stemmer: Some(retrieval::STEMMER.to_string()),
            max_token_length: retrieval::MAX_TOKEN_LENGTH,
        }
    }
}

/// BM25 index over one collection
pub struct SparseIndex {
    collection: String,
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    id_field: Field,
    text_field: Field,
    source_field: Field,
}

impl SparseIndex {
    pub fn new(collection: impl Into<String>, config: &SparseConfig) -> Result<Self, RagError> {
        let collection = collection.into();
        let mut schema_builder = Schema::builder();

        let text_options = TextOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer(ANALYZER_NAME)
                    .set_index_option(IndexRecordOption::WithFreqsAndPositions),
            )
            .set_stored();

        let id_field = schema_builder.add_text_field("id", STRING | STORED);
        let text_field = schema_builder.add_text_field("text", text_options);
        let source_field = schema_builder.add_text_field("source", STRING | STORED);
        let schema = schema_builder.build();

        let index = Index::create_in_ram(schema);
        index
            .tokenizers()
            .register(ANALYZER_NAME, build_analyzer(config));

        let reader = index.reader()?;
        let writer = index.writer_with_num_threads(1, WRITER_MEMORY_BYTES)?;

        Ok(Self {
            collection,
            index,
            reader,
            writer: Mutex::new(writer),
            id_field,
            text_field,
            source_field,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Replace the whole index content with `documents`
    pub fn replace_documents(&self, documents: &[Document]) -> Result<(), RagError> {
        let mut writer = self.writer.lock();
        writer.delete_all_documents()?;

        for doc in documents {
            let mut tantivy_doc = TantivyDocument::default();
            tantivy_doc.add_text(self.id_field, &doc.id);
            tantivy_doc.add_text(self.text_field, &doc.content);
            tantivy_doc.add_text(self.source_field, &doc.source);
            writer.add_document(tantivy_doc)?;
        }

        writer.commit()?;
        self.reader.reload()?;

        tracing::debug!(
            collection = %self.collection,
            documents = documents.len(),
            "Sparse index rebuilt"
        );
        Ok(())
    }

    /// Analyzer tokens of `text`, as stored in the index
    pub fn analyze(&self, text: &str) -> Result<Vec<String>, RagError> {
        let mut analyzer = self
            .index
            .tokenizers()
            .get(ANALYZER_NAME)
            .ok_or_else(|| RagError::Index(format!("Analyzer {} not registered", ANALYZER_NAME)))?;

        let mut stream = analyzer.token_stream(text);
        let mut tokens = Vec::new();
        while stream.advance() {
            tokens.push(stream.token().text.clone());
        }
        Ok(tokens)
    }

    /// Top `k` documents by BM25 score
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<Document>, RagError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let tokens = self.analyze(query)?;
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let clauses: Vec<(Occur, Box<dyn Query>)> = tokens
            .iter()
            .map(|token| {
                let term = Term::from_field_text(self.text_field, token);
                let query: Box<dyn Query> =
                    Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
                (Occur::Should, query)
            })
            .collect();
        let query = BooleanQuery::new(clauses);

        let searcher = self.reader.searcher();
        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(k))
            .map_err(|e| RagError::Search(e.to_string()))?;

        let mut results = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| RagError::Search(e.to_string()))?;

            results.push(
                Document::new(
                    stored_text(&doc, self.id_field),
                    stored_text(&doc, self.text_field),
                    self.collection.clone(),
                    stored_text(&doc, self.source_field),
                )
                .with_score(score),
            );
        }

        Ok(results)
    }

    pub fn doc_count(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

fn stored_text(doc: &TantivyDocument, field: Field) -> String {
    doc.get_first(field)
        .and_then(|v| match v {
            OwnedValue::Str(s) => Some(s.as_str()),
            _ => None,
        })
        .unwrap_or_default()
        .to_string()
}

fn build_analyzer(config: &SparseConfig) -> TextAnalyzer {
    let base = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(config.max_token_length))
        .filter(LowerCaser);

    let Some(name) = config.stemmer.as_deref() else {
        return base.build();
    };
    if is_ukrainian(name) {
        return base.filter(UkrainianStemmer).build();
    }
    match stemmer_language(name) {
        Some(language) => base.filter(Stemmer::new(language)).build(),
        None => {
            tracing::warn!(stemmer = name, "Unknown stemmer language, using simple tokenization");
            base.build()
        },
    }
}

fn is_ukrainian(name: &str) -> bool {
    matches!(name.to_lowercase().as_str(), "ukrainian" | "uk")
}

fn stemmer_language(name: &str) -> Option<Language> {
    let language = match name.to_lowercase().as_str() {
        "arabic" => Language::Arabic,
        "danish" => Language::Danish,
        "dutch" => Language::Dutch,
        "english" | "en" => Language::English,
        "finnish" => Language::Finnish,
        "french" => Language::French,
        "german" => Language::German,
        "greek" => Language::Greek,
        "hungarian" => Language::Hungarian,
        "italian" => Language::Italian,
        "norwegian" => Language::Norwegian,
        "portuguese" => Language::Portuguese,
        "romanian" => Language::Romanian,
        "russian" | "ru" => Language::Russian,
        "spanish" => Language::Spanish,
        "swedish" => Language::Swedish,
        "tamil" => Language::Tamil,
        "turkish" => Language::Turkish,
        _ => return None,
    };
    Some(language)
}
