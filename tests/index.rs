use std::sync::Arc;

use elias_index::{
    analysis::{Analyzer, FnAnalyzer, Tokenizer},
    base::DocId,
    builder::IndexBuilder,
    compress::{decode_postings, CompressionMode},
    document::Document,
    error::{AnalysisError, CodecError, IndexError},
    index::{IndexOptions, InvertedIndex, ReinsertPolicy, SearchPolicy},
};
use helpers::{
    documents::whitespace_analyzer,
    index::{check_corpus, check_same_index, TestCorpus},
};
use log::info;
use ntest::{assert_about_eq, timeout};
use rstest::rstest;
use temp_dir::TempDir;

/// Initialize the logger
fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ids(results: &[&Document]) -> Vec<DocId> {
    results.iter().map(|document| document.id).collect()
}

fn pets(mode: CompressionMode) -> InvertedIndex {
    let mut index = InvertedIndex::with_mode(mode);
    for (id, text) in [
        (1, "cat sits on mat"),
        (2, "dog barks"),
        (3, "cat and dog are friends"),
    ] {
        index
            .add_document(Document::new(id, text))
            .expect("could not add document");
    }
    index
}

/// Fails whenever the text contains "boom"
fn failing_analyzer() -> Arc<dyn Analyzer> {
    Arc::new(FnAnalyzer(|text: &str| {
        if text.contains("boom") {
            Err(AnalysisError("boom".to_string()))
        } else {
            Ok(text.split_whitespace().map(str::to_string).collect())
        }
    }))
}

#[rstest]
fn test_conjunctive_search(
    #[values(CompressionMode::None, CompressionMode::Gamma, CompressionMode::Delta)]
    mode: CompressionMode,
) {
    init_logger();
    let index = pets(mode);

    assert_eq!(index.len(), 3);
    assert_eq!(index.mode(), mode);
    assert_eq!(ids(&index.search("cat dog").unwrap()), vec![3]);
    assert_eq!(ids(&index.search("cat").unwrap()), vec![1, 3]);
    assert_eq!(ids(&index.search("dog").unwrap()), vec![2, 3]);
    assert_eq!(ids(&index.search("CAT, Dog!").unwrap()), vec![3]);

    assert!(index.search("bird").unwrap().is_empty());
    assert!(index.search("cat bird").unwrap().is_empty());
    assert!(index.search("").unwrap().is_empty());
    // Only stop words
    assert!(index.search("and are the").unwrap().is_empty());
}

#[rstest]
fn test_ranking(
    #[values(CompressionMode::None, CompressionMode::Gamma, CompressionMode::Delta)]
    mode: CompressionMode,
) {
    let mut index = InvertedIndex::with_mode(mode);
    index.add_document(Document::new(3, "cat")).unwrap();
    index.add_document(Document::new(2, "cat cat dog")).unwrap();
    index.add_document(Document::new(1, "cat cat cat")).unwrap();
    index.add_document(Document::new(0, "dog")).unwrap();

    assert_eq!(ids(&index.search("cat").unwrap()), vec![1, 2, 3]);

    let scored = index.search_scored("cat").unwrap();
    let scores: Vec<(DocId, u64)> = scored.iter().map(|s| (s.doc_id, s.score)).collect();
    assert_eq!(scores, vec![(1, 3), (2, 2), (3, 1)]);

    // Each query term contributes, including repeated ones
    let scored = index.search_scored("dog cat cat").unwrap();
    let scores: Vec<(DocId, u64)> = scored.iter().map(|s| (s.doc_id, s.score)).collect();
    assert_eq!(scores, vec![(2, 5)]);

    // Document 0 is a regular document
    assert_eq!(ids(&index.search("dog").unwrap()), vec![0, 2]);
}

#[rstest]
fn test_reference_corpora(
    #[values(CompressionMode::None, CompressionMode::Gamma, CompressionMode::Delta)]
    mode: CompressionMode,
) {
    let mut index = InvertedIndex::with_mode(mode);
    for (id, text) in [
        (1, "cat sits on mat"),
        (2, "dog walks in park"),
        (3, "cat and dog are friends"),
    ] {
        index.add_document(Document::new(id, text)).unwrap();
    }
    assert_eq!(ids(&index.search("cat dog").unwrap()), vec![3]);
    assert_eq!(ids(&index.search("cat").unwrap()), vec![1, 3]);
    assert!(index.search("bird").unwrap().is_empty());
    assert!(index.search("").unwrap().is_empty());

    let mut index = InvertedIndex::with_mode(mode);
    for (id, text) in [(1, "cat cat cat"), (2, "cat cat"), (3, "cat")] {
        index.add_document(Document::new(id, text)).unwrap();
    }
    assert_eq!(ids(&index.search("cat").unwrap()), vec![1, 2, 3]);
}

#[test]
fn test_ties_by_increasing_id() {
    let mut index = InvertedIndex::with_mode(CompressionMode::Delta);
    for id in [40, 7, 1000, 8] {
        index
            .add_document(Document::new(id, "zebra stripes"))
            .unwrap();
    }
    assert_eq!(ids(&index.search("zebra").unwrap()), vec![7, 8, 40, 1000]);
}

#[test]
fn test_russian_text() {
    let mut index = InvertedIndex::with_mode(CompressionMode::Gamma);
    index
        .add_document(Document::new(1, "Кошка сидит на окне"))
        .unwrap();
    index.add_document(Document::new(2, "Собака лает")).unwrap();
    index
        .add_document(Document::new(3, "Кошки и собаки дружат"))
        .unwrap();

    assert_eq!(ids(&index.search("КОШКА").unwrap()), vec![1, 3]);
    assert_eq!(ids(&index.search("кошка собака").unwrap()), vec![3]);
}

#[test]
fn test_append_on_reinsert() {
    init_logger();
    let mut index = InvertedIndex::with_mode(CompressionMode::Gamma);
    index.add_document(Document::new(1, "cat mat")).unwrap();
    index.add_document(Document::new(1, "cat dog")).unwrap();

    assert_eq!(index.len(), 1);
    assert_eq!(index.document(1).unwrap().text, "cat dog");
    assert_eq!(ids(&index.search("dog").unwrap()), vec![1]);

    // Postings of the previous text are kept
    assert_eq!(ids(&index.search("mat").unwrap()), vec![1]);
    assert_eq!(index.term_frequency("cat", 1), 2);
    assert_eq!(index.doc_ids("cat").unwrap(), vec![1]);
}

#[test]
fn test_replace_on_reinsert() {
    let options = IndexOptions {
        reinsert_policy: ReinsertPolicy::Replace,
        ..Default::default()
    };
    let mut index = InvertedIndex::new(options, Arc::new(Tokenizer::default()));
    index.add_document(Document::new(1, "cat mat")).unwrap();
    index.add_document(Document::new(2, "mat dog")).unwrap();
    index.add_document(Document::new(1, "cat dog")).unwrap();

    assert_eq!(index.len(), 2);
    assert_eq!(ids(&index.search("mat").unwrap()), vec![2]);
    assert_eq!(ids(&index.search("dog").unwrap()), vec![1, 2]);
    assert_eq!(index.term_frequency("cat", 1), 1);
    assert_eq!(index.term_frequency("mat", 1), 0);

    index.add_document(Document::new(2, "bird")).unwrap();
    assert!(index.postings("mat").is_none());
    assert_eq!(index.num_terms(), 3);
}

#[rstest]
fn test_remove_document(
    #[values(CompressionMode::None, CompressionMode::Gamma, CompressionMode::Delta)]
    mode: CompressionMode,
) {
    let mut index = pets(mode);

    let removed = index.remove_document(3).unwrap();
    assert_eq!(removed.map(|document| document.id), Some(3));
    assert!(index.remove_document(3).unwrap().is_none());

    assert_eq!(index.len(), 2);
    assert!(index.search("cat dog").unwrap().is_empty());
    assert_eq!(ids(&index.search("cat").unwrap()), vec![1]);
    assert!(index.postings("friends").is_none());
    assert_eq!(index.term_frequency("cat", 3), 0);
}

#[test]
fn test_failed_analysis_leaves_index_unchanged() {
    init_logger();
    let mut index = InvertedIndex::new(IndexOptions::default(), failing_analyzer());
    index.add_document(Document::new(1, "a b")).unwrap();
    let before = index.layout().clone();

    let error = index
        .add_document(Document::new(2, "a boom"))
        .expect_err("analysis should fail");
    match error {
        IndexError::Indexation { doc_id, source } => {
            assert_eq!(doc_id, 2);
            assert!(matches!(*source, IndexError::Analysis(_)));
        }
        other => panic!("unexpected error {}", other),
    }

    assert_eq!(index.len(), 1);
    assert!(index.document(2).is_none());
    assert_eq!(index.layout().postings, before.postings);
    assert_eq!(index.layout().term_frequencies, before.term_frequencies);
}

#[test]
fn test_failed_encoding_leaves_index_unchanged() {
    let mut index = InvertedIndex::with_mode(CompressionMode::Gamma);
    index.add_document(Document::new(1, "cat dog")).unwrap();
    let before = index.layout().clone();

    // The first gap of a postings list is the ID plus one
    let error = index
        .add_document(Document::new(DocId::MAX, "cat bird"))
        .expect_err("encoding should fail");
    match error {
        IndexError::Indexation { doc_id, source } => {
            assert_eq!(doc_id, DocId::MAX);
            assert!(matches!(
                *source,
                IndexError::Encode {
                    source: CodecError::Overflow,
                    ..
                }
            ));
        }
        other => panic!("unexpected error {}", other),
    }

    assert!(index.document(DocId::MAX).is_none());
    assert_eq!(index.layout().postings, before.postings);
    assert_eq!(index.layout().term_frequencies, before.term_frequencies);

    // Raw IDs have no such limit
    let mut index = InvertedIndex::with_mode(CompressionMode::None);
    index
        .add_document(Document::new(DocId::MAX, "cat bird"))
        .unwrap();
    assert_eq!(ids(&index.search("bird").unwrap()), vec![DocId::MAX]);
}

#[test]
fn test_search_policies() {
    init_logger();
    let mut layout = pets(CompressionMode::None).into_layout();
    layout.postings.insert("cat".to_string(), vec![0, 0, 0]);

    let lenient = InvertedIndex::from_layout(layout.clone(), Arc::new(Tokenizer::default()));
    assert!(lenient.search("cat").unwrap().is_empty());
    assert_eq!(ids(&lenient.search("dog").unwrap()), vec![2, 3]);

    layout.options.search_policy = SearchPolicy::Strict;
    let strict = InvertedIndex::from_layout(layout, Arc::new(Tokenizer::default()));
    match strict.search("cat dog") {
        Err(IndexError::Decode { term, source }) => {
            assert_eq!(term, "cat");
            assert!(matches!(source, CodecError::Truncated { bits: 24 }));
        }
        Err(other) => panic!("unexpected error {}", other),
        Ok(_) => panic!("search should fail"),
    }
    assert_eq!(ids(&strict.search("dog").unwrap()), vec![2, 3]);
}

#[test]
fn test_missing_document() {
    let mut layout = pets(CompressionMode::Delta).into_layout();
    layout.documents.remove(&3);

    let lenient = InvertedIndex::from_layout(layout.clone(), Arc::new(Tokenizer::default()));
    assert!(lenient.search("cat dog").unwrap().is_empty());

    layout.options.search_policy = SearchPolicy::Strict;
    let strict = InvertedIndex::from_layout(layout, Arc::new(Tokenizer::default()));
    assert!(matches!(
        strict.search("cat dog"),
        Err(IndexError::MissingDocument(3))
    ));
}

#[test]
fn test_failed_query_analysis() {
    let options = IndexOptions {
        search_policy: SearchPolicy::Strict,
        ..Default::default()
    };
    let mut index = InvertedIndex::new(options, failing_analyzer());
    index.add_document(Document::new(1, "a b")).unwrap();

    assert!(matches!(
        index.search("a boom"),
        Err(IndexError::Analysis(_))
    ));
    assert_eq!(ids(&index.search("a b").unwrap()), vec![1]);
}

#[test]
#[timeout(60000)]
fn test_builder_matches_incremental() {
    init_logger();
    let corpus = TestCorpus::new(100, 500, 5., 20, 10, Some(7));
    info!(
        "Corpus of {} documents, {} terms",
        corpus.documents.len(),
        corpus.postings.len()
    );

    for mode in CompressionMode::ALL {
        let options = IndexOptions::with_compression(mode);
        let mut builder = IndexBuilder::new(options, whitespace_analyzer());
        let mut index = InvertedIndex::new(options, whitespace_analyzer());
        for document in corpus.documents.iter() {
            builder.add_document(document.clone()).unwrap();
            index.add_document(document.clone()).unwrap();
        }
        assert_eq!(builder.len(), corpus.documents.len());
        let sealed = builder.build().unwrap();

        check_corpus(&corpus, &index);
        check_corpus(&corpus, &sealed);
        check_same_index(&index, &sealed);

        for terms in [vec!["w1"], vec!["w2", "w3"], vec!["w5", "w5", "w8"]] {
            let observed = index.search_scored(&terms.join(" ")).unwrap();
            assert_eq!(observed, corpus.search(&terms), "query {:?}", terms);
            assert_eq!(observed, sealed.search_scored(&terms.join(" ")).unwrap());
        }
    }
}

/// Checks that adding document `DocId::MAX` failed on the term "bird"
fn assert_unencodable(result: Result<(), IndexError>) {
    match result {
        Err(IndexError::Indexation { doc_id, source }) => {
            assert_eq!(doc_id, DocId::MAX);
            match *source {
                IndexError::Encode { term, source } => {
                    assert_eq!(term, "bird");
                    assert!(matches!(source, CodecError::Overflow));
                }
                other => panic!("unexpected error {}", other),
            }
        }
        Err(other) => panic!("unexpected error {}", other),
        Ok(()) => panic!("document {} should be rejected", DocId::MAX),
    }
}

#[rstest]
fn test_builder_rejects_unencodable_document(
    #[values(CompressionMode::Gamma, CompressionMode::Delta)] mode: CompressionMode,
) {
    init_logger();
    let options = IndexOptions::with_compression(mode);
    let mut builder = IndexBuilder::new(options, Arc::new(Tokenizer::default()));
    let mut index = InvertedIndex::new(options, Arc::new(Tokenizer::default()));

    builder.add_document(Document::new(1, "cat dog")).unwrap();
    index.add_document(Document::new(1, "cat dog")).unwrap();
    assert_unencodable(builder.add_document(Document::new(DocId::MAX, "cat bird")));
    assert_unencodable(index.add_document(Document::new(DocId::MAX, "cat bird")));

    // Only the rejected document is missing
    assert_eq!(builder.len(), 1);
    let sealed = builder.build().expect("could not build the index");
    assert_eq!(sealed.len(), 1);
    assert!(sealed.document(DocId::MAX).is_none());
    assert_eq!(ids(&sealed.search("cat dog").unwrap()), vec![1]);
    check_same_index(&index, &sealed);

    // The ID is fine when it does not start a postings list
    let mut builder = IndexBuilder::new(options, Arc::new(Tokenizer::default()));
    builder.add_document(Document::new(1, "cat dog")).unwrap();
    builder
        .add_document(Document::new(DocId::MAX, "dog cat"))
        .unwrap();
    let sealed = builder.build().expect("could not build the index");
    assert_eq!(ids(&sealed.search("cat").unwrap()), vec![1, DocId::MAX]);
}

#[test]
fn test_builder_replace() {
    let options = IndexOptions {
        reinsert_policy: ReinsertPolicy::Replace,
        ..Default::default()
    };
    let mut builder = IndexBuilder::new(options, whitespace_analyzer());
    let mut index = InvertedIndex::new(options, whitespace_analyzer());
    for (id, text) in [(4, "a b"), (2, "b c"), (4, "c d"), (9, "a")] {
        builder.add_document(Document::new(id, text)).unwrap();
        index.add_document(Document::new(id, text)).unwrap();
    }
    let sealed = builder.build().unwrap();

    check_same_index(&index, &sealed);
    assert_eq!(sealed.doc_ids("a").unwrap(), vec![9]);
    assert_eq!(sealed.doc_ids("c").unwrap(), vec![2, 4]);
}

#[rstest]
fn test_save_and_load(
    #[values(CompressionMode::None, CompressionMode::Gamma, CompressionMode::Delta)]
    mode: CompressionMode,
) {
    init_logger();
    let mut index = pets(mode);
    let mut metadata = serde_json::Map::new();
    metadata.insert("title".to_string(), serde_json::json!("Pets"));
    index
        .add_document(Document::with_metadata(0, "dog sleeps", metadata))
        .unwrap();

    let dir = TempDir::new().expect("Could not create temporary directory");
    let path = dir.path().join("index");
    index.save(&path).expect("could not save the index");

    let loaded = InvertedIndex::load(&path, Arc::new(Tokenizer::default()))
        .expect("could not load the index");
    check_same_index(&index, &loaded);
    assert_eq!(loaded.mode(), mode);
    assert_eq!(loaded.document(0).unwrap().metadata["title"], "Pets");
    assert_eq!(ids(&loaded.search("dog").unwrap()), vec![0, 2, 3]);

    let bytes = loaded.postings("dog").unwrap();
    assert_eq!(decode_postings(bytes, mode).unwrap(), vec![0, 2, 3]);
}

#[test]
fn test_load_missing_index() {
    let dir = TempDir::new().expect("Could not create temporary directory");
    assert!(matches!(
        InvertedIndex::load(dir.path(), Arc::new(Tokenizer::default())),
        Err(IndexError::Io(_))
    ));
}

#[test]
fn test_statistics() {
    let mut indices = Vec::new();
    for mode in CompressionMode::ALL {
        let mut index =
            InvertedIndex::new(IndexOptions::with_compression(mode), whitespace_analyzer());
        index.add_document(Document::new(1, "a b")).unwrap();
        index.add_document(Document::new(2, "a c")).unwrap();
        indices.push(index.statistics());
    }
    let (none, gamma, delta) = (indices[0], indices[1], indices[2]);

    assert_eq!((none.documents, none.terms), (2, 3));
    assert_eq!(none.postings_bytes, 32);
    assert_eq!(none.index_size, 35);

    // a: [2, 1], b: [2], c: [3]; one byte each
    assert_eq!(gamma.postings_bytes, 3);
    assert_eq!(gamma.index_size, 6);
    assert_eq!(delta.postings_bytes, 3);

    assert_about_eq!(gamma.compression_ratio(&none).unwrap(), 35. / 6.);
    assert_about_eq!(none.compression_ratio(&none).unwrap(), 1.);

    let empty = InvertedIndex::with_mode(CompressionMode::Gamma).statistics();
    assert_eq!(empty.index_size, 0);
    assert!(empty.compression_ratio(&none).is_none());
    assert_about_eq!(none.compression_ratio(&empty).unwrap(), 0.);
}
