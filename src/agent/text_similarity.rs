// SYNOID Text Similarity
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Bag-of-words comparison between a scene's dialogue and a clip transcript.
// Both texts form a two-document corpus; each is weighted with smoothed
// TF-IDF, L2-normalised, and compared by cosine similarity.

use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

/// English stop words excluded from the vocabulary.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst",
    "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can",
    "cannot", "cant", "co", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do",
    "done", "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else",
    "elsewhere", "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "fifteen", "fifty", "fill", "find", "fire", "first", "five",
    "for", "former", "formerly", "forty", "found", "four", "from", "front", "full", "further",
    "get", "give", "go", "had", "has", "hasnt", "have", "he", "hence", "her", "here",
    "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him", "himself", "his",
    "how", "however", "hundred", "i", "ie", "if", "in", "inc", "indeed", "interest", "into",
    "is", "it", "its", "itself", "keep", "last", "latter", "latterly", "least", "less", "ltd",
    "made", "many", "may", "me", "meanwhile", "might", "mill", "mine", "more", "moreover",
    "most", "mostly", "move", "much", "must", "my", "myself", "name", "namely", "neither",
    "never", "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto", "or",
    "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "part",
    "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed",
    "seeming", "seems", "serious", "several", "she", "should", "show", "side", "since",
    "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something", "sometime",
    "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than", "that", "the",
    "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "thick", "thin", "third", "this",
    "those", "though", "three", "through", "throughout", "thru", "thus", "to", "together", "too",
    "top", "toward", "towards", "twelve", "twenty", "two", "un", "under", "until", "up", "upon",
    "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
    "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon", "wherever",
    "whether", "which", "while", "whither", "who", "whoever", "whole", "whom", "whose", "why",
    "will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    // Words of two or more word characters.
    TOKEN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"))
}

fn stop_words() -> &'static HashSet<&'static str> {
    static STOP: OnceLock<HashSet<&'static str>> = OnceLock::new();
    STOP.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// Lowercased, stop-word-free tokens of `text` in order of appearance.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    token_regex()
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !stop_words().contains(t))
        .map(str::to_string)
        .collect()
}

/// Reasons a two-document vectorization can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VectorizeError {
    /// Nothing survived tokenization and stop-word removal.
    #[error("empty vocabulary; documents contain only stop words")]
    EmptyVocabulary,
}

/// Builds L2-normalised TF-IDF vectors over a small corpus.
///
/// IDF is smoothed: `ln((1 + n) / (1 + df)) + 1`.
pub fn tfidf_vectors(corpus: &[&str]) -> Result<Vec<Vec<f64>>, VectorizeError> {
    let docs: Vec<Vec<String>> = corpus.iter().map(|d| tokenize(d)).collect();

    // Sorted vocabulary keeps feature order stable.
    let mut vocabulary: BTreeMap<&str, usize> = BTreeMap::new();
    for token in docs.iter().flatten() {
        vocabulary.entry(token.as_str()).or_insert(0);
    }
    if vocabulary.is_empty() {
        return Err(VectorizeError::EmptyVocabulary);
    }
    for (index, slot) in vocabulary.values_mut().enumerate() {
        *slot = index;
    }

    let n_docs = docs.len() as f64;
    let mut doc_freq = vec![0usize; vocabulary.len()];
    for doc in &docs {
        let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
        for token in unique {
            doc_freq[vocabulary[token]] += 1;
        }
    }
    let idf: Vec<f64> = doc_freq
        .iter()
        .map(|&df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
        .collect();

    let vectors = docs
        .iter()
        .map(|doc| {
            let mut vector = vec![0.0; vocabulary.len()];
            for token in doc {
                vector[vocabulary[token.as_str()]] += 1.0;
            }
            for (weight, idf) in vector.iter_mut().zip(&idf) {
                *weight *= idf;
            }
            let norm = vector.iter().map(|w| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                vector.iter_mut().for_each(|w| *w /= norm);
            }
            vector
        })
        .collect();

    Ok(vectors)
}

/// Cosine similarity; zero when either vector has no magnitude.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Similarity of two free texts in `[0, 1]`.
///
/// Empty input and vectorization failures score `0.0`.
pub fn similarity(text_a: &str, text_b: &str) -> f64 {
    if text_a.is_empty() || text_b.is_empty() {
        return 0.0;
    }

    match tfidf_vectors(&[text_a, text_b]) {
        Ok(vectors) => cosine(&vectors[0], &vectors[1]).clamp(0.0, 1.0),
        Err(e) => {
            debug!("[RANK] Text similarity degraded to 0.0: {}", e);
            0.0
        }
    }
}
