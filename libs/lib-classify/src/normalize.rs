use std::collections::HashSet;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

/// Tokens whose normalized form is shorter than this are treated as noise.
const MIN_TOKEN_LEN: usize = 3;

/// Courtesy/social boilerplate with no discriminative signal. Removed as
/// whole phrases before tokenization so they never reach the feature space.
const SOCIAL_PHRASES: &[&str] = &[
    "bom dia",
    "boa tarde",
    "boa noite",
    "feliz natal",
    "feliz ano novo",
    "boas festas",
    "bom feriado",
    "bom carnaval",
    "espero que esteja bem",
    "espero que esteja tudo bem",
    "como vai",
    "tudo bem",
    "saudações",
    "fim de ano",
    "bom fim de ano",
];

const STOPWORDS: &[&str] = &[
    "a", "à", "ao", "aos", "as", "às", "o", "os", "um", "uma", "uns", "umas", "de", "do", "da",
    "dos", "das", "em", "no", "na", "nos", "nas", "num", "numa", "por", "pelo", "pela", "pelos",
    "pelas", "para", "com", "sem", "sob", "sobre", "entre", "até", "após", "desde", "e", "ou",
    "mas", "que", "se", "como", "quando", "onde", "porque", "pois", "também", "já", "ainda",
    "muito", "muita", "muitos", "muitas", "pouco", "pouca", "mais", "menos", "tão", "tal", "cada",
    "qual", "quais", "quem", "isso", "isto", "aquilo", "este", "esta", "estes", "estas", "esse",
    "essa", "esses", "essas", "aquele", "aquela", "aqueles", "aquelas", "eu", "tu", "ele", "ela",
    "eles", "elas", "nós", "você", "vocês", "me", "te", "lhe", "lhes", "vos", "meu", "minha",
    "meus", "minhas", "teu", "tua", "seu", "sua", "seus", "suas", "nosso", "nossa", "nossos",
    "nossas", "ser", "estar", "ter", "haver", "é", "são", "foi", "foram", "era", "eram", "está",
    "estão", "estava", "estavam", "tem", "têm", "tinha", "tinham", "há", "não", "sim", "então",
    "assim", "aqui", "lá", "depois", "antes", "hoje", "ontem", "amanhã", "todo", "toda", "todos",
    "todas", "outro", "outra", "outros", "outras", "mesmo", "mesma", "vai", "vou",
];

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(r"[\p{L}\p{N}]+").unwrap();
    static ref SOCIAL_RE: Regex = {
        // Longer phrases first so "bom fim de ano" wins over "fim de ano".
        let mut phrases = SOCIAL_PHRASES.to_vec();
        phrases.sort_by_key(|p| std::cmp::Reverse(p.len()));
        let alternation = phrases
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).unwrap()
    };
    static ref STOPWORD_SET: HashSet<&'static str> = STOPWORDS.iter().copied().collect();
}

/// Remove known courtesy phrases wherever they occur, respecting word
/// boundaries. Exposed for the trainer and for tests.
pub fn strip_social_phrases(text: &str) -> String {
    SOCIAL_RE.replace_all(text, "").into_owned()
}

/// Text normalizer: social-phrase removal, stopword and punctuation
/// filtering, stemming, and entity surface-form preservation.
///
/// Entity preservation depends on an optional lexicon file (one entity per
/// line). When the lexicon is absent the normalizer runs in degraded mode
/// and stems every non-stopword token; it never fails for this reason.
pub struct Normalizer {
    stemmer: Stemmer,
    entities: HashSet<String>,
    entity_phrases: Option<Regex>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Degraded-mode normalizer with no entity lexicon.
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::Portuguese),
            entities: HashSet::new(),
            entity_phrases: None,
        }
    }

    pub fn with_entities(entities: HashSet<String>) -> Self {
        let mut single: HashSet<String> = HashSet::new();
        let mut phrases: Vec<String> = Vec::new();
        for entry in entities {
            let entry = entry.trim().to_lowercase();
            if entry.is_empty() {
                continue;
            }
            if entry.split_whitespace().count() > 1 {
                phrases.push(entry);
            } else {
                single.insert(entry);
            }
        }

        // Multi-word entities are matched as phrases against the raw
        // lowercased text, since tokenization sees one word at a time.
        let entity_phrases = if phrases.is_empty() {
            None
        } else {
            phrases.sort_by_key(|p| std::cmp::Reverse(p.len()));
            let alternation = phrases
                .iter()
                .map(|p| regex::escape(p))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!(r"\b(?:{})\b", alternation)).unwrap())
        };

        Self {
            stemmer: Stemmer::create(Algorithm::Portuguese),
            entities: single,
            entity_phrases,
        }
    }

    /// Load the entity lexicon from `path`, falling back to degraded mode
    /// when the file cannot be read.
    pub fn from_lexicon_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::with_entities(contents.lines().map(str::to_owned).collect()),
            Err(_) => Self::new(),
        }
    }

    pub fn has_entity_lexicon(&self) -> bool {
        !self.entities.is_empty() || self.entity_phrases.is_some()
    }

    /// Normalize raw email text into a space-joined token sequence.
    ///
    /// An empty result is valid output and signals no actionable content.
    pub fn normalize(&self, text: &str) -> String {
        let text = strip_social_phrases(&text.to_lowercase());

        let phrase_spans: Vec<(usize, usize)> = match &self.entity_phrases {
            Some(re) => re.find_iter(&text).map(|m| (m.start(), m.end())).collect(),
            None => Vec::new(),
        };
        let in_entity_phrase =
            |pos: usize| phrase_spans.iter().any(|&(start, end)| pos >= start && pos < end);

        let mut tokens: Vec<String> = Vec::new();
        for m in TOKEN_RE.find_iter(&text) {
            let word = m.as_str();
            if STOPWORD_SET.contains(word) {
                continue;
            }
            // Entities keep their surface form; everything else is stemmed
            // and filtered for length.
            if self.entities.contains(word) || in_entity_phrase(m.start()) {
                tokens.push(word.to_owned());
                continue;
            }
            let stem = self.stemmer.stem(word);
            if stem.chars().count() >= MIN_TOKEN_LEN {
                tokens.push(stem.into_owned());
            }
        }

        tokens.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_social_phrases_anywhere() {
        let out = strip_social_phrases("bom dia equipe, feliz natal e boas festas");
        assert!(!out.contains("bom dia"));
        assert!(!out.contains("feliz natal"));
        assert!(!out.contains("boas festas"));
        assert!(out.contains("equipe"));
    }

    #[test]
    fn test_social_phrase_respects_word_boundaries() {
        // "tudo bem" inside a larger word must survive
        let out = strip_social_phrases("estudo bemol");
        assert_eq!(out, "estudo bemol");
    }

    #[test]
    fn test_longest_phrase_wins() {
        let out = strip_social_phrases("desejo um bom fim de ano");
        assert!(!out.contains("fim de ano"));
        assert!(!out.contains("bom fim"));
    }

    #[test]
    fn test_social_only_email_normalizes_to_empty() {
        let norm = Normalizer::new();
        // only "obrigado" can survive the phrase stripping
        let out = norm.normalize("Boa tarde, feliz natal a todos, obrigado!");
        assert!(out.split_whitespace().count() <= 1);
        assert_eq!(norm.normalize("Bom dia! Boas festas."), "");
        assert_eq!(norm.normalize(""), "");
    }

    #[test]
    fn test_drops_stopwords_and_punctuation() {
        let norm = Normalizer::new();
        let out = norm.normalize("o pagamento da fatura não foi processado!!!");
        assert!(!out.contains(" o "));
        assert!(!out.contains("não"));
        assert!(!out.contains('!'));
        assert!(out.split_whitespace().count() >= 3);
    }

    #[test]
    fn test_short_stems_are_noise() {
        let norm = Normalizer::new();
        // "ex" stems to itself and is below the length floor
        assert_eq!(norm.normalize("ex"), "");
    }

    #[test]
    fn test_entity_surface_form_preserved() {
        let norm =
            Normalizer::with_entities(["petrobras".to_string()].into_iter().collect());
        let out = norm.normalize("contrato com a Petrobras atrasado");
        assert!(out.contains("petrobras"));
    }

    #[test]
    fn test_multiword_entity_preserved() {
        let norm = Normalizer::with_entities(
            ["receita federal".to_string(), "petrobras".to_string()]
                .into_iter()
                .collect(),
        );
        let out = norm.normalize("processo pendente na Receita Federal sobre a Petrobras");
        assert!(out.contains("receita federal"));
        assert!(out.contains("petrobras"));
    }

    #[test]
    fn test_stopword_inside_multiword_entity_is_dropped() {
        let norm =
            Normalizer::with_entities(["rio de janeiro".to_string()].into_iter().collect());
        let out = norm.normalize("mudança do escritório para o Rio de Janeiro");
        assert!(out.contains("rio janeiro"));
        assert!(!out.split_whitespace().any(|t| t == "de"));
    }

    #[test]
    fn test_lexicon_file_loads_multiword_entries() {
        let path = std::env::temp_dir().join("normalize_test_entities.txt");
        std::fs::write(&path, "petrobras\nreceita federal\n").unwrap();
        let norm = Normalizer::from_lexicon_file(&path);
        let _ = std::fs::remove_file(&path);
        assert!(norm.has_entity_lexicon());
        let out = norm.normalize("consulta na Receita Federal");
        assert!(out.contains("receita federal"));
    }

    #[test]
    fn test_degraded_mode_stems_everything() {
        let norm = Normalizer::new();
        assert!(!norm.has_entity_lexicon());
        let out = norm.normalize("documentos pendentes do contrato");
        // stemmed forms, no raises, deterministic
        assert_eq!(out, norm.normalize("documentos pendentes do contrato"));
    }

    #[test]
    fn test_numbers_survive() {
        let norm = Normalizer::new();
        let out = norm.normalize("contrato 48291 vencido");
        assert!(out.contains("48291"));
    }
}
