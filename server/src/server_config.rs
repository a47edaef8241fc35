use config::Config;
use lazy_static::lazy_static;
use serde::Deserialize;
use std::{
    env,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub listen_addr: String,
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TriageConfig {
    pub confidence_threshold: f64,
    pub min_token_count: usize,
    pub rule_based_confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Replies {
    pub produtivo: String,
    pub improdutivo: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub id: String,
    pub temperature: f64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    pub dir: String,
    pub entity_lexicon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    http: HttpConfig,
    triage: TriageConfig,
    replies: Replies,
    model: ModelConfig,
    artifacts: ArtifactsConfig,
}

#[derive(Debug)]
pub struct ServerConfig {
    pub http: HttpConfig,
    pub triage: TriageConfig,
    pub replies: Replies,
    pub model: ModelConfig,
    pub artifacts: ArtifactsConfig,
    root: PathBuf,
}

impl ServerConfig {
    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn vectorizer_path(&self) -> PathBuf {
        self.resolve(&self.artifacts.dir).join("vectorizer.json")
    }

    pub fn classifier_path(&self) -> PathBuf {
        self.resolve(&self.artifacts.dir).join("classifier.json")
    }

    pub fn entity_lexicon_path(&self) -> Option<PathBuf> {
        self.artifacts
            .entity_lexicon
            .as_deref()
            .map(|p| self.resolve(p))
    }
}

pub fn gemini_api_key() -> Option<String> {
    env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty())
}

fn app_root() -> PathBuf {
    if let Ok(dir) = env::var("APP_DIR") {
        PathBuf::from(dir)
    } else {
        let cargo_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR or APP_DIR is required");
        Path::new(&cargo_dir)
            .parent()
            .expect("Failed to get parent dir")
            .to_path_buf()
    }
}

lazy_static! {
    pub static ref cfg: ServerConfig = {
        let root = app_root();
        let path = root.join("config/config.toml");
        let cfg_file: ConfigFile = Config::builder()
            .add_source(config::File::with_name(&path.display().to_string()))
            .build()
            .expect("config.toml is required")
            .try_deserialize()
            .expect("config.toml is invalid");

        let ConfigFile {
            http,
            triage,
            replies,
            model,
            artifacts,
        } = cfg_file;

        ServerConfig {
            http,
            triage,
            replies,
            model,
            artifacts,
            root,
        }
    };
}
