//! Locale registry: single source of truth for the documentation locales.
//!
//! Every locale the sync tooling knows about is described once here: the
//! directory code used in file paths, the English name handed to the model,
//! the code used inside `docs.json`, and the notice prepended to machine
//! translated pages. Both entry flows resolve their target locales through
//! this registry so the two never drift apart.

use anyhow::{bail, Result};
use std::fmt;
use std::sync::OnceLock;

/// Configuration for a documentation locale.
#[derive(Debug)]
pub struct LocaleConfig {
    /// Directory code used in document paths (e.g., "en", "zh-hans", "cn")
    pub code: &'static str,

    /// English name of the language, used in translation prompts
    pub name: &'static str,

    /// Language code used in the `docs.json` navigation tree
    pub navigation_code: &'static str,

    /// Label of the "Documentation" dropdown in this locale
    pub documentation_label: &'static str,

    /// Older dropdown labels that still identify the documentation section
    pub legacy_documentation_labels: &'static [&'static str],

    /// Glossary for navigation group labels (English -> localized)
    pub group_labels: &'static [(&'static str, &'static str)],

    /// Notice prepended to translated pages. `{en_path}` is replaced with a
    /// relative link to the English original.
    pub notice: &'static str,

    /// Whether this is the source locale (exactly one)
    pub is_source: bool,
}

const CHINESE_NOTICE: &str = "> ⚠️ 本文档由 AI 自动翻译。如有任何不准确之处，请参考[英文原版]({en_path})。\n\n";

const JAPANESE_NOTICE: &str = "> ⚠️ このドキュメントはAIによって自動翻訳されています。不正確な部分がある場合は、[英語版]({en_path})を参照してください。\n\n";

const CHINESE_GROUP_LABELS: &[(&str, &str)] = &[
    ("Getting Started", "快速开始"),
    ("Documentation", "文档"),
    ("Build", "构建"),
    ("Debug", "调试"),
    ("Publish", "发布"),
    ("Monitor", "监控"),
    ("Knowledge", "知识库"),
    ("Workspace", "工作区"),
    ("Tutorials", "教程"),
    ("FAQ", "常见问题"),
    ("Introduction", "介绍"),
    ("Quick Start", "快速开始"),
    ("Key Concepts", "核心概念"),
];

const JAPANESE_GROUP_LABELS: &[(&str, &str)] = &[
    ("Getting Started", "はじめに"),
    ("Documentation", "ドキュメント"),
    ("Build", "ビルド"),
    ("Debug", "デバッグ"),
    ("Publish", "公開"),
    ("Monitor", "モニタリング"),
    ("Knowledge", "ナレッジベース"),
    ("Workspace", "ワークスペース"),
    ("Tutorials", "チュートリアル"),
    ("FAQ", "よくある質問"),
    ("Introduction", "紹介"),
    ("Quick Start", "クイックスタート"),
    ("Key Concepts", "主要概念"),
];

/// Global locale registry.
pub struct LocaleRegistry {
    locales: Vec<LocaleConfig>,
}

static REGISTRY: OnceLock<LocaleRegistry> = OnceLock::new();

impl LocaleRegistry {
    /// Get the global registry, initializing it on first access.
    pub fn get() -> &'static LocaleRegistry {
        REGISTRY.get_or_init(|| LocaleRegistry {
            locales: default_locales(),
        })
    }

    /// Look up a locale by its directory code.
    pub fn get_by_code(&self, code: &str) -> Option<&LocaleConfig> {
        self.locales.iter().find(|locale| locale.code == code)
    }

    /// All registered locales, source first.
    pub fn list_all(&self) -> Vec<&LocaleConfig> {
        self.locales.iter().collect()
    }
}

/// A locale validated against the registry.
#[derive(Clone, Copy)]
pub struct Locale {
    config: &'static LocaleConfig,
}

impl Locale {
    /// Resolve a directory code (e.g., "cn", "ja-jp") to a registered locale.
    pub fn from_code(code: &str) -> Result<Locale> {
        match LocaleRegistry::get().get_by_code(code) {
            Some(config) => Ok(Locale { config }),
            None => bail!("Unknown locale code: '{}'", code),
        }
    }

    /// The source locale all translations are derived from.
    pub fn source() -> Locale {
        let registry = LocaleRegistry::get();
        let config = registry
            .locales
            .iter()
            .find(|locale| locale.is_source)
            .unwrap_or(&registry.locales[0]);
        Locale { config }
    }

    pub fn code(&self) -> &'static str {
        self.config.code
    }

    pub fn name(&self) -> &'static str {
        self.config.name
    }

    pub fn config(&self) -> &'static LocaleConfig {
        self.config
    }

    pub fn is_source(&self) -> bool {
        self.config.is_source
    }

    /// Render the AI-translation notice pointing at the English original.
    pub fn notice_for(&self, en_path: &str) -> String {
        self.config.notice.replace("{en_path}", en_path)
    }

    /// Translate a navigation group label, falling back to the English label.
    pub fn group_label<'a>(&self, en_label: &'a str) -> &'a str {
        self.config
            .group_labels
            .iter()
            .find(|(en, _)| *en == en_label)
            .map(|(_, localized)| *localized)
            .unwrap_or(en_label)
    }
}

impl PartialEq for Locale {
    fn eq(&self, other: &Self) -> bool {
        self.config.code == other.config.code
    }
}

impl Eq for Locale {}

impl fmt::Debug for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Locale").field(&self.config.code).finish()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config.code)
    }
}

/// Registered locales.
///
/// `cn`/`jp` and `zh-hans`/`ja-jp` are the two directory layouts used by the
/// plan-driven and diff-driven flows; they share names, navigation codes and
/// glossaries.
fn default_locales() -> Vec<LocaleConfig> {
    vec![
        LocaleConfig {
            code: "en",
            name: "English",
            navigation_code: "en",
            documentation_label: "Documentation",
            legacy_documentation_labels: &[],
            group_labels: &[],
            notice: "",
            is_source: true,
        },
        LocaleConfig {
            code: "zh-hans",
            name: "Chinese",
            navigation_code: "zh-Hans",
            documentation_label: "文档",
            legacy_documentation_labels: &["使用文档"],
            group_labels: CHINESE_GROUP_LABELS,
            notice: CHINESE_NOTICE,
            is_source: false,
        },
        LocaleConfig {
            code: "ja-jp",
            name: "Japanese",
            navigation_code: "jp",
            documentation_label: "ドキュメント",
            legacy_documentation_labels: &[],
            group_labels: JAPANESE_GROUP_LABELS,
            notice: JAPANESE_NOTICE,
            is_source: false,
        },
        LocaleConfig {
            code: "cn",
            name: "Chinese",
            navigation_code: "zh-Hans",
            documentation_label: "文档",
            legacy_documentation_labels: &["使用文档"],
            group_labels: CHINESE_GROUP_LABELS,
            notice: CHINESE_NOTICE,
            is_source: false,
        },
        LocaleConfig {
            code: "jp",
            name: "Japanese",
            navigation_code: "jp",
            documentation_label: "ドキュメント",
            legacy_documentation_labels: &[],
            group_labels: JAPANESE_GROUP_LABELS,
            notice: JAPANESE_NOTICE,
            is_source: false,
        },
    ]
}
