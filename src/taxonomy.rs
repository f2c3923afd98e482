use crate::error::{LocError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternSpec {
    Extensions(Vec<String>),
    Globs(Vec<String>),
    Regex(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub name: String,
    #[serde(rename = "match")]
    pub pattern: PatternSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomySpec {
    pub name: String,
    pub categories: Vec<CategorySpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyFile {
    pub taxonomies: Vec<TaxonomySpec>,
}

#[derive(Debug, Clone)]
enum Matcher {
    Regex(Regex),
    Globs(GlobSet),
}

impl Matcher {
    fn compile(spec: &PatternSpec) -> Result<Self> {
        match spec {
            PatternSpec::Extensions(exts) => {
                if exts.is_empty() {
                    return Err(LocError::Pattern("empty extension list".to_string()));
                }
                let alternatives: Vec<String> = exts
                    .iter()
                    .map(|e| regex::escape(e.trim_start_matches('.')))
                    .collect();
                let re = Regex::new(&format!(r"\.({})$", alternatives.join("|")))?;
                Ok(Matcher::Regex(re))
            }
            PatternSpec::Globs(globs) => {
                if globs.is_empty() {
                    return Err(LocError::Pattern("empty glob list".to_string()));
                }
                let mut builder = GlobSetBuilder::new();
                for g in globs {
                    builder.add(Glob::new(g)?);
                }
                Ok(Matcher::Globs(builder.build()?))
            }
            PatternSpec::Regex(re) => Ok(Matcher::Regex(Regex::new(re)?)),
        }
    }

    fn is_match(&self, path: &str) -> bool {
        match self {
            Matcher::Regex(re) => re.is_match(path),
            Matcher::Globs(set) => set.is_match(Path::new(path)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Category {
    name: String,
    matcher: Matcher,
}

impl Category {
    pub fn new(name: impl Into<String>, pattern: &PatternSpec) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            matcher: Matcher::compile(pattern)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }
}

#[derive(Debug, Clone)]
pub struct Taxonomy {
    name: String,
    categories: Vec<Category>,
}

impl Taxonomy {
    pub fn new(name: impl Into<String>, categories: Vec<Category>) -> Result<Self> {
        let name = name.into();
        if categories.is_empty() {
            return Err(LocError::Config(format!("taxonomy '{name}' has no categories")));
        }
        let mut seen = HashSet::new();
        for c in &categories {
            if !seen.insert(c.name.as_str()) {
                return Err(LocError::Config(format!(
                    "taxonomy '{name}' declares category '{}' twice",
                    c.name
                )));
            }
        }
        Ok(Self { name, categories })
    }

    pub fn from_spec(spec: &TaxonomySpec) -> Result<Self> {
        let categories = spec
            .categories
            .iter()
            .map(|c| {
                Category::new(c.name.clone(), &c.pattern).map_err(|e| {
                    LocError::Pattern(format!("{} / {}: {e}", spec.name, c.name))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(spec.name.clone(), categories)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category_names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Position of the first category matching `path`.
    pub fn classify_index(&self, path: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.matches(path))
    }

    pub fn classify(&self, path: &str) -> Option<&str> {
        self.classify_index(path).map(|i| self.categories[i].name())
    }
}

pub const BUILTIN_NAMES: &[&str] = &["languages", "source"];

fn extensions(exts: &[&str]) -> PatternSpec {
    PatternSpec::Extensions(exts.iter().map(|e| e.to_string()).collect())
}

pub fn builtin_spec(name: &str) -> Option<TaxonomySpec> {
    let categories = match name {
        "languages" => vec![
            CategorySpec {
                name: "C++".to_string(),
                pattern: extensions(&["cc", "cpp", "h", "hpp", "inc", "inl"]),
            },
            CategorySpec {
                name: "Java".to_string(),
                pattern: extensions(&["java"]),
            },
            CategorySpec {
                name: "Python".to_string(),
                pattern: extensions(&["py"]),
            },
        ],
        "source" => vec![CategorySpec {
            name: "Source".to_string(),
            pattern: extensions(&["c", "cpp", "h", "hpp", "inc", "inl", "java", "py"]),
        }],
        _ => return None,
    };
    Some(TaxonomySpec {
        name: name.to_string(),
        categories,
    })
}

pub fn builtin(name: &str) -> Result<Taxonomy> {
    let spec = builtin_spec(name).ok_or_else(|| {
        LocError::Config(format!(
            "unknown builtin taxonomy '{name}' (available: {})",
            BUILTIN_NAMES.join(", ")
        ))
    })?;
    Taxonomy::from_spec(&spec)
}

pub fn load_file(path: &Path) -> Result<Vec<Taxonomy>> {
    let text = std::fs::read_to_string(path)?;
    parse_taxonomies(&text)
}

pub fn parse_taxonomies(json: &str) -> Result<Vec<Taxonomy>> {
    let file: TaxonomyFile = serde_json::from_str(json)?;
    if file.taxonomies.is_empty() {
        return Err(LocError::Config("no taxonomies declared".to_string()));
    }
    file.taxonomies.iter().map(Taxonomy::from_spec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_pattern_is_anchored_at_end() {
        let c = Category::new("cpp", &extensions(&["cc", "h"])).unwrap();
        assert!(c.matches("src/a.cc"));
        assert!(c.matches("include/b.h"));
        assert!(!c.matches("src/a.cc.orig"));
        assert!(!c.matches("src/hcc"));
    }

    #[test]
    fn leading_dot_in_extension_is_tolerated() {
        let c = Category::new("py", &extensions(&[".py"])).unwrap();
        assert!(c.matches("tools/gen.py"));
    }

    #[test]
    fn globs_match_whole_path() {
        let c = Category::new(
            "wpilibc",
            &PatternSpec::Globs(vec!["wpilibc/**".to_string()]),
        )
        .unwrap();
        assert!(c.matches("wpilibc/src/main/native/cpp/Timer.cpp"));
        assert!(!c.matches("wpilibj/src/Timer.java"));
    }

    #[test]
    fn duplicate_names_rejected() {
        let a = Category::new("x", &extensions(&["a"])).unwrap();
        let b = Category::new("x", &extensions(&["b"])).unwrap();
        assert!(matches!(
            Taxonomy::new("t", vec![a, b]),
            Err(LocError::Config(_))
        ));
    }

    #[test]
    fn invalid_regex_is_a_pattern_error() {
        let spec = TaxonomySpec {
            name: "t".to_string(),
            categories: vec![CategorySpec {
                name: "bad".to_string(),
                pattern: PatternSpec::Regex("(".to_string()),
            }],
        };
        assert!(matches!(Taxonomy::from_spec(&spec), Err(LocError::Pattern(_))));
    }

    #[test]
    fn unknown_builtin() {
        assert!(builtin("nope").is_err());
        assert_eq!(builtin("languages").unwrap().len(), 3);
    }
}
