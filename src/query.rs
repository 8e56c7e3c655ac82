//! Query keywords and the ordered multi-maps used to build requests.

/// The kind of a search query keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordType {
    System,
    Freetext,
    Temporal,
    Geospatial,
    Facet,
}

impl KeywordType {
    /// Classifies a keyword. Unknown keywords are facet names.
    pub fn classify(keyword: &str) -> Self {
        match keyword {
            "query" => KeywordType::Freetext,
            "start" | "end" => KeywordType::Temporal,
            "lat" | "lon" | "bbox" | "location" | "radius" | "polygon" => KeywordType::Geospatial,
            "limit" | "from" | "to" | "fields" | "facets" | "format" | "type" | "distrib"
            | "replica" | "id" | "shards" => KeywordType::System,
            _ => KeywordType::Facet,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeywordType::System => "system",
            KeywordType::Freetext => "freetext",
            KeywordType::Temporal => "temporal",
            KeywordType::Geospatial => "geospatial",
            KeywordType::Facet => "facet",
        }
    }
}

pub fn query_keyword_type(keyword: &str) -> KeywordType {
    KeywordType::classify(keyword)
}

/// Query string parameters in insertion order. Keys may repeat.
///
/// A parameter without a value is kept until [`QueryParams::present`] is
/// called, which is what the connection serializes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, Option<String>)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.pairs.push((key.into(), Some(value.into())));
        self
    }

    pub fn push_opt(&mut self, key: impl Into<String>, value: Option<String>) -> &mut Self {
        self.pairs.push((key.into(), value));
        self
    }

    /// Appends every pair of `other`, keeping repeated keys.
    pub fn extend(&mut self, other: &QueryParams) -> &mut Self {
        self.pairs.extend(other.pairs.iter().cloned());
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Pairs that carry a value.
    pub fn present(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
    }

    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.present().filter(move |(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Caller-supplied search constraints, e.g. `project=CMIP5`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraints {
    pairs: Vec<(String, String)>,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    pub fn add_all<I, V>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let key = key.into();
        for v in values {
            self.pairs.push((key.clone(), v.into()));
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Constraints {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
