use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Facet name -> facet value -> number of matching records.
pub type FacetCounts = BTreeMap<String, BTreeMap<String, u64>>;

#[derive(Debug, Deserialize)]
struct SolrReply {
    #[serde(default)]
    response: Option<SolrDocs>,
    #[serde(default, rename = "responseHeader")]
    response_header: Option<ResponseHeader>,
    #[serde(default)]
    facet_counts: Option<SolrFacetCounts>,
}

#[derive(Debug, Deserialize)]
struct SolrDocs {
    #[serde(default, rename = "numFound")]
    num_found: Option<u64>,
    #[serde(default)]
    docs: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ResponseHeader {
    #[serde(default)]
    params: Option<HeaderParams>,
}

#[derive(Debug, Deserialize)]
struct HeaderParams {
    #[serde(default)]
    shards: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SolrFacetCounts {
    #[serde(default)]
    facet_fields: BTreeMap<String, Vec<Value>>,
}

fn parse(doc: Value) -> Result<SolrReply> {
    serde_json::from_value(doc).map_err(|e| Error::Response(format!("malformed reply: {}", e)))
}

pub(crate) fn docs(doc: Value) -> Result<Vec<Value>> {
    parse(doc)?
        .response
        .and_then(|r| r.docs)
        .ok_or_else(|| Error::Response("missing response.docs".to_string()))
}

pub(crate) fn num_found(doc: Value) -> Result<usize> {
    let n = parse(doc)?
        .response
        .and_then(|r| r.num_found)
        .ok_or_else(|| Error::Response("missing response.numFound".to_string()))?;
    usize::try_from(n).map_err(|_| Error::Response(format!("numFound {} does not fit usize", n)))
}

pub(crate) fn shards(doc: Value) -> Result<Vec<String>> {
    let shards = parse(doc)?
        .response_header
        .and_then(|h| h.params)
        .and_then(|p| p.shards)
        .ok_or_else(|| Error::Response("missing responseHeader.params.shards".to_string()))?;
    Ok(shards.split(',').map(str::to_string).collect())
}

// Solr encodes facet counts as a flat [value, count, value, count, ...] array.
pub(crate) fn facet_counts(doc: Value) -> Result<FacetCounts> {
    let Some(counts) = parse(doc)?.facet_counts else {
        return Err(Error::Response("missing facet_counts".to_string()));
    };

    let mut out = FacetCounts::new();
    for (facet, flat) in counts.facet_fields {
        if flat.len() % 2 != 0 {
            return Err(Error::Response(format!(
                "facet_fields.{} has an odd number of entries",
                facet
            )));
        }
        let mut values = BTreeMap::new();
        for pair in flat.chunks(2) {
            let value = pair[0]
                .as_str()
                .ok_or_else(|| Error::Response(format!("non-string value in facet {}", facet)))?;
            let count = pair[1]
                .as_u64()
                .ok_or_else(|| Error::Response(format!("non-integer count in facet {}", facet)))?;
            values.insert(value.to_string(), count);
        }
        out.insert(facet, values);
    }
    Ok(out)
}
