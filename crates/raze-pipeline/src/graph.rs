//! Node and edge graph of an analysis, for visual exploration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use raze_analyze::{Cluster, SimilarityConfig};
use raze_core::{FileId, FileRecord};

use crate::analysis::Analysis;
use crate::summary::{category_key, dup_key};

/// Id of the root node.
pub const ROOT_ID: &str = "root";

/// File leaves included in the graph.
pub const MAX_FILE_NODES: usize = 200;

/// Member edges drawn per non-duplicate cluster.
pub const MAX_SAMPLE_EDGES: usize = 50;

/// Why a node exists, and how sure we are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reasoning {
    pub rationale: String,
    pub confidence: f64,
}

impl Reasoning {
    fn new(rationale: impl Into<String>, confidence: f64) -> Self {
        Self {
            rationale: rationale.into(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: String,
    pub label: String,
    pub meta: Value,
    pub reasoning: Reasoning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: String,
}

/// Nodes and edges, ready to serialize as `graph.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges leaving `source`.
    pub fn edges_from<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == source)
    }

    /// Add a cluster node under the root with edges to its members.
    ///
    /// `sample` limits member edges to [`MAX_SAMPLE_EDGES`].
    fn add_cluster(&mut self, node: Node, members: &[FileId], sample: bool) {
        let id = node.id.clone();
        self.nodes.push(node);
        self.link(ROOT_ID, &id, "contains");

        let (limit, kind) = if sample {
            (MAX_SAMPLE_EDGES, "contains_sample")
        } else {
            (members.len(), "contains")
        };
        for member in members.iter().take(limit) {
            self.link(&id, member.as_str(), kind);
        }
    }

    fn link(&mut self, source: &str, target: &str, kind: &str) {
        self.edges.push(Edge {
            id: format!("e-{source}-{target}"),
            source: source.to_string(),
            target: target.to_string(),
            kind: kind.to_string(),
        });
    }
}

/// Build the graph of an analysis.
///
/// The root links to every cluster, projection, and category node. Duplicate
/// groups link to all members; the rest link to a sample. The first
/// [`MAX_FILE_NODES`] records become file leaves.
pub fn build_graph(
    records: &[FileRecord],
    analysis: &Analysis,
    summaries: &IndexMap<String, String>,
    similarity: &SimilarityConfig,
) -> Graph {
    let mut graph = Graph::default();
    graph.nodes.push(Node {
        id: ROOT_ID.to_string(),
        kind: "root".to_string(),
        label: "Scan Root".to_string(),
        meta: json!({}),
        reasoning: Reasoning::new("Root of scan.", 1.0),
    });

    let summary = |key: &str| summaries.get(key).cloned().unwrap_or_default();

    for group in &analysis.detections.exact.groups {
        let hex = group.hash.to_hex();
        let id = dup_key(&hex);
        let node = Node {
            label: format!("Duplicates {}", &id[4..]),
            kind: "duplicate_cluster".to_string(),
            meta: json!({
                "hash": hex,
                "file_ids": group.file_ids,
                "wasted_bytes": group.wasted_bytes,
                "summary": summary(&id),
            }),
            reasoning: Reasoning::new(
                format!("{} files share identical content.", group.count()),
                1.0,
            ),
            id,
        };
        graph.add_cluster(node, &group.file_ids, false);
    }

    for (mime, ids) in &analysis.types {
        let id = format!("type:{mime}");
        let node = Node {
            label: format!("Type: {mime}"),
            kind: "type_cluster".to_string(),
            meta: json!({ "file_ids": ids, "summary": summary(&id) }),
            reasoning: Reasoning::new(format!("{} files of type {mime}.", ids.len()), 1.0),
            id,
        };
        graph.add_cluster(node, ids, true);
    }

    for (label, ids) in &analysis.ages {
        let id = format!("age:{label}");
        let node = Node {
            label: format!("Age: {label}"),
            kind: "age_bucket".to_string(),
            meta: json!({ "file_ids": ids, "summary": summary(&id) }),
            reasoning: Reasoning::new(format!("{} files aged {label}.", ids.len()), 1.0),
            id,
        };
        graph.add_cluster(node, ids, true);
    }

    add_similarity_clusters(
        &mut graph,
        &analysis.detections.text,
        "neardup",
        "near_duplicate_text",
        "Near-duplicates",
        format!("Text fingerprints within {} bits of the first file.", similarity.text_threshold),
        &summary,
    );
    add_similarity_clusters(
        &mut graph,
        &analysis.detections.image,
        "imgsim",
        "image_similarity",
        "Similar images",
        format!("Image hashes within {} bits of the first file.", similarity.image_threshold),
        &summary,
    );

    for category in &analysis.assignments {
        let id = category_key(category);
        let node = Node {
            label: format!("{} / {}", category.bucket, category.label),
            kind: "category".to_string(),
            meta: json!({
                "bucket": category.bucket,
                "file_ids": category.file_ids,
                "summary": summary(&id),
            }),
            reasoning: Reasoning::new(category.rationale.clone(), category.confidence),
            id,
        };
        graph.add_cluster(node, &category.file_ids, true);
    }

    for record in records.iter().take(MAX_FILE_NODES) {
        graph.nodes.push(Node {
            id: record.id.to_string(),
            kind: "file".to_string(),
            label: record.path.to_string_lossy().into_owned(),
            meta: json!({
                "size": record.size,
                "mtime": record.mtime,
                "type": record.mime_type,
                "hash": record.content_hash,
            }),
            reasoning: Reasoning::new("Raw file node", 1.0),
        });
    }

    graph
}

fn add_similarity_clusters(
    graph: &mut Graph,
    clusters: &[Cluster],
    prefix: &str,
    kind: &str,
    title: &str,
    rationale: String,
    summary: &dyn Fn(&str) -> String,
) {
    for (i, cluster) in clusters.iter().enumerate() {
        let id = format!("{prefix}:{i}");
        let node = Node {
            label: format!("{title} #{i}"),
            kind: kind.to_string(),
            meta: json!({ "file_ids": cluster.file_ids, "summary": summary(&id) }),
            reasoning: Reasoning::new(rationale.clone(), 0.7),
            id,
        };
        graph.add_cluster(node, &cluster.file_ids, true);
    }
}
