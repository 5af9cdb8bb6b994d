use thiserror::Error;

use super::types::NodeId;

/// Failure reported by a child loader.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
	/// The request itself failed.
	#[error("request failed: {0}")]
	Request(String),
	/// A response arrived but could not be turned into records.
	#[error("malformed response: {0}")]
	Malformed(String),
}

#[derive(Debug, Error)]
pub enum ChartError {
	/// Children of `id` must be fetched but no loader is configured.
	#[error("no child loader configured (needed by node {id})")]
	MissingLoader { id: NodeId },
	#[error("loading children of node {id} failed")]
	Fetch {
		id: NodeId,
		#[source]
		source: LoadError,
	},
	#[error("no node with id {0}")]
	UnknownNode(NodeId),
	#[error("duplicate node id {0}")]
	DuplicateId(NodeId),
	#[error("invalid chart data: {0}")]
	Data(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
	use std::error::Error as _;

	use super::*;

	#[test]
	fn messages_name_the_node() {
		let missing = ChartError::MissingLoader { id: "n".into() };
		assert_eq!(missing.to_string(), "no child loader configured (needed by node n)");

		let fetch = ChartError::Fetch {
			id: "n".into(),
			source: LoadError::Request("503".into()),
		};
		assert_eq!(fetch.to_string(), "loading children of node n failed");
		assert_eq!(fetch.source().map(|e| e.to_string()).as_deref(), Some("request failed: 503"));
	}
}
