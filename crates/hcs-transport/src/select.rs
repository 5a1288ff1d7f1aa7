use std::sync::Arc;

use hcs_ledger::ConsensusQueryClient;
use tracing::info;

use crate::error::{TransportError, TransportResult};
use crate::rest::{RestConfig, RestTransport};
use crate::streaming::StreamingTransport;
use crate::traits::ReadTransport;

/// Pick the read transport for a client.
///
/// `direct_queries` says whether this runtime can hold streaming connections
/// to consensus nodes. When it can, `consensus` must be supplied.
pub fn select_transport(
    direct_queries: bool,
    consensus: Option<Arc<dyn ConsensusQueryClient>>,
    rest: &RestConfig,
) -> TransportResult<Arc<dyn ReadTransport>> {
    let transport: Arc<dyn ReadTransport> = if direct_queries {
        let client = consensus.ok_or_else(|| {
            TransportError::Unavailable("direct queries enabled without a consensus client".into())
        })?;
        Arc::new(StreamingTransport::new(client))
    } else {
        Arc::new(RestTransport::new(rest)?)
    };
    info!(transport = %transport.kind(), "read transport selected");
    Ok(transport)
}
