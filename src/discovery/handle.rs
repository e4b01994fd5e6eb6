use super::{SearchClient, SearchResult};
use crate::{message::build_search, registry::Registry, service::Service, socket::SsdpSender};
use std::{net::IpAddr, sync::Arc};

pub(super) struct DiscoveryHandleInner {
	pub(super) thread: std::thread::JoinHandle<Result<(), std::io::Error>>,
	pub(super) shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

pub(super) struct DiscoveryHandleDrop(pub(super) Option<DiscoveryHandleInner>);
impl DiscoveryHandleDrop {
	fn shutdown(&mut self) -> std::thread::Result<Result<(), std::io::Error>> {
		let DiscoveryHandleInner { thread, shutdown_tx } = match self.0.take() {
			Some(inner) => inner,
			None => unreachable!(),
		};

		shutdown_tx.send(()).ok();
		thread.join()
	}
}
impl Drop for DiscoveryHandleDrop {
	fn drop(&mut self) {
		if self.0.is_some() {
			self.shutdown().unwrap().unwrap();
		}
	}
}

/// Handle to a running discovery subsystem.
///
/// Dropping the handle shuts the background listener down; keep it alive for
/// as long as discovery should run.
pub struct DiscoveryHandle {
	pub(super) registry: Arc<Registry>,
	pub(super) sender: SsdpSender,
	pub(super) drop: DiscoveryHandleDrop,
}
impl DiscoveryHandle {
	/// Sends an M-SEARCH query for the given target and returns a snapshot
	/// of every service known so far, ordered by unique id.
	///
	/// The background listener is the actual discovery mechanism, so the
	/// snapshot is returned immediately rather than waiting `mx_secs` for
	/// replies; responses the query draws land in later snapshots. Send
	/// failures are logged and never surfaced; this path degrades to "no
	/// new discovery" rather than an error.
	pub fn search(&self, search_target: &str, mx_secs: u32) -> Vec<Arc<Service>> {
		if let Err(err) = self.sender.send_multicast(&build_search(search_target, mx_secs)) {
			log::warn!("Failed to send M-SEARCH: {err}");
		}

		self.registry.snapshot()
	}

	/// Snapshot of every service known so far, without sending a query.
	pub fn snapshot(&self) -> Vec<Arc<Service>> {
		self.registry.snapshot()
	}

	/// Combined search: runs the external one-shot `client` and merges its
	/// results with [`search`](Self::search)'s snapshot, tagged by source
	/// and not deduplicated across the two.
	///
	/// A client failure is propagated; this is the only error that crosses
	/// the discovery boundary.
	pub fn search_with<C: SearchClient>(
		&self,
		client: &C,
		search_target: &str,
		mx_secs: u32,
		local_addr: Option<IpAddr>,
	) -> Result<Vec<SearchResult<C::Device>>, C::Error> {
		let devices = client.search(search_target, mx_secs, local_addr)?;

		let mut results: Vec<SearchResult<C::Device>> = devices.into_iter().map(SearchResult::Client).collect();
		results.extend(self.search(search_target, mx_secs).into_iter().map(SearchResult::Registry));
		Ok(results)
	}

	/// Stops the background listener and waits for it to exit.
	pub fn shutdown(mut self) -> std::thread::Result<Result<(), std::io::Error>> {
		self.drop.shutdown()
	}
}
