use super::Discovery;
use crate::{net::TargetInterfaceV4, socket::SsdpSocket, SSDP_ALL};
use std::time::Duration;

/// Configures and starts the discovery subsystem.
pub struct DiscoveryBuilder {
	loopback: bool,
	interface: TargetInterfaceV4,
	search_target: String,
	mx: u32,
	interval: Option<Duration>,
}
impl DiscoveryBuilder {
	pub fn new() -> Self {
		Self {
			loopback: false,
			interface: TargetInterfaceV4::All,
			search_target: SSDP_ALL.to_string(),
			mx: 3,
			interval: None,
		}
	}

	/// Also receive datagrams sent from this host, including our own queries.
	pub fn loopback(mut self) -> Self {
		self.loopback = true;
		self
	}

	pub fn interface(mut self, interface: TargetInterfaceV4) -> Self {
		self.interface = interface;
		self
	}

	/// The search target of the periodic background M-SEARCH queries.
	///
	/// Defaults to [`SSDP_ALL`]. Only used when an [`interval`](Self::interval) is set.
	pub fn search_target(mut self, search_target: impl Into<String>) -> Self {
		self.search_target = search_target.into();
		self
	}

	/// The MX (responder wait seconds) hint embedded in periodic queries.
	pub fn mx(mut self, mx_secs: u32) -> Self {
		self.mx = mx_secs;
		self
	}

	/// Sends a background M-SEARCH to the multicast group at this interval.
	///
	/// Without an interval the listener is purely passive, relying on
	/// unsolicited advertisements and replies to on-demand searches.
	pub fn interval(mut self, interval: Duration) -> Self {
		self.interval = Some(interval);
		self
	}

	/// Binds the shared socket and joins the multicast group.
	///
	/// This is the only place the fatal startup failures (socket bind,
	/// interface enumeration) surface; there is no retry. Per-interface join
	/// failures are skipped with a logged warning.
	pub fn build(self) -> Result<Discovery, std::io::Error> {
		let DiscoveryBuilder {
			loopback,
			interface,
			search_target,
			mx,
			interval,
		} = self;

		Ok(Discovery {
			socket: SsdpSocket::new(loopback, &interface)?,
			search_target,
			mx,
			interval,
		})
	}
}
impl Default for DiscoveryBuilder {
	fn default() -> Self {
		Self::new()
	}
}
