use crate::{
	message::{build_search, parse_service},
	registry::Registry,
	service::Service,
	socket::{AsyncSsdpSocket, SsdpSocket},
};
use std::{
	net::{IpAddr, SocketAddr},
	sync::Arc,
	time::Duration,
};

mod builder;
pub use builder::DiscoveryBuilder;

mod handle;
pub use handle::DiscoveryHandle;
use handle::*;

/// Receive buffer size; comfortably larger than any real-world SSDP
/// message, anything bigger is truncated by the recv call.
const RECV_BUFFER_SIZE: usize = 4096;

/// An external one-shot discovery client, merged into combined searches.
///
/// Implementations perform their own independent search and return whatever
/// device representation they use; [`DiscoveryHandle::search_with`] tags
/// their results apart from the registry's without deduplicating across the
/// two sources.
pub trait SearchClient {
	type Device;
	type Error: std::error::Error;

	fn search(&self, search_target: &str, mx_secs: u32, local_addr: Option<IpAddr>) -> Result<Vec<Self::Device>, Self::Error>;
}

#[derive(Debug, Clone)]
/// One entry of a combined search, tagged by the source it came from.
pub enum SearchResult<T> {
	/// Returned by the external one-shot client.
	Client(T),

	/// Taken from the continuously populated registry.
	Registry(Arc<Service>),
}

/// A bound-and-joined SSDP discovery subsystem, ready to run.
///
/// Produced by [`DiscoveryBuilder::build`], which is where the fatal
/// bind/join failures surface; from here on every failure is absorbed and
/// logged.
pub struct Discovery {
	socket: SsdpSocket,
	search_target: String,
	mx: u32,
	interval: Option<Duration>,
}
impl Discovery {
	/// Spawns the background listener and returns a handle for querying it.
	///
	/// The listener reads datagrams from the multicast group for as long as
	/// the handle is alive, merging every parseable advertisement into the
	/// registry the handle snapshots.
	pub fn run_in_background(self) -> DiscoveryHandle {
		let registry = Arc::new(Registry::new());
		let sender = self.socket.sender();

		let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

		let registry_ref = registry.clone();
		let thread = std::thread::spawn(move || {
			tokio::runtime::Builder::new_current_thread()
				.thread_name("Floodlight SSDP Discovery (Tokio)")
				.enable_all()
				.build()
				.unwrap()
				.block_on(self.impl_run(registry_ref, shutdown_rx))
		});

		DiscoveryHandle {
			registry,
			sender,
			drop: DiscoveryHandleDrop(Some(DiscoveryHandleInner { thread, shutdown_tx })),
		}
	}
}
impl Discovery {
	async fn impl_run(self, registry: Arc<Registry>, shutdown_rx: tokio::sync::oneshot::Receiver<()>) -> Result<(), std::io::Error> {
		let Discovery {
			socket,
			search_target,
			mx,
			interval,
		} = self;

		let socket = socket.into_async().await?;

		tokio::select! {
			biased;
			res = Self::listen_loop(&socket, &registry, &search_target, mx, interval) => res,
			_ = shutdown_rx => Ok(()),
		}
	}

	async fn listen_loop(
		socket: &AsyncSsdpSocket,
		registry: &Registry,
		search_target: &str,
		mx: u32,
		interval: Option<Duration>,
	) -> Result<(), std::io::Error> {
		// Advertisement listening
		let mut socket_recv = socket.recv(vec![0; RECV_BUFFER_SIZE]);

		// Periodic re-query, when configured
		let query = build_search(search_target, mx);
		let mut query_interval = interval.map(|interval| {
			let mut interval = tokio::time::interval(interval);
			interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
			interval
		});

		loop {
			tokio::select! {
				biased; // Prefer handling packets
				recv = socket_recv.recv_multicast() => match recv {
					Ok(((count, addr), packet)) => Self::recv_multicast(registry, addr, &packet[..count]),

					// The listener never terminates on its own; a persistent
					// socket failure shows up as a stream of logged errors.
					Err(err) => log::warn!("SSDP receive error: {err}"),
				},

				_ = tick(&mut query_interval) => {
					if let Err(err) = socket.send_multicast(&query).await {
						log::warn!("Failed to send periodic M-SEARCH: {err}");
					}
				}
			}
		}
	}

	pub(crate) fn recv_multicast(registry: &Registry, addr: SocketAddr, packet: &[u8]) {
		match parse_service(addr, packet) {
			// Peers' bare M-SEARCH queries parse too (their ST becomes the
			// service type) but carry no USN; only identified services
			// belong in the registry.
			Ok(service) if !service.service_type.is_empty() && !service.unique_id.is_empty() => registry.upsert(service),
			Ok(_) => {}
			Err(err) => log::debug!("Invalid SSDP datagram from {addr}: {err}"),
		}
	}
}

async fn tick(interval: &mut Option<tokio::time::Interval>) {
	match interval {
		Some(interval) => {
			interval.tick().await;
		}
		None => std::future::pending().await,
	}
}
