use crate::{net::TargetInterfaceV4, SSDP_PORT, SSDP_V4_IP};
use std::{
	collections::BTreeSet,
	net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket},
	sync::Arc,
};
use tokio::net::UdpSocket as AsyncUdpSocket;

/// The shared SSDP socket: bound once on the well-known port, joined to the
/// multicast group, and used for both sending queries and receiving
/// advertisements.
pub(crate) struct SsdpSocket {
	socket: UdpSocket,
	sender: SsdpSender,
}
impl SsdpSocket {
	pub fn new(loopback: bool, interface: &TargetInterfaceV4) -> Result<Self, std::io::Error> {
		let socket = socket2::Socket::new(socket2::Domain::IPV4, socket2::Type::DGRAM, Some(socket2::Protocol::UDP))?;
		socket.set_reuse_address(true)?;
		socket.set_multicast_loop_v4(loopback)?;

		#[cfg(unix)]
		{
			socket.set_reuse_port(true)?;
		}

		match interface {
			TargetInterfaceV4::Default => {
				socket.join_multicast_v4(&SSDP_V4_IP, &Ipv4Addr::UNSPECIFIED)?;
			}

			TargetInterfaceV4::Specific(iface) => {
				socket.join_multicast_v4(&SSDP_V4_IP, iface)?;
			}

			TargetInterfaceV4::Multi(ifaces) => {
				let mut did_join = false;
				for iface in ifaces.iter() {
					match socket.join_multicast_v4(&SSDP_V4_IP, iface) {
						Ok(_) => did_join = true,
						Err(err) => log::warn!("Failed to join SSDP multicast group on {iface}: {err}"),
					}
				}
				if !did_join {
					// Fallback to default
					socket.join_multicast_v4(&SSDP_V4_IP, &Ipv4Addr::UNSPECIFIED)?;
				}
			}

			TargetInterfaceV4::All => {
				// Interface enumeration failure is fatal; a single interface
				// refusing to join the group is not.
				let mut did_join = false;
				for iface in if_addrs::get_if_addrs()?
					.into_iter()
					.filter(|iface| !iface.is_loopback())
					.filter_map(|iface| if let IpAddr::V4(addr) = iface.addr.ip() { Some(addr) } else { None })
					.collect::<BTreeSet<Ipv4Addr>>()
				{
					match socket.join_multicast_v4(&SSDP_V4_IP, &iface) {
						Ok(_) => did_join = true,
						Err(err) => log::warn!("Failed to join SSDP multicast group on {iface}: {err}"),
					}
				}
				if !did_join {
					// Fallback to default
					socket.join_multicast_v4(&SSDP_V4_IP, &Ipv4Addr::UNSPECIFIED)?;
				}
			}
		}

		socket.bind(&socket2::SockAddr::from(SocketAddr::new(
			IpAddr::V4(if let TargetInterfaceV4::Specific(addr) = interface {
				*addr
			} else {
				Ipv4Addr::UNSPECIFIED
			}),
			SSDP_PORT,
		)))?;

		socket.set_nonblocking(true)?;

		// A second handle onto the same socket for synchronous query sends
		// from caller threads, interleaving with the listener's receives.
		let sender = SsdpSender(Arc::new(socket.try_clone()?.into()));

		Ok(Self { socket: socket.into(), sender })
	}

	pub fn sender(&self) -> SsdpSender {
		self.sender.clone()
	}

	pub async fn into_async(self) -> Result<AsyncSsdpSocket, std::io::Error> {
		Ok(AsyncSsdpSocket(AsyncUdpSocket::from_std(self.socket)?))
	}
}

/// Cloneable handle for sending datagrams to the multicast group from any
/// thread, without going through the listener task.
#[derive(Clone)]
pub(crate) struct SsdpSender(Arc<UdpSocket>);
impl SsdpSender {
	pub fn send_multicast(&self, packet: &[u8]) -> Result<(), std::io::Error> {
		self.0.send_to(packet, SocketAddrV4::new(SSDP_V4_IP, SSDP_PORT)).map(|_| ())
	}
}

pub(crate) struct AsyncSsdpSocket(AsyncUdpSocket);
impl AsyncSsdpSocket {
	pub async fn send_multicast(&self, packet: &[u8]) -> Result<(), std::io::Error> {
		self.0.send_to(packet, SocketAddrV4::new(SSDP_V4_IP, SSDP_PORT)).await.map(|_| ())
	}

	pub fn recv(&self, buffer: Vec<u8>) -> SsdpSocketRecv {
		SsdpSocketRecv { socket: &self.0, buffer }
	}
}

pub(crate) struct SsdpSocketRecv<'a> {
	socket: &'a AsyncUdpSocket,
	buffer: Vec<u8>,
}
impl SsdpSocketRecv<'_> {
	pub async fn recv_multicast(&mut self) -> Result<((usize, SocketAddr), &[u8]), std::io::Error> {
		let recv = self.socket.recv_from(&mut self.buffer).await?;
		Ok((recv, &self.buffer))
	}
}
