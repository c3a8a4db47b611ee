use std::io;
use std::net::{SocketAddr, UdpSocket};

use hs_core::{EventRecord, HsError};
use hs_hal::MessageBus;
use log::debug;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};

const MAX_DATAGRAM: usize = 512;

/// Software bus over UDP. Event messages arrive as encoded `EventRecord`s;
/// message actions go out verbatim to the configured target.
pub struct UdpBus {
    socket: UdpSocket,
    target: Option<SocketAddr>,
    buf: [u8; MAX_DATAGRAM],
}

impl UdpBus {
    pub fn new(bind_addr: &str, target_addr: Option<&str>) -> anyhow::Result<Self> {
        let addr: SocketAddr = bind_addr.parse()?;
        let domain = if addr.is_ipv4() { Domain::IPV4 } else { Domain::IPV6 };

        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        let _ = socket.set_recv_buffer_size(256 * 1024);
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;

        let sa: SockAddr = addr.into();
        socket.bind(&sa)?;

        let target = match target_addr {
            Some(t) => Some(t.parse()?),
            None => None,
        };

        Ok(Self { socket: socket.into(), target, buf: [0; MAX_DATAGRAM] })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl MessageBus for UdpBus {
    fn send(&mut self, message: &[u8]) -> nb::Result<usize, HsError> {
        // Nowhere to send: report it rather than drop the message.
        let dest = self.target.ok_or(nb::Error::Other(HsError::HalError))?;
        match self.socket.send_to(message, dest) {
            Ok(n) => Ok(n),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => Err(nb::Error::WouldBlock),
            Err(_) => Err(nb::Error::Other(HsError::HalError)),
        }
    }

    fn receive_event(&mut self) -> nb::Result<EventRecord, HsError> {
        match self.socket.recv_from(&mut self.buf) {
            Ok((n, src)) => EventRecord::from_bytes(&self.buf[..n]).map_err(|e| {
                debug!("Bad event datagram from {} ({} bytes)", src, n);
                nb::Error::Other(e)
            }),
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => Err(nb::Error::WouldBlock),
            Err(_) => Err(nb::Error::Other(HsError::HalError)),
        }
    }
}
