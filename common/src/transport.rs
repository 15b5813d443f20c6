use crate::{Canvas, Error, Result, check_layer, wire};
use monoio::net::udp::UdpSocket;
use std::{
    env, io, mem,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs},
};

/// Port the display listens on.
pub const DEFAULT_PORT: u16 = 1337;
/// Display used when neither an explicit host nor [`DISPLAY_ENV`] is given.
pub const DEFAULT_HOST: &str = "ft.noise";
/// Environment variable holding the default display host.
pub const DISPLAY_ENV: &str = "FT_DISPLAY";

/// Picks the display target: explicit argument, then environment, then
/// [`DEFAULT_HOST`]. Empty values count as unset.
pub fn select_target(explicit: Option<&str>, env_value: Option<String>) -> String {
    explicit
        .filter(|host| !host.is_empty())
        .map(str::to_owned)
        .or(env_value.filter(|host| !host.is_empty()))
        .unwrap_or_else(|| DEFAULT_HOST.to_owned())
}

/// Resolves `host`, `host:port`, `ip`, `ip:port` or `[ipv6]:port`.
pub fn resolve(target: &str) -> Result<SocketAddr> {
    if let Ok(addr) = target.parse::<SocketAddr>() {
        return Ok(addr);
    }

    let (host, port) = match target.rsplit_once(':') {
        // a bare IPv6 address contains colons but no port
        Some((host, port)) if !host.contains(':') => {
            let port = port.parse().map_err(|_| {
                Error::connection(
                    target,
                    io::Error::new(io::ErrorKind::InvalidInput, "invalid port"),
                )
            })?;
            (host, port)
        }
        _ => (target, DEFAULT_PORT),
    };

    (host, port)
        .to_socket_addrs()
        .map_err(|err| Error::connection(target, err))?
        .next()
        .ok_or_else(|| {
            Error::connection(
                target,
                io::Error::new(io::ErrorKind::NotFound, "no addresses found"),
            )
        })
}

/// Fire-and-forget UDP client for one display.
pub struct Transport {
    socket: UdpSocket,
    peer: SocketAddr,
    buf: Vec<u8>,
}

impl Transport {
    /// Opens a socket to `destination`, falling back to [`DISPLAY_ENV`] and
    /// then [`DEFAULT_HOST`].
    pub async fn open(destination: Option<&str>) -> Result<Self> {
        let target = select_target(destination, env::var(DISPLAY_ENV).ok());
        let addr = resolve(&target)?;
        debug!(%target, %addr, "resolved display");

        Self::connect(addr)
            .await
            .map_err(|err| match err {
                Error::Io(source) => Error::connection(target, source),
                other => other,
            })
    }

    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let local: SocketAddr = if addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local)?;
        socket.connect(addr).await?;

        Ok(Self {
            socket,
            peer: addr,
            buf: Vec::new(),
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Sends the canvas as one datagram.
    ///
    /// Only an out-of-range layer is reported as an error. Send failures are
    /// logged and dropped; the next frame replaces this one anyway.
    pub async fn send(&mut self, canvas: &Canvas) -> Result<()> {
        check_layer(canvas.offset().layer)?;

        let mut buf = mem::take(&mut self.buf);
        wire::encode(canvas, &mut buf);
        let len = buf.len();

        let (result, buf) = self.socket.send(buf).await;
        self.buf = buf;

        match result {
            Ok(sent) if sent < len => warn!(sent, len, "frame truncated"),
            Ok(_) => trace!(len, "frame sent"),
            Err(error) => warn!(?error, peer = %self.peer, "dropped frame"),
        }

        Ok(())
    }
}
