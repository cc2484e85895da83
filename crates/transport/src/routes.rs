//! Routing table of live connections.
//!
//! Keyed by resolved socket address so two spellings of the same server map
//! to one connection.

use std::future::poll_fn;
use std::net::SocketAddr;
use std::task::{Context, Poll};

use corelib::RemoteAddress;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::io::ReadBuf;
use tokio::net::TcpStream;

/// One established connection and the remote it was requested as.
#[derive(Debug)]
pub struct Route {
    pub remote: RemoteAddress,
    stream: TcpStream,
}

impl Route {
    /// Whether the peer still holds the connection open.
    ///
    /// A readable EOF or a socket error means the route is gone. Pending data
    /// is peeked, never consumed.
    fn is_alive(&self, cx: &mut Context<'_>) -> bool {
        if let Ok(Some(_)) | Err(_) = self.stream.take_error() {
            return false;
        }
        let mut byte = [0u8; 1];
        let mut buf = ReadBuf::new(&mut byte);
        match self.stream.poll_peek(cx, &mut buf) {
            Poll::Ready(Ok(0)) | Poll::Ready(Err(_)) => false,
            Poll::Ready(Ok(_)) | Poll::Pending => true,
        }
    }
}

#[derive(Debug, Default)]
pub struct RoutingTable {
    routes: DashMap<SocketAddr, Route>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, addr: &SocketAddr) -> bool {
        self.routes.contains_key(addr)
    }

    /// Adds a route. Returns `false` if `addr` was already routed; the new
    /// stream is dropped in that case.
    pub fn insert(&self, addr: SocketAddr, remote: RemoteAddress, stream: TcpStream) -> bool {
        match self.routes.entry(addr) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Route { remote, stream });
                true
            }
        }
    }

    pub fn remove(&self, addr: &SocketAddr) -> Option<RemoteAddress> {
        self.routes.remove(addr).map(|(_, route)| route.remote)
    }

    /// Removes every route whose connection is gone and returns the remotes
    /// they were registered as.
    ///
    /// Each connection is polled once; the table is not held across an await.
    pub async fn remove_dead(&self) -> Vec<RemoteAddress> {
        let dead: Vec<SocketAddr> = poll_fn(|cx| {
            Poll::Ready(
                self.routes
                    .iter()
                    .filter(|route| !route.is_alive(cx))
                    .map(|route| *route.key())
                    .collect::<Vec<_>>(),
            )
        })
        .await;

        dead.iter().filter_map(|addr| self.remove(addr)).collect()
    }

    pub fn addrs(&self) -> Vec<SocketAddr> {
        self.routes.iter().map(|route| *route.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn clear(&self) {
        self.routes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::AddressFamily;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn remote(port: u16) -> RemoteAddress {
        RemoteAddress::new("127.0.0.1", port, AddressFamily::Ipv4)
    }

    #[tokio::test]
    async fn test_insert_is_exclusive() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let table = RoutingTable::new();

        let first = TcpStream::connect(addr).await.unwrap();
        let second = TcpStream::connect(addr).await.unwrap();

        assert!(table.insert(addr, remote(addr.port()), first));
        assert!(!table.insert(addr, remote(addr.port()), second));
        assert_eq!(table.len(), 1);
        assert_eq!(table.remove(&addr), Some(remote(addr.port())));
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_remove_dead_drops_closed_peers() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let table = RoutingTable::new();

        let stream = TcpStream::connect(addr).await.unwrap();
        let (accepted, _) = listener.accept().await.unwrap();
        table.insert(addr, remote(addr.port()), stream);

        assert!(table.remove_dead().await.is_empty(), "open connection is alive");

        drop(accepted);
        let mut removed = Vec::new();
        for _ in 0..50 {
            removed = table.remove_dead().await;
            if !removed.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert_eq!(removed, vec![remote(addr.port())]);
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_liveness_check_leaves_pending_data_unread() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let stream = TcpStream::connect(addr).await.unwrap();
        let (mut accepted, _) = listener.accept().await.unwrap();
        accepted.write_all(b"hello").await.unwrap();
        stream.readable().await.unwrap();

        let mut route = Route {
            remote: remote(addr.port()),
            stream,
        };
        for _ in 0..3 {
            assert!(poll_fn(|cx| Poll::Ready(route.is_alive(cx))).await);
        }

        let mut received = [0u8; 5];
        route.stream.read_exact(&mut received).await.unwrap();
        assert_eq!(&received, b"hello");
    }

    #[tokio::test]
    async fn test_remove_dead_keeps_peers_with_pending_data() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let table = RoutingTable::new();

        let stream = TcpStream::connect(addr).await.unwrap();
        let (mut accepted, _) = listener.accept().await.unwrap();
        accepted.write_all(b"x").await.unwrap();
        stream.readable().await.unwrap();
        table.insert(addr, remote(addr.port()), stream);

        assert!(table.remove_dead().await.is_empty());
        assert!(table.remove_dead().await.is_empty());
        assert!(table.contains(&addr));
    }
}
