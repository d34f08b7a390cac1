//! UDP listen mode: inspect every datagram as it arrives.
//!
//! Each datagram is one frame.  The loop ends when `shutdown` resolves or
//! after `count` frames have been reported.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tracing::{info, warn};

use crate::error::InspectError;
use crate::report::{Inspector, ReportSink, Summary};

/// Binds a UDP socket on `addr`.
///
/// # Errors
///
/// [`InspectError::Bind`] if the address is unavailable.
pub async fn bind(addr: SocketAddr) -> Result<UdpSocket, InspectError> {
    let socket = UdpSocket::bind(addr)
        .await
        .map_err(|source| InspectError::Bind { addr, source })?;
    match socket.local_addr() {
        Ok(local) => info!("listening for packets on UDP {local}"),
        Err(_) => info!("listening for packets on UDP {addr}"),
    }
    Ok(socket)
}

/// Receives datagrams on `socket` and emits one report per datagram.
///
/// Datagrams longer than the inspector's `max_frame_size` are reported as
/// failures.  Receive errors are logged and the loop continues.
///
/// # Errors
///
/// Returns the first sink error.
pub async fn listen<S, F>(
    socket: &UdpSocket,
    inspector: &Inspector<'_>,
    sink: &mut S,
    count: Option<usize>,
    shutdown: F,
) -> Result<Summary, InspectError>
where
    S: ReportSink + ?Sized,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    // One spare byte so an oversized datagram is detectable.
    let mut buf = vec![0u8; inspector.max_frame_size() + 1];
    let mut summary = Summary::default();

    loop {
        if count.is_some_and(|n| summary.total() >= n) {
            break;
        }

        tokio::select! {
            () = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            received = socket.recv_from(&mut buf) => {
                let (len, peer) = match received {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!("recv error: {e}");
                        continue;
                    }
                };
                let report = inspector.inspect(peer.to_string(), &buf[..len]);
                summary.record(&report.outcome);
                sink.emit(&report)?;
            }
        }
    }

    info!("{summary}");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use vwire_core::default_registry;

    use crate::config::InspectSettings;
    use crate::report::{FrameOutcome, MockReportSink};

    const PING_FRAME: [u8; 8] = [0x00, 0x07, 0x00, 0x00, 0x00, 0x00, 0x02, 0x03];

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().expect("loopback address")
    }

    #[tokio::test]
    async fn test_listen_reports_each_datagram_until_count() {
        // Arrange
        let socket = bind(loopback()).await.unwrap();
        let target = socket.local_addr().unwrap();
        let sender = UdpSocket::bind(loopback()).await.unwrap();
        sender.send_to(&PING_FRAME, target).await.unwrap();
        sender.send_to(&[0x00, 0x01], target).await.unwrap();

        let inspector = Inspector::new(default_registry(), &InspectSettings::default());
        let mut sink = MockReportSink::new();
        let mut seq = mockall::Sequence::new();
        sink.expect_emit()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|r| matches!(r.outcome, FrameOutcome::Decoded { sequence: 7, .. }))
            .returning(|_| Ok(()));
        sink.expect_emit()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|r| matches!(r.outcome, FrameOutcome::Failed { .. }))
            .returning(|_| Ok(()));

        // Act
        let summary = tokio::time::timeout(
            Duration::from_secs(5),
            listen(&socket, &inspector, &mut sink, Some(2), std::future::pending()),
        )
        .await
        .expect("listen should finish after two datagrams")
        .unwrap();

        // Assert
        assert_eq!(summary.decoded, 1);
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn test_listen_stops_on_shutdown() {
        let socket = bind(loopback()).await.unwrap();
        let inspector = Inspector::new(default_registry(), &InspectSettings::default());
        let mut sink = MockReportSink::new();
        sink.expect_emit().never();

        let summary = listen(&socket, &inspector, &mut sink, None, async {})
            .await
            .unwrap();

        assert_eq!(summary.total(), 0);
    }

    #[tokio::test]
    async fn test_oversized_datagram_is_reported_as_failure() {
        // Arrange
        let settings = InspectSettings {
            max_frame_size: 6,
            ..InspectSettings::default()
        };
        let inspector = Inspector::new(default_registry(), &settings);
        let socket = bind(loopback()).await.unwrap();
        let target = socket.local_addr().unwrap();
        let sender = UdpSocket::bind(loopback()).await.unwrap();
        sender.send_to(&PING_FRAME, target).await.unwrap();

        let mut sink = MockReportSink::new();
        sink.expect_emit()
            .times(1)
            .withf(|r| matches!(&r.outcome, FrameOutcome::Failed { error } if error.contains("max_frame_size")))
            .returning(|_| Ok(()));

        // Act
        let summary = tokio::time::timeout(
            Duration::from_secs(5),
            listen(&socket, &inspector, &mut sink, Some(1), std::future::pending()),
        )
        .await
        .expect("listen should finish after one datagram")
        .unwrap();

        // Assert
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn test_bind_reports_address_in_use() {
        let first = bind(loopback()).await.unwrap();
        let taken = first.local_addr().unwrap();

        let err = bind(taken).await.unwrap_err();

        assert!(matches!(err, InspectError::Bind { addr, .. } if addr == taken));
    }
}
